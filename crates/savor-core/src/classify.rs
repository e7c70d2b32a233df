//! Header classification
//!
//! Finds the real header row in sheets that open with titles or metadata,
//! then assigns each column a canonical semantic role using an ordered,
//! pattern-based rule set with a gross-sales exclusion guard.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::cell::{normalize_header, normalize_text_cell, Cell};
use crate::error::Result;
use crate::models::{CanonicalKey, ColumnMeta};

/// Rows from the top of the sheet searched for the header row
pub const HEADER_SEARCH_WINDOW: usize = 25;

/// Keywords counted when scoring candidate header rows
const HEADER_KEYWORDS: [&str; 11] = [
    "sales", "net", "guest", "cover", "tip", "labor", "category", "item", "date", "revenue",
    "hours",
];

/// One column-role rule: a canonical key and the header patterns that bind it
struct RoleRule {
    key: CanonicalKey,
    patterns: &'static [&'static str],
    /// Whether the rule may claim a gross-sales column
    allow_gross: bool,
}

/// Ordered role rules, evaluated top-down with first-match-wins per rule.
///
/// Priority is fixed and matters: net_sales is evaluated first, so a header
/// plausibly matching both "net sales" and a later rule is locked to
/// net_sales. Each role binds at most one column per file.
const ROLE_RULES: [RoleRule; 9] = [
    RoleRule {
        key: CanonicalKey::NetSales,
        patterns: &[
            r"net\s*sales?",
            r"^net$",
            r"net\s*amount",
            r"net\s*revenue",
        ],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::Tips,
        patterns: &[r"^tips?$", r"tip\s*amount", r"gratuit", r"total\s*tips?", r"tips?\s*total"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::Guests,
        patterns: &[r"guests?", r"covers?", r"customers?", r"^pax$"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::LaborCost,
        patterns: &[r"labou?r\s*cost", r"labou?r\s*\$", r"wages", r"payroll"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::LaborHours,
        patterns: &[r"labou?r\s*hours?", r"hours?\s*worked", r"^hours?$", r"sched(uled)?\s*hours?"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::LaborPercent,
        patterns: &[r"labou?r\s*%", r"labou?r\s*percent", r"labou?r\s*pct"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::Date,
        patterns: &[r"^date$", r"business\s*date", r"order\s*date", r"^day$", r"week\s*of"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::Category,
        patterns: &[r"category", r"^dept$", r"department", r"sales\s*type", r"^group$"],
        allow_gross: false,
    },
    RoleRule {
        key: CanonicalKey::Item,
        patterns: &[r"^items?$", r"item\s*name", r"menu\s*item", r"product", r"^description$"],
        allow_gross: false,
    },
];

/// Headers the net-sales fallback must never claim
const NET_FALLBACK_EXCLUDE: &str = r"tax|discount|void|refund|credit";

/// Locate the header row within the search window.
///
/// Every cell in each candidate row is normalized, then the row is scored
/// by how many of the fixed keywords appear as a substring of any cell.
/// Highest count wins; ties resolve to the lowest row index. Returns None
/// when no candidate row contains a single keyword, which callers treat
/// as a structural parse failure.
pub fn detect_header_row(rows: &[Vec<Cell>]) -> Option<usize> {
    let window = rows.len().min(HEADER_SEARCH_WINDOW);
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in rows.iter().take(window).enumerate() {
        let score = header_score(row);
        if score > 0 && best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, idx));
        }
    }

    best.map(|(_, idx)| idx)
}

/// Count how many header keywords appear somewhere in the row
fn header_score(row: &[Cell]) -> usize {
    let normalized: Vec<String> = row
        .iter()
        .filter_map(normalize_text_cell)
        .map(|text| normalize_header(&text))
        .collect();

    HEADER_KEYWORDS
        .iter()
        .filter(|keyword| normalized.iter().any(|cell| cell.contains(*keyword)))
        .count()
}

/// Classify the columns of a header row.
///
/// Applies the ordered role rules, scanning columns left-to-right per
/// rule and assigning the role to the first still-unassigned matching
/// column. Gross-sales columns are skipped unless a rule explicitly
/// allows them. A fallback pass then binds net_sales to an unassigned,
/// non-gross column containing "sales" (excluding tax/discount/void/
/// refund/credit headers), because sheets frequently label the net-sales
/// column just "Sales".
pub fn classify_columns(header_row: &[Cell]) -> Result<Vec<ColumnMeta>> {
    let mut columns: Vec<ColumnMeta> = header_row
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let header = normalize_text_cell(cell).unwrap_or_default();
            let normalized = normalize_header(&header);
            let is_gross = normalized.contains("gross");
            ColumnMeta {
                header,
                normalized,
                index,
                is_gross,
                role: None,
            }
        })
        .collect();

    for rule in &ROLE_RULES {
        let regexes: Vec<Regex> = rule
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<_, _>>()?;

        for col in columns.iter_mut() {
            if col.role.is_some() || col.normalized.is_empty() {
                continue;
            }
            if col.is_gross && !rule.allow_gross {
                continue;
            }
            if regexes.iter().any(|re| re.is_match(&col.normalized)) {
                debug!("Column {} ({:?}) -> {}", col.index, col.header, rule.key);
                col.role = Some(rule.key);
                break;
            }
        }
    }

    apply_net_sales_fallback(&mut columns)?;

    Ok(columns)
}

/// Bind an ambiguous "Sales" column to net_sales when nothing better matched
fn apply_net_sales_fallback(columns: &mut [ColumnMeta]) -> Result<()> {
    if columns
        .iter()
        .any(|c| c.role == Some(CanonicalKey::NetSales))
    {
        return Ok(());
    }

    let excluded = Regex::new(NET_FALLBACK_EXCLUDE)?;
    for col in columns.iter_mut() {
        if col.role.is_none()
            && !col.is_gross
            && col.normalized.contains("sales")
            && !excluded.is_match(&col.normalized)
        {
            debug!("Fallback: column {} ({:?}) -> net_sales", col.index, col.header);
            col.role = Some(CanonicalKey::NetSales);
            break;
        }
    }

    Ok(())
}

/// The set of canonical keys bound to some column
pub fn present_keys(columns: &[ColumnMeta]) -> HashSet<CanonicalKey> {
    columns.iter().filter_map(|c| c.role).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::Text(s.to_string())).collect()
    }

    fn role_of(columns: &[ColumnMeta], key: CanonicalKey) -> Option<usize> {
        columns.iter().find(|c| c.role == Some(key)).map(|c| c.index)
    }

    #[test]
    fn test_detect_header_row_skips_title_rows() {
        let rows = vec![
            text_row(&["Joe's Diner - Weekly Report"]),
            text_row(&[""]),
            text_row(&["Date", "Category", "Net Sales", "Guests"]),
            text_row(&["2024-11-01", "Food", "500", "20"]),
        ];
        assert_eq!(detect_header_row(&rows), Some(2));
    }

    #[test]
    fn test_detect_header_row_tie_takes_first() {
        // Both rows score 2 ("date", "sales"); the earlier row wins
        let rows = vec![
            text_row(&["Date", "Sales"]),
            text_row(&["date", "sales"]),
        ];
        assert_eq!(detect_header_row(&rows), Some(0));
    }

    #[test]
    fn test_detect_header_row_none_without_keywords() {
        let rows = vec![text_row(&["foo", "bar"]), text_row(&["1", "2"])];
        assert_eq!(detect_header_row(&rows), None);
    }

    #[test]
    fn test_classify_basic_sales_sheet() {
        let columns =
            classify_columns(&text_row(&["Date", "Category", "Net Sales", "Guests"])).unwrap();

        assert_eq!(role_of(&columns, CanonicalKey::Date), Some(0));
        assert_eq!(role_of(&columns, CanonicalKey::Category), Some(1));
        assert_eq!(role_of(&columns, CanonicalKey::NetSales), Some(2));
        assert_eq!(role_of(&columns, CanonicalKey::Guests), Some(3));
    }

    #[test]
    fn test_gross_sales_never_binds_net() {
        // Both headers contain "sales"; net_sales must bind the net column
        let columns = classify_columns(&text_row(&["Gross Sales", "Net Sales"])).unwrap();

        assert_eq!(role_of(&columns, CanonicalKey::NetSales), Some(1));
        assert!(columns[0].is_gross);
        assert_eq!(columns[0].role, None);
    }

    #[test]
    fn test_gross_excluded_from_fallback() {
        let columns = classify_columns(&text_row(&["Gross Sales", "Guests"])).unwrap();
        assert_eq!(role_of(&columns, CanonicalKey::NetSales), None);
    }

    #[test]
    fn test_fallback_binds_plain_sales() {
        let columns = classify_columns(&text_row(&["Date", "Sales"])).unwrap();
        assert_eq!(role_of(&columns, CanonicalKey::NetSales), Some(1));
    }

    #[test]
    fn test_fallback_skips_tax_and_discount_columns() {
        let columns =
            classify_columns(&text_row(&["Sales Tax", "Discounted Sales", "Guests"])).unwrap();
        assert_eq!(role_of(&columns, CanonicalKey::NetSales), None);
    }

    #[test]
    fn test_role_binds_at_most_one_column() {
        let columns = classify_columns(&text_row(&["Net Sales", "Net Sales"])).unwrap();
        assert_eq!(role_of(&columns, CanonicalKey::NetSales), Some(0));
        assert_eq!(columns[1].role, None);
    }

    #[test]
    fn test_labor_columns() {
        let columns =
            classify_columns(&text_row(&["Labor Hours", "Labor Cost", "Labor %"])).unwrap();

        assert_eq!(role_of(&columns, CanonicalKey::LaborHours), Some(0));
        assert_eq!(role_of(&columns, CanonicalKey::LaborCost), Some(1));
        assert_eq!(role_of(&columns, CanonicalKey::LaborPercent), Some(2));
    }

    #[test]
    fn test_present_keys() {
        let columns = classify_columns(&text_row(&["Date", "Net Sales"])).unwrap();
        let keys = present_keys(&columns);
        assert!(keys.contains(&CanonicalKey::Date));
        assert!(keys.contains(&CanonicalKey::NetSales));
        assert_eq!(keys.len(), 2);
    }
}
