//! Cell-level normalization primitives
//!
//! Converts raw spreadsheet cell values (strings, numbers, native dates,
//! parenthesized negatives, currency/percent symbols) into clean numeric,
//! textual, or calendar-date primitives. `parse_numeric` is the single
//! source of numeric truth for every metric downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw cell value as produced by the row extraction layer.
///
/// CSV and spreadsheet inputs normalize to this shape before any
/// classification or aggregation sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    /// True when the cell carries no usable value (empty, blank text, NaN)
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => !n.is_finite(),
            Cell::Date(_) => false,
        }
    }
}

/// Normalize a header cell: lowercase, collapse whitespace and underscore
/// runs to single spaces, trim. Deterministic, no error cases.
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a cell as a numeric value.
///
/// Native numbers pass through (non-finite values reject to None). Text is
/// stripped of currency symbols, thousands separators, percent signs, and
/// whitespace; `(123.45)` parses as a negative. Returns None on empty
/// input or parse failure - never a placeholder zero.
pub fn parse_numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) => None,
        Cell::Text(s) => parse_numeric_text(s),
        Cell::Date(_) | Cell::Empty => None,
    }
}

fn parse_numeric_text(s: &str) -> Option<f64> {
    let cleaned: String = s.replace(['$', ',', '%', ' '], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let (body, negative) = match cleaned.strip_prefix('(').and_then(|c| c.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (cleaned, false),
    };

    let value: f64 = body.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Normalize a date cell to an ISO `YYYY-MM-DD` grouping key.
///
/// Native date values are truncated to the calendar date (no time-of-day,
/// no timezone conversion). Strings are tried against common date formats;
/// on parse failure the trimmed text passes through verbatim so that
/// consistent non-ISO spellings still group correctly.
pub fn normalize_date_cell(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match parse_date(trimmed) {
                Some(date) => Some(date.format("%Y-%m-%d").to_string()),
                None => Some(trimmed.to_string()),
            }
        }
        Cell::Number(_) | Cell::Empty => None,
    }
}

/// Normalize a cell to display text (trimmed string, rendered number, or
/// ISO date). Returns None for empty cells.
pub fn normalize_text_cell(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Cell::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
        Cell::Number(_) => None,
        Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        Cell::Empty => None,
    }
}

/// Parse a date string in the common formats restaurant exports use
fn parse_date(s: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y-%m-%d", // 2024-11-01
        "%m/%d/%Y", // 11/01/2024
        "%m/%d/%y", // 11/01/24
        "%m-%d-%Y", // 11-01-2024
        "%d/%m/%Y", // 01/11/2024 (European)
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Net  Sales"), "net sales");
        assert_eq!(normalize_header("  LABOR_COST "), "labor cost");
        assert_eq!(normalize_header("Guest__Count"), "guest count");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_parse_numeric_text() {
        assert_eq!(parse_numeric(&Cell::Text("$1,234.56".into())), Some(1234.56));
        assert_eq!(parse_numeric(&Cell::Text("(100.00)".into())), Some(-100.00));
        assert_eq!(parse_numeric(&Cell::Text("18.5%".into())), Some(18.5));
        assert_eq!(parse_numeric(&Cell::Text(" 42 ".into())), Some(42.0));
        assert_eq!(parse_numeric(&Cell::Text("-123.45".into())), Some(-123.45));
        assert_eq!(parse_numeric(&Cell::Text("".into())), None);
        assert_eq!(parse_numeric(&Cell::Text("n/a".into())), None);
    }

    #[test]
    fn test_parse_numeric_native() {
        assert_eq!(parse_numeric(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(parse_numeric(&Cell::Number(f64::NAN)), None);
        assert_eq!(parse_numeric(&Cell::Number(f64::INFINITY)), None);
        assert_eq!(parse_numeric(&Cell::Empty), None);
    }

    #[test]
    fn test_parse_numeric_idempotent() {
        // Re-parsing the rendered output of a parse yields the same value
        for raw in ["$1,234.56", "(99.95)", "18%", "0", "-3.5"] {
            let first = parse_numeric(&Cell::Text(raw.into())).unwrap();
            let second = parse_numeric(&Cell::Text(first.to_string())).unwrap();
            assert!((first - second).abs() < 1e-9, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_normalize_date_cell() {
        let native = Cell::Date(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
        assert_eq!(normalize_date_cell(&native), Some("2024-11-01".to_string()));

        assert_eq!(
            normalize_date_cell(&Cell::Text("11/01/2024".into())),
            Some("2024-11-01".to_string())
        );
        assert_eq!(
            normalize_date_cell(&Cell::Text("2024-11-01".into())),
            Some("2024-11-01".to_string())
        );
        // Unparseable strings pass through verbatim as grouping keys
        assert_eq!(
            normalize_date_cell(&Cell::Text("Week 44".into())),
            Some("Week 44".to_string())
        );
        assert_eq!(normalize_date_cell(&Cell::Empty), None);
    }

    #[test]
    fn test_normalize_text_cell() {
        assert_eq!(
            normalize_text_cell(&Cell::Text("  Food  ".into())),
            Some("Food".to_string())
        );
        assert_eq!(normalize_text_cell(&Cell::Number(42.0)), Some("42".to_string()));
        assert_eq!(normalize_text_cell(&Cell::Number(1.5)), Some("1.5".to_string()));
        assert_eq!(normalize_text_cell(&Cell::Text("   ".into())), None);
        assert_eq!(normalize_text_cell(&Cell::Empty), None);
    }
}
