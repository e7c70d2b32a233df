//! Dataset parsing
//!
//! Walks the data rows of one file using the column-role mapping,
//! accumulates per-file totals, category breakdowns, and daily breakdowns,
//! and tags the file with a dataset type inferred from which canonical
//! roles are present.

use tracing::debug;

use crate::cell::{normalize_date_cell, normalize_text_cell, parse_numeric, Cell};
use crate::classify::{classify_columns, detect_header_row, present_keys};
use crate::error::{Error, Result};
use crate::models::{CanonicalKey, DatasetType, FileMetrics, NormalizedRow, ParsedFile};

/// Maximum normalized-row samples retained per file for audit display
pub const ROW_SAMPLE_LIMIT: usize = 50;

/// Presence flags feeding the dataset-type decision table
#[derive(Debug, Clone, Copy)]
struct PresenceFlags {
    has_labor: bool,
    has_net: bool,
    has_item: bool,
    has_category: bool,
    has_date: bool,
    has_tips: bool,
}

/// Dataset-type decision table, evaluated top-to-bottom, first match wins.
///
/// Labor presence always wins - labor sheets are structurally distinct and
/// must never be miscategorized as sales sheets. Then specificity of sales
/// grouping (item > category > date > ungrouped) decides the rest.
const DATASET_RULES: [(fn(PresenceFlags) -> bool, DatasetType); 7] = [
    (|f| f.has_labor, DatasetType::Labor),
    (|f| f.has_net && f.has_item, DatasetType::ItemSales),
    (|f| f.has_net && f.has_category, DatasetType::CategoryRollup),
    (|f| f.has_net && f.has_date, DatasetType::DailySales),
    (|f| f.has_tips && !f.has_net, DatasetType::Tips),
    (|f| f.has_net, DatasetType::GeneralSales),
    (|f| f.has_tips, DatasetType::Tips),
];

/// Parse one file's extracted rows into metrics and a dataset type.
///
/// Fails with a structural parse error when the file is empty or no
/// header row can be found; callers decide whether that skips the file
/// or the batch.
pub fn parse_rows(filename: &str, rows: &[Vec<Cell>]) -> Result<ParsedFile> {
    if rows.is_empty() {
        return Err(Error::Parse(format!("{}: file is empty", filename)));
    }

    let header_idx = detect_header_row(rows)
        .ok_or_else(|| Error::Parse(format!("{}: no header row found", filename)))?;
    let columns = classify_columns(&rows[header_idx])?;
    let keys = present_keys(&columns);

    let mut metrics = FileMetrics::default();
    let mut sample_rows = Vec::new();
    let mut row_count = 0usize;

    for row in rows.iter().skip(header_idx + 1) {
        if !is_meaningful(row) {
            continue;
        }

        let normalized = extract_row(row, &columns);
        if normalized.is_blank() {
            continue;
        }

        row_count += 1;
        accumulate(&mut metrics, &normalized);

        // Bounded sample; overflow is silently dropped
        if sample_rows.len() < ROW_SAMPLE_LIMIT {
            sample_rows.push(normalized);
        }
    }

    let dataset_type = infer_dataset_type_from_columns(&columns);
    debug!(
        "Parsed {}: type={}, {} rows, {} roles",
        filename,
        dataset_type,
        row_count,
        keys.len()
    );

    Ok(ParsedFile {
        filename: filename.to_string(),
        dataset_type,
        columns,
        present_keys: keys,
        metrics,
        sample_rows,
        row_count,
    })
}

/// A meaningful row has at least one non-empty, non-NaN cell
fn is_meaningful(row: &[Cell]) -> bool {
    row.iter().any(|cell| !cell.is_empty())
}

/// Extract typed values for every present role via the cell normalizer
fn extract_row(row: &[Cell], columns: &[crate::models::ColumnMeta]) -> NormalizedRow {
    let mut out = NormalizedRow::default();

    for col in columns {
        let Some(role) = col.role else { continue };
        let cell = row.get(col.index).unwrap_or(&Cell::Empty);

        match role {
            CanonicalKey::Date => out.date = normalize_date_cell(cell),
            CanonicalKey::Category => out.category = normalize_text_cell(cell),
            CanonicalKey::Item => out.item = normalize_text_cell(cell),
            CanonicalKey::NetSales => out.net_sales = parse_numeric(cell),
            CanonicalKey::Guests => out.guests = parse_numeric(cell),
            CanonicalKey::Tips => out.tips = parse_numeric(cell),
            CanonicalKey::LaborCost => out.labor_cost = parse_numeric(cell),
            CanonicalKey::LaborHours => out.labor_hours = parse_numeric(cell),
            CanonicalKey::LaborPercent => out.labor_percent = parse_numeric(cell),
        }
    }

    out
}

/// Fold one row into the running metrics.
///
/// Sums only move off None when a value is actually present, so a metric
/// whose column is absent stays None for the file rather than zero.
fn accumulate(metrics: &mut FileMetrics, row: &NormalizedRow) {
    add_opt(&mut metrics.net_sales, row.net_sales);
    add_opt(&mut metrics.guests, row.guests);
    add_opt(&mut metrics.tips, row.tips);
    add_opt(&mut metrics.labor_cost, row.labor_cost);
    add_opt(&mut metrics.labor_hours, row.labor_hours);

    // Labor percent is a per-row ratio, collected for averaging rather
    // than summed
    if let Some(pct) = row.labor_percent {
        metrics.labor_percent_samples.push(pct);
    }

    if let (Some(category), Some(net)) = (&row.category, row.net_sales) {
        *metrics.by_category.entry(category.clone()).or_insert(0.0) += net;
    }

    if let Some(date) = &row.date {
        let bucket = metrics.by_day.entry(date.clone()).or_default();
        bucket.sales += row.net_sales.unwrap_or(0.0);
        bucket.guests += row.guests.unwrap_or(0.0);
        bucket.tips += row.tips.unwrap_or(0.0);
    }
}

pub(crate) fn add_opt(acc: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *acc = Some(acc.unwrap_or(0.0) + v);
    }
}

/// Dataset type is a pure function of the present-key set; it never
/// depends on row values.
pub fn infer_dataset_type(keys: &std::collections::HashSet<CanonicalKey>) -> DatasetType {
    let flags = PresenceFlags {
        has_labor: keys.iter().any(|k| k.is_labor()),
        has_net: keys.contains(&CanonicalKey::NetSales),
        has_item: keys.contains(&CanonicalKey::Item),
        has_category: keys.contains(&CanonicalKey::Category),
        has_date: keys.contains(&CanonicalKey::Date),
        has_tips: keys.contains(&CanonicalKey::Tips),
    };

    DATASET_RULES
        .iter()
        .find(|(matches, _)| matches(flags))
        .map(|(_, dataset_type)| *dataset_type)
        .unwrap_or(DatasetType::Unknown)
}

fn infer_dataset_type_from_columns(columns: &[crate::models::ColumnMeta]) -> DatasetType {
    infer_dataset_type(&present_keys(columns))
}
