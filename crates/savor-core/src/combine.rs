//! Multi-file combination
//!
//! Groups parsed files by dataset type and merges totals, category maps,
//! and daily maps within each group. Each group gets a fresh accumulator;
//! the per-file results are immutable inputs and are never mutated.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{CombinedGroup, FileMetrics, ParsedFile};
use crate::parse::{add_opt, ROW_SAMPLE_LIMIT};

/// Combine parsed files into one group per distinct dataset type.
///
/// Groups appear in first-encounter order; within a group files merge in
/// encounter order, which also governs which sample rows survive the cap.
pub fn combine_files(files: &[ParsedFile]) -> Vec<CombinedGroup> {
    let mut groups: Vec<CombinedGroup> = Vec::new();

    for file in files {
        let group = match groups
            .iter_mut()
            .find(|g| g.dataset_type == file.dataset_type)
        {
            Some(existing) => existing,
            None => {
                groups.push(CombinedGroup {
                    dataset_type: file.dataset_type,
                    present_keys: HashSet::new(),
                    metrics: FileMetrics::default(),
                    sample_rows: Vec::new(),
                    file_count: 0,
                    row_count: 0,
                });
                groups.last_mut().expect("group just pushed")
            }
        };

        merge_into(group, file);
    }

    debug!("Combined {} files into {} groups", files.len(), groups.len());
    groups
}

/// Fold one file into a group's accumulator
fn merge_into(group: &mut CombinedGroup, file: &ParsedFile) {
    group.file_count += 1;
    group.row_count += file.row_count;
    group.present_keys.extend(file.present_keys.iter().copied());

    add_opt(&mut group.metrics.net_sales, file.metrics.net_sales);
    add_opt(&mut group.metrics.guests, file.metrics.guests);
    add_opt(&mut group.metrics.tips, file.metrics.tips);
    add_opt(&mut group.metrics.labor_cost, file.metrics.labor_cost);
    add_opt(&mut group.metrics.labor_hours, file.metrics.labor_hours);

    group
        .metrics
        .labor_percent_samples
        .extend_from_slice(&file.metrics.labor_percent_samples);

    for (category, sales) in &file.metrics.by_category {
        *group
            .metrics
            .by_category
            .entry(category.clone())
            .or_insert(0.0) += sales;
    }

    for (date, bucket) in &file.metrics.by_day {
        let acc = group.metrics.by_day.entry(date.clone()).or_default();
        acc.sales += bucket.sales;
        acc.guests += bucket.guests;
        acc.tips += bucket.tips;
    }

    let remaining = ROW_SAMPLE_LIMIT.saturating_sub(group.sample_rows.len());
    group
        .sample_rows
        .extend(file.sample_rows.iter().take(remaining).cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::models::DatasetType;
    use crate::parse::parse_rows;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::Text(s.to_string())).collect()
    }

    fn item_sales_file(name: &str, rows: &[[&str; 3]]) -> ParsedFile {
        let mut grid = vec![text_row(&["Date", "Item", "Net Sales"])];
        for row in rows {
            grid.push(text_row(row));
        }
        parse_rows(name, &grid).unwrap()
    }

    #[test]
    fn test_single_file_combine_is_identity() {
        let file = item_sales_file(
            "a.csv",
            &[
                ["2024-11-01", "Burger", "100"],
                ["2024-11-02", "Fries", "50"],
            ],
        );

        let groups = combine_files(std::slice::from_ref(&file));

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.dataset_type, DatasetType::ItemSales);
        assert_eq!(group.metrics, file.metrics);
        assert_eq!(group.present_keys, file.present_keys);
        assert_eq!(group.row_count, file.row_count);
    }

    #[test]
    fn test_matching_dates_merge_across_files() {
        // Two item_sales files with 3 matching dates combine into one
        // daily map with 3 entries, each the per-date sum of both files.
        let a = item_sales_file(
            "a.csv",
            &[
                ["2024-11-01", "Burger", "100"],
                ["2024-11-02", "Fries", "50"],
                ["2024-11-03", "Shake", "30"],
            ],
        );
        let b = item_sales_file(
            "b.csv",
            &[
                ["2024-11-01", "Salad", "40"],
                ["2024-11-02", "Wrap", "60"],
                ["2024-11-03", "Soup", "20"],
            ],
        );

        let groups = combine_files(&[a, b]);

        assert_eq!(groups.len(), 1);
        let daily = &groups[0].metrics.by_day;
        assert_eq!(daily.len(), 3);
        assert_eq!(daily["2024-11-01"].sales, 140.0);
        assert_eq!(daily["2024-11-02"].sales, 110.0);
        assert_eq!(daily["2024-11-03"].sales, 50.0);
        assert_eq!(groups[0].metrics.net_sales, Some(300.0));
        assert_eq!(groups[0].file_count, 2);
    }

    #[test]
    fn test_groups_split_by_dataset_type() {
        let sales = item_sales_file("a.csv", &[["2024-11-01", "Burger", "100"]]);

        let labor_rows = vec![
            text_row(&["Labor Hours", "Labor Cost"]),
            text_row(&["40", "600"]),
        ];
        let labor = parse_rows("labor.csv", &labor_rows).unwrap();

        let groups = combine_files(&[sales, labor]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dataset_type, DatasetType::ItemSales);
        assert_eq!(groups[1].dataset_type, DatasetType::Labor);
        // Labor totals never bleed into the sales group
        assert_eq!(groups[0].metrics.labor_cost, None);
        assert_eq!(groups[1].metrics.net_sales, None);
    }

    #[test]
    fn test_category_maps_union_and_sum() {
        let mut grid_a = vec![text_row(&["Category", "Net Sales"])];
        grid_a.push(text_row(&["Food", "500"]));
        grid_a.push(text_row(&["Beverage", "300"]));
        let a = parse_rows("a.csv", &grid_a).unwrap();

        let mut grid_b = vec![text_row(&["Category", "Net Sales"])];
        grid_b.push(text_row(&["Food", "200"]));
        grid_b.push(text_row(&["Dessert", "100"]));
        let b = parse_rows("b.csv", &grid_b).unwrap();

        let groups = combine_files(&[a, b]);

        assert_eq!(groups.len(), 1);
        let categories = &groups[0].metrics.by_category;
        assert_eq!(categories.get("Food"), Some(&700.0));
        assert_eq!(categories.get("Beverage"), Some(&300.0));
        assert_eq!(categories.get("Dessert"), Some(&100.0));
    }

    #[test]
    fn test_combined_sample_cap() {
        let rows_a: Vec<[&str; 3]> = (0..40).map(|_| ["2024-11-01", "Burger", "1"]).collect();
        let rows_b: Vec<[&str; 3]> = (0..40).map(|_| ["2024-11-02", "Fries", "1"]).collect();
        let a = item_sales_file("a.csv", &rows_a);
        let b = item_sales_file("b.csv", &rows_b);

        let groups = combine_files(&[a, b]);

        // 40 samples from the first file, then only 10 more fit
        assert_eq!(groups[0].sample_rows.len(), ROW_SAMPLE_LIMIT);
        assert_eq!(
            groups[0].sample_rows[39].date.as_deref(),
            Some("2024-11-01")
        );
        assert_eq!(
            groups[0].sample_rows[40].date.as_deref(),
            Some("2024-11-02")
        );
    }
}
