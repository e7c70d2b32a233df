//! KPI resolution
//!
//! Selects, across the combined dataset groups, the best source for each
//! top-level KPI using fixed priority tables, marks which KPIs are
//! available versus missing, and derives the chart series. More specific
//! dataset types supply a metric over more generic ones, and no KPI is
//! fabricated from an unrelated dataset type's columns.

use tracing::debug;

use crate::models::{
    CanonicalKey, CategorySlice, ChartBundle, CombinedGroup, DailySalesPoint, DatasetType,
    KpiAvailability, KpiSet, PpaTrendPoint, ResolvedKpis,
};

/// Dataset types consulted for the net-sales KPI, in order
const NET_SALES_PRIORITY: [DatasetType; 4] = [
    DatasetType::ItemSales,
    DatasetType::DailySales,
    DatasetType::CategoryRollup,
    DatasetType::GeneralSales,
];

/// Dataset types consulted for the guest-count KPI, in order
const GUESTS_PRIORITY: [DatasetType; 3] = [
    DatasetType::ItemSales,
    DatasetType::DailySales,
    DatasetType::GeneralSales,
];

/// Dataset types consulted for the tips KPI, in order
const TIPS_PRIORITY: [DatasetType; 4] = [
    DatasetType::Tips,
    DatasetType::ItemSales,
    DatasetType::DailySales,
    DatasetType::GeneralSales,
];

/// Dataset types consulted for the category-mix series, in order
const CATEGORY_MIX_PRIORITY: [DatasetType; 4] = [
    DatasetType::CategoryRollup,
    DatasetType::ItemSales,
    DatasetType::DailySales,
    DatasetType::GeneralSales,
];

/// Resolve the KPI set and chart series from the combined groups.
///
/// The returned chart bundle has an empty `sources` list; the caller
/// attaches per-file source metadata.
pub fn resolve_kpis(groups: &[CombinedGroup]) -> (ResolvedKpis, ChartBundle) {
    let net_group = find_group(groups, &NET_SALES_PRIORITY, CanonicalKey::NetSales);
    let guest_group = find_group(groups, &GUESTS_PRIORITY, CanonicalKey::Guests);
    let tips_group = find_group(groups, &TIPS_PRIORITY, CanonicalKey::Tips);

    let net_sales = net_group.and_then(|g| g.metrics.net_sales).map(round2);
    let guests = guest_group
        .and_then(|g| g.metrics.guests)
        .map(|g| g.round() as i64);

    // PPA only when the group that supplied net sales also has guests;
    // guest counts from a different dataset type would silently combine
    // unrelated row populations.
    let ppa = net_group.and_then(|g| match (g.metrics.net_sales, g.metrics.guests) {
        (Some(net), Some(guests)) if guests > 0.0 => Some(round2(net / guests)),
        _ => None,
    });

    let tips = tips_group.and_then(|g| g.metrics.tips);
    let tip_percent = match (tips, net_sales) {
        (Some(tips), Some(net)) if net != 0.0 => Some(round2(tips / net * 100.0)),
        _ => None,
    };

    let labor_percent = resolve_labor_percent(groups, net_sales);

    let kpis = KpiSet {
        net_sales,
        guests,
        ppa,
        tip_percent,
        labor_percent,
    };
    let available = KpiAvailability {
        net_sales: kpis.net_sales.is_some(),
        guests: kpis.guests.is_some(),
        ppa: kpis.ppa.is_some(),
        tip_percent: kpis.tip_percent.is_some(),
        labor_percent: kpis.labor_percent.is_some(),
    };

    debug!(
        "Resolved KPIs: net_sales={:?} guests={:?} ppa={:?} tip%={:?} labor%={:?}",
        kpis.net_sales, kpis.guests, kpis.ppa, kpis.tip_percent, kpis.labor_percent
    );

    let charts = build_charts(groups, net_group);

    (ResolvedKpis { kpis, available }, charts)
}

/// First group in priority order that exists and has the key present
fn find_group<'a>(
    groups: &'a [CombinedGroup],
    priority: &[DatasetType],
    key: CanonicalKey,
) -> Option<&'a CombinedGroup> {
    priority.iter().find_map(|dataset_type| {
        groups
            .iter()
            .find(|g| g.dataset_type == *dataset_type && g.present_keys.contains(&key))
    })
}

/// Labor percent: per-row samples are pre-computed ratios and more
/// trustworthy than a ratio of unrelated sums, so their mean wins when
/// any exist; otherwise fall back to labor_cost / net_sales.
fn resolve_labor_percent(groups: &[CombinedGroup], net_sales: Option<f64>) -> Option<f64> {
    let samples: Vec<f64> = groups
        .iter()
        .flat_map(|g| g.metrics.labor_percent_samples.iter().copied())
        .collect();

    if !samples.is_empty() {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        return Some(round2(mean));
    }

    let labor_cost = groups
        .iter()
        .find(|g| g.dataset_type == DatasetType::Labor)
        .and_then(|g| g.metrics.labor_cost)
        .or_else(|| groups.iter().find_map(|g| g.metrics.labor_cost));

    match (labor_cost, net_sales) {
        (Some(cost), Some(net)) if net != 0.0 => Some(round2(cost / net * 100.0)),
        _ => None,
    }
}

/// Build the chart series.
///
/// Daily sales and the PPA trend come from the net-sales group's daily
/// map (sorted ascending by ISO date key); the category mix comes from
/// the first priority group with category data, sorted descending.
fn build_charts(groups: &[CombinedGroup], net_group: Option<&CombinedGroup>) -> ChartBundle {
    let mut daily_sales = Vec::new();
    let mut ppa_trend = Vec::new();

    if let Some(group) = net_group {
        for (date, bucket) in &group.metrics.by_day {
            daily_sales.push(DailySalesPoint {
                date: date.clone(),
                sales: round2(bucket.sales),
                guests: bucket.guests,
                tips: round2(bucket.tips),
            });
            // Division-by-zero guard: days without guests are skipped
            if bucket.guests > 0.0 {
                ppa_trend.push(PpaTrendPoint {
                    date: date.clone(),
                    ppa: round2(bucket.sales / bucket.guests),
                });
            }
        }
    }

    let category_group = find_group(groups, &CATEGORY_MIX_PRIORITY, CanonicalKey::Category)
        .filter(|g| !g.metrics.by_category.is_empty());

    let mut category_mix: Vec<CategorySlice> = category_group
        .map(|g| {
            g.metrics
                .by_category
                .iter()
                .map(|(category, sales)| CategorySlice {
                    category: category.clone(),
                    sales: round2(*sales),
                })
                .collect()
        })
        .unwrap_or_default();

    category_mix.sort_by(|a, b| {
        b.sales
            .partial_cmp(&a.sales)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    ChartBundle {
        daily_sales,
        ppa_trend,
        category_mix,
        sources: Vec::new(),
    }
}

/// Round to 2 decimal places for currency and percentage values
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::combine::combine_files;
    use crate::parse::parse_rows;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::Text(s.to_string())).collect()
    }

    fn groups_from(files: &[(&str, Vec<Vec<Cell>>)]) -> Vec<CombinedGroup> {
        let parsed: Vec<_> = files
            .iter()
            .map(|(name, rows)| parse_rows(name, rows).unwrap())
            .collect();
        combine_files(&parsed)
    }

    #[test]
    fn test_category_rollup_scenario() {
        let groups = groups_from(&[(
            "sales.csv",
            vec![
                text_row(&["Date", "Category", "Net Sales", "Guests"]),
                text_row(&["2024-11-01", "Food", "500", "20"]),
                text_row(&["2024-11-02", "Beverage", "300", "15"]),
            ],
        )]);

        assert_eq!(groups[0].dataset_type, DatasetType::CategoryRollup);

        let (resolved, charts) = resolve_kpis(&groups);

        assert_eq!(resolved.kpis.net_sales, Some(800.0));
        assert_eq!(resolved.kpis.guests, Some(35));
        assert_eq!(resolved.kpis.ppa, Some(22.86));
        assert!(resolved.available.net_sales);
        assert!(resolved.available.ppa);

        assert_eq!(charts.category_mix.len(), 2);
        assert_eq!(charts.category_mix[0].category, "Food");
        assert_eq!(charts.category_mix[0].sales, 500.0);
        assert_eq!(charts.category_mix[1].category, "Beverage");

        // Category mix sums to the group's net sales total
        let mix_total: f64 = charts.category_mix.iter().map(|s| s.sales).sum();
        assert_eq!(mix_total, 800.0);
    }

    #[test]
    fn test_labor_only_batch() {
        let groups = groups_from(&[(
            "labor.csv",
            vec![
                text_row(&["Labor Hours", "Labor Cost"]),
                text_row(&["40", "600"]),
            ],
        )]);

        let (resolved, _) = resolve_kpis(&groups);

        // No sales file anywhere: net sales and labor % both unavailable,
        // never zero
        assert_eq!(resolved.kpis.net_sales, None);
        assert!(!resolved.available.net_sales);
        assert_eq!(resolved.kpis.labor_percent, None);
        assert!(!resolved.available.labor_percent);
    }

    #[test]
    fn test_labor_percent_from_cost_over_batch_net() {
        let groups = groups_from(&[
            (
                "labor.csv",
                vec![
                    text_row(&["Labor Hours", "Labor Cost"]),
                    text_row(&["40", "600"]),
                ],
            ),
            (
                "sales.csv",
                vec![
                    text_row(&["Date", "Net Sales"]),
                    text_row(&["2024-11-01", "2000"]),
                ],
            ),
        ]);

        let (resolved, _) = resolve_kpis(&groups);

        assert_eq!(resolved.kpis.net_sales, Some(2000.0));
        // 600 / 2000 * 100
        assert_eq!(resolved.kpis.labor_percent, Some(30.0));
    }

    #[test]
    fn test_labor_percent_samples_beat_ratio() {
        let groups = groups_from(&[
            (
                "labor.csv",
                vec![
                    text_row(&["Labor Cost", "Labor %"]),
                    text_row(&["600", "28"]),
                    text_row(&["400", "32"]),
                ],
            ),
            (
                "sales.csv",
                vec![
                    text_row(&["Date", "Net Sales"]),
                    text_row(&["2024-11-01", "10000"]),
                ],
            ),
        ]);

        let (resolved, _) = resolve_kpis(&groups);

        // Mean of the per-row samples, not 1000/10000*100
        assert_eq!(resolved.kpis.labor_percent, Some(30.0));
    }

    #[test]
    fn test_ppa_never_mixes_groups() {
        // Net sales resolves from the category rollup (no guest column);
        // guests exist only in a general sales file. The guest KPI is
        // available but PPA must stay unavailable.
        let groups = groups_from(&[
            (
                "categories.csv",
                vec![
                    text_row(&["Category", "Net Sales"]),
                    text_row(&["Food", "500"]),
                ],
            ),
            (
                "covers.csv",
                vec![text_row(&["Sales", "Guests"]), text_row(&["100", "40"])],
            ),
        ]);

        let (resolved, _) = resolve_kpis(&groups);

        assert_eq!(resolved.kpis.net_sales, Some(500.0));
        assert_eq!(resolved.kpis.guests, Some(40));
        assert_eq!(resolved.kpis.ppa, None);
        assert!(!resolved.available.ppa);
    }

    #[test]
    fn test_ppa_null_on_zero_guests() {
        let groups = groups_from(&[(
            "sales.csv",
            vec![
                text_row(&["Date", "Net Sales", "Guests"]),
                text_row(&["2024-11-01", "500", "0"]),
            ],
        )]);

        let (resolved, charts) = resolve_kpis(&groups);

        // Never Infinity, never a division by zero
        assert_eq!(resolved.kpis.ppa, None);
        assert!(charts.ppa_trend.is_empty());
    }

    #[test]
    fn test_tips_dataset_preferred() {
        let groups = groups_from(&[
            (
                "items.csv",
                vec![
                    text_row(&["Item", "Net Sales", "Tips"]),
                    text_row(&["Burger", "100", "10"]),
                ],
            ),
            (
                "tips.csv",
                vec![text_row(&["Date", "Tips"]), text_row(&["2024-11-01", "55"])],
            ),
        ]);

        let (resolved, _) = resolve_kpis(&groups);

        // The dedicated tips dataset wins over tips found in item sales
        assert_eq!(resolved.kpis.tip_percent, Some(55.0));
    }

    #[test]
    fn test_daily_series_sorted_ascending() {
        let groups = groups_from(&[(
            "daily.csv",
            vec![
                text_row(&["Date", "Net Sales", "Guests"]),
                text_row(&["2024-11-03", "300", "10"]),
                text_row(&["2024-11-01", "500", "20"]),
                text_row(&["2024-11-02", "400", "0"]),
            ],
        )]);

        let (_, charts) = resolve_kpis(&groups);

        let dates: Vec<&str> = charts.daily_sales.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-11-01", "2024-11-02", "2024-11-03"]);

        // PPA trend filters out the zero-guest day
        let ppa_dates: Vec<&str> = charts.ppa_trend.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(ppa_dates, vec!["2024-11-01", "2024-11-03"]);
        assert_eq!(charts.ppa_trend[0].ppa, 25.0);
    }

    #[test]
    fn test_net_sales_priority_order() {
        // item_sales beats daily_sales which beats category_rollup
        let groups = groups_from(&[
            (
                "categories.csv",
                vec![
                    text_row(&["Category", "Net Sales"]),
                    text_row(&["Food", "999"]),
                ],
            ),
            (
                "items.csv",
                vec![
                    text_row(&["Item", "Net Sales"]),
                    text_row(&["Burger", "123"]),
                ],
            ),
        ]);

        let (resolved, _) = resolve_kpis(&groups);
        assert_eq!(resolved.kpis.net_sales, Some(123.0));
    }

    #[test]
    fn test_empty_groups() {
        let (resolved, charts) = resolve_kpis(&[]);
        assert_eq!(resolved.kpis, KpiSet::default());
        assert!(!resolved.available.net_sales);
        assert!(charts.daily_sales.is_empty());
        assert!(charts.category_mix.is_empty());
    }
}
