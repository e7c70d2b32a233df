//! Domain models for Savor

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic role a spreadsheet column can play, independent of the literal
/// header text used in any given file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    NetSales,
    Guests,
    Tips,
    LaborCost,
    LaborHours,
    LaborPercent,
    Date,
    Category,
    Item,
}

impl CanonicalKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetSales => "net_sales",
            Self::Guests => "guests",
            Self::Tips => "tips",
            Self::LaborCost => "labor_cost",
            Self::LaborHours => "labor_hours",
            Self::LaborPercent => "labor_percent",
            Self::Date => "date",
            Self::Category => "category",
            Self::Item => "item",
        }
    }

    /// True for any of the labor family of roles
    pub fn is_labor(&self) -> bool {
        matches!(self, Self::LaborCost | Self::LaborHours | Self::LaborPercent)
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of an entire file based on which canonical keys its
/// columns satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    ItemSales,
    CategoryRollup,
    DailySales,
    Labor,
    Tips,
    GeneralSales,
    Unknown,
}

impl DatasetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ItemSales => "item_sales",
            Self::CategoryRollup => "category_rollup",
            Self::DailySales => "daily_sales",
            Self::Labor => "labor",
            Self::Tips => "tips",
            Self::GeneralSales => "general_sales",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for DatasetType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "item_sales" => Ok(Self::ItemSales),
            "category_rollup" => Ok(Self::CategoryRollup),
            "daily_sales" => Ok(Self::DailySales),
            "labor" => Ok(Self::Labor),
            "tips" => Ok(Self::Tips),
            "general_sales" => Ok(Self::GeneralSales),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown dataset type: {}", s)),
        }
    }
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for one input column, created during header classification
/// and immutable thereafter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Original header text as it appeared in the file
    pub header: String,
    /// Lowercased, whitespace-collapsed header
    pub normalized: String,
    /// Zero-based column position
    pub index: usize,
    /// Whether the header describes gross (pre-discount) sales
    pub is_gross: bool,
    /// Canonical role assigned by the classifier, if any
    pub role: Option<CanonicalKey>,
}

/// One logical business record produced from a meaningful data row.
///
/// A field is `None` when the row had no value or the file had no
/// corresponding column - never conflated with zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub date: Option<String>,
    pub category: Option<String>,
    pub item: Option<String>,
    pub net_sales: Option<f64>,
    pub guests: Option<f64>,
    pub tips: Option<f64>,
    pub labor_cost: Option<f64>,
    pub labor_hours: Option<f64>,
    pub labor_percent: Option<f64>,
}

impl NormalizedRow {
    /// True when every field is None; such rows are dropped
    pub fn is_blank(&self) -> bool {
        self.date.is_none()
            && self.category.is_none()
            && self.item.is_none()
            && self.net_sales.is_none()
            && self.guests.is_none()
            && self.tips.is_none()
            && self.labor_cost.is_none()
            && self.labor_hours.is_none()
            && self.labor_percent.is_none()
    }
}

/// Per-day accumulation bucket for the daily breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub sales: f64,
    pub guests: f64,
    pub tips: f64,
}

/// Running sums and breakdown maps for one parsed file.
///
/// Sums are `None` until the corresponding column contributes at least one
/// value, so an absent metric stays distinguishable from a zero total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub net_sales: Option<f64>,
    pub guests: Option<f64>,
    pub tips: Option<f64>,
    pub labor_cost: Option<f64>,
    pub labor_hours: Option<f64>,
    /// Per-row labor percent readings, kept individually for averaging
    pub labor_percent_samples: Vec<f64>,
    /// Category -> summed net sales
    pub by_category: HashMap<String, f64>,
    /// ISO date (or verbatim grouping key) -> per-day bucket
    pub by_day: BTreeMap<String, DailyBucket>,
}

/// Result of parsing a single uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub filename: String,
    pub dataset_type: DatasetType,
    pub columns: Vec<ColumnMeta>,
    /// Canonical keys that had a bound column in this file
    pub present_keys: HashSet<CanonicalKey>,
    pub metrics: FileMetrics,
    /// First rows retained for audit display, capped at ROW_SAMPLE_LIMIT
    pub sample_rows: Vec<NormalizedRow>,
    /// Count of meaningful data rows
    pub row_count: usize,
}

/// Merged metrics for all files of one dataset type within an upload batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedGroup {
    pub dataset_type: DatasetType,
    /// Union of present keys across the group's files
    pub present_keys: HashSet<CanonicalKey>,
    pub metrics: FileMetrics,
    pub sample_rows: Vec<NormalizedRow>,
    pub file_count: usize,
    pub row_count: usize,
}

/// The five top-level KPIs. Each is independently nullable; consult the
/// parallel [`KpiAvailability`] to distinguish "zero" from "unknown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSet {
    /// Total net sales, 2 decimal places
    pub net_sales: Option<f64>,
    /// Total guest count, rounded to the nearest integer
    pub guests: Option<i64>,
    /// Per-person average spend, 2 decimal places
    pub ppa: Option<f64>,
    /// Tips as a percentage of net sales, 2 decimal places
    pub tip_percent: Option<f64>,
    /// Labor as a percentage of net sales, 2 decimal places
    pub labor_percent: Option<f64>,
}

/// Availability flags parallel to [`KpiSet`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiAvailability {
    pub net_sales: bool,
    pub guests: bool,
    pub ppa: bool,
    pub tip_percent: bool,
    pub labor_percent: bool,
}

/// One point of the daily sales series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySalesPoint {
    pub date: String,
    pub sales: f64,
    pub guests: f64,
    pub tips: f64,
}

/// One point of the per-person-average trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpaTrendPoint {
    pub date: String,
    pub ppa: f64,
}

/// One slice of the category mix, sorted descending by sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    pub sales: f64,
}

/// Source metadata for one uploaded file, carried on the report record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileMeta {
    pub filename: String,
    /// Blob store reference for the uploaded bytes, when stored
    pub storage_key: Option<String>,
    pub dataset_type: DatasetType,
    pub row_count: usize,
}

/// Chart data bundle persisted alongside the KPIs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartBundle {
    pub daily_sales: Vec<DailySalesPoint>,
    pub ppa_trend: Vec<PpaTrendPoint>,
    pub category_mix: Vec<CategorySlice>,
    pub sources: Vec<SourceFileMeta>,
}

/// Resolved KPI set plus availability flags, computed once per upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedKpis {
    pub kpis: KpiSet,
    pub available: KpiAvailability,
}

/// Parsed narrative-analysis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResult {
    pub summary: Vec<String>,
    pub insights: Vec<String>,
    pub actions: Vec<String>,
    /// False when the narrative collaborator failed or returned nothing
    pub available: bool,
}

impl NarrativeResult {
    /// Fixed degraded result used when narrative generation fails
    pub fn unavailable() -> Self {
        Self {
            summary: vec!["Analysis unavailable.".to_string()],
            insights: Vec::new(),
            actions: Vec::new(),
            available: false,
        }
    }
}

/// A stored analysis report, write-once per upload request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub restaurant_name: String,
    /// Declared by the caller, or inferred from the dominant dataset type
    pub report_type: String,
    pub period_label: Option<String>,
    /// Blob store reference for the first uploaded file
    pub primary_file_key: Option<String>,
    pub kpis: KpiSet,
    pub available: KpiAvailability,
    pub narrative: NarrativeResult,
    pub charts: ChartBundle,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
}

/// A report record ready for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub restaurant_name: String,
    pub report_type: String,
    pub period_label: Option<String>,
    pub primary_file_key: Option<String>,
    pub kpis: KpiSet,
    pub available: KpiAvailability,
    pub narrative: NarrativeResult,
    pub charts: ChartBundle,
    pub owner_email: String,
}
