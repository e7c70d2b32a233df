//! Upload analysis pipeline
//!
//! Runs the files of one upload batch through extraction, header
//! classification, parsing, combination, and KPI resolution. Files are
//! parsed sequentially within a request; an unreadable file is skipped
//! with a recorded warning rather than failing the whole batch. All state
//! is scoped to the request, so independent uploads run concurrently with
//! nothing shared.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::AIClient;
use crate::combine::combine_files;
use crate::models::{
    ChartBundle, CombinedGroup, NarrativeResult, ParsedFile, ResolvedKpis, SourceFileMeta,
};
use crate::narrative;
use crate::parse::parse_rows;
use crate::resolve::resolve_kpis;
use crate::sheet::read_rows;

/// One uploaded file: declared filename plus raw bytes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A recorded problem with one file in the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWarning {
    pub filename: String,
    pub message: String,
}

/// Everything derived from one upload batch
#[derive(Debug, Clone)]
pub struct Analysis {
    pub files: Vec<ParsedFile>,
    pub groups: Vec<CombinedGroup>,
    pub resolved: ResolvedKpis,
    pub charts: ChartBundle,
    pub warnings: Vec<FileWarning>,
}

/// Parse, combine, and resolve one batch of uploaded files.
///
/// Skip-and-report policy: a structurally unreadable file (bad bytes, no
/// header row, empty sheet) becomes a warning and the remaining files
/// still produce a result.
pub fn analyze_files(files: &[UploadedFile]) -> Analysis {
    let mut parsed: Vec<ParsedFile> = Vec::new();
    let mut warnings: Vec<FileWarning> = Vec::new();

    for file in files {
        let result = read_rows(&file.filename, &file.bytes)
            .and_then(|rows| parse_rows(&file.filename, &rows));

        match result {
            Ok(parsed_file) => parsed.push(parsed_file),
            Err(e) => {
                warn!("Skipping {}: {}", file.filename, e);
                warnings.push(FileWarning {
                    filename: file.filename.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let groups = combine_files(&parsed);
    let (resolved, mut charts) = resolve_kpis(&groups);

    charts.sources = parsed
        .iter()
        .map(|p| SourceFileMeta {
            filename: p.filename.clone(),
            storage_key: None,
            dataset_type: p.dataset_type,
            row_count: p.row_count,
        })
        .collect();

    info!(
        "Analyzed {} files ({} skipped): {} dataset groups",
        parsed.len(),
        warnings.len(),
        groups.len()
    );

    Analysis {
        files: parsed,
        groups,
        resolved,
        charts,
        warnings,
    }
}

/// Run the full pipeline and, when a backend is configured, request the
/// narrative. A missing or failing backend degrades the narrative only.
pub async fn analyze_with_narrative(
    files: &[UploadedFile],
    ai: Option<&AIClient>,
    restaurant_name: &str,
    period_label: Option<&str>,
) -> (Analysis, NarrativeResult) {
    let analysis = analyze_files(files);

    let narrative = match ai {
        Some(client) => {
            narrative::generate(
                client,
                restaurant_name,
                period_label,
                &analysis.resolved,
                &analysis.charts.category_mix,
            )
            .await
        }
        None => NarrativeResult::unavailable(),
    };

    (analysis, narrative)
}

/// Report type label: the dataset type contributing the most rows.
///
/// Ties resolve to the earliest group in encounter order.
pub fn infer_report_type(groups: &[CombinedGroup]) -> String {
    let mut best: Option<&CombinedGroup> = None;
    for group in groups {
        if best.map_or(true, |b| group.row_count > b.row_count) {
            best = Some(group);
        }
    }

    best.map(|g| g.dataset_type.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
