//! Request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use savor_core::analyze::{analyze_with_narrative, infer_report_type, FileWarning, UploadedFile};
use savor_core::models::{NewReport, Report};
use savor_core::sheet::FileFormat;
use savor_core::store::BlobStore;
use savor_core::Error as CoreError;

use crate::{get_user_email, AppError, AppState, MAX_UPLOAD_SIZE};

/// Maximum number of reports returned by a list call
const MAX_LIST_LIMIT: i64 = 200;

/// Health check payload
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Response for a created analysis: the stored report plus any per-file
/// warnings from skipped files
#[derive(Serialize)]
pub struct AnalysisResponse {
    pub report: Report,
    pub warnings: Vec<FileWarning>,
}

/// POST /api/analyses - Analyze uploaded spreadsheets and store a report
///
/// Expects multipart form with:
/// - restaurant_name: restaurant display name (required)
/// - report_type: declared report type (optional, inferred if absent)
/// - period: period label, e.g. "November week 1" (optional)
/// - files: one or more spreadsheet files (.csv/.xlsx/.xls, max 10MB each)
pub async fn create_analysis(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut restaurant_name: Option<String> = None;
    let mut report_type: Option<String> = None;
    let mut period: Option<String> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "restaurant_name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read restaurant_name"))?;
                if !value.trim().is_empty() {
                    restaurant_name = Some(value.trim().to_string());
                }
            }
            "report_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read report_type"))?;
                if !value.trim().is_empty() {
                    report_type = Some(value.trim().to_string());
                }
            }
            "period" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read period"))?;
                if !value.trim().is_empty() {
                    period = Some(value.trim().to_string());
                }
            }
            "files" | "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| AppError::bad_request("File field is missing a filename"))?;

                if FileFormat::from_filename(&filename).is_none() {
                    return Err(AppError::bad_request(&format!(
                        "Unsupported file type: {} (accepted: .csv, .xlsx, .xls)",
                        filename
                    )));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;

                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File {} too large. Maximum size is {} MB",
                        filename,
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }

                files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let restaurant_name =
        restaurant_name.ok_or_else(|| AppError::bad_request("Missing restaurant_name field"))?;
    if files.is_empty() {
        return Err(AppError::bad_request("No files uploaded"));
    }

    create_analysis_core(&state, &headers, restaurant_name, report_type, period, files).await
}

/// Core analysis logic - separated from multipart form parsing
pub async fn create_analysis_core(
    state: &AppState,
    headers: &HeaderMap,
    restaurant_name: String,
    report_type: Option<String>,
    period: Option<String>,
    files: Vec<UploadedFile>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let owner_email = get_user_email(headers);

    let (mut analysis, narrative) = analyze_with_narrative(
        &files,
        state.ai.as_ref(),
        &restaurant_name,
        period.as_deref(),
    )
    .await;

    if analysis.files.is_empty() {
        let detail = analysis
            .warnings
            .iter()
            .map(|w| w.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::bad_request(&format!(
            "No readable files in upload: {}",
            detail
        )));
    }

    // Store the bytes of every file that parsed and attach the storage
    // references to the per-file source metadata; skipped files are not
    // stored
    for file in &files {
        if !analysis
            .charts
            .sources
            .iter()
            .any(|s| s.filename == file.filename)
        {
            continue;
        }
        let key = state.store.put(&file.filename, &file.bytes)?;
        for source in analysis
            .charts
            .sources
            .iter_mut()
            .filter(|s| s.filename == file.filename)
        {
            source.storage_key = Some(key.clone());
        }
    }

    let primary_file_key = analysis
        .charts
        .sources
        .first()
        .and_then(|s| s.storage_key.clone());
    let report_type = report_type.unwrap_or_else(|| infer_report_type(&analysis.groups));

    let report = state.db.insert_report(&NewReport {
        restaurant_name,
        report_type,
        period_label: period,
        primary_file_key,
        kpis: analysis.resolved.kpis.clone(),
        available: analysis.resolved.available,
        narrative,
        charts: analysis.charts.clone(),
        owner_email,
    })?;

    info!(
        "Created report {} ({} files, {} skipped)",
        report.id,
        analysis.files.len(),
        analysis.warnings.len()
    );

    Ok(Json(AnalysisResponse {
        report,
        warnings: analysis.warnings,
    }))
}

/// Query parameters for listing reports
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub limit: Option<i64>,
    /// Restrict to the caller's own reports
    pub mine: Option<bool>,
}

/// GET /api/reports - List stored reports, newest first
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListReportsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Report>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_LIST_LIMIT);

    let owner = if params.mine.unwrap_or(false) {
        Some(get_user_email(&headers))
    } else {
        None
    };

    let reports = state.db.list_reports(owner.as_deref(), limit)?;
    Ok(Json(reports))
}

/// GET /api/reports/:id - Fetch one report
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Report>, AppError> {
    match state.db.get_report(id) {
        Ok(report) => Ok(Json(report)),
        Err(CoreError::NotFound(_)) => Err(AppError::not_found("Report not found")),
        Err(e) => Err(e.into()),
    }
}
