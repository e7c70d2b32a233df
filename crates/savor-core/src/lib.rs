//! Savor Core Library
//!
//! Shared functionality for the Savor restaurant analytics tool:
//! - Spreadsheet row extraction (CSV/XLSX/XLS)
//! - Header-row detection and column-role classification
//! - Per-file metric aggregation and dataset typing
//! - Multi-file combination and KPI resolution
//! - Narrative analysis via pluggable AI backends (Ollama, mock)
//! - Report persistence and content-addressed blob storage

pub mod ai;
pub mod analyze;
pub mod cell;
pub mod classify;
pub mod combine;
pub mod db;
pub mod error;
pub mod models;
pub mod narrative;
pub mod parse;
pub mod resolve;
pub mod sheet;
pub mod store;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend};
pub use analyze::{
    analyze_files, analyze_with_narrative, infer_report_type, Analysis, FileWarning, UploadedFile,
};
pub use db::Database;
pub use error::{Error, Result};
pub use store::{BlobStore, LocalStore};
