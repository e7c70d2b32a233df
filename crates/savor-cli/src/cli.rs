//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Savor - Restaurant sales and labor spreadsheet analyzer
#[derive(Parser)]
#[command(name = "savor")]
#[command(about = "Analyze restaurant sales/labor spreadsheets into KPIs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "savor.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Analyze spreadsheet files into KPIs
    Analyze {
        /// Spreadsheet files to analyze (.csv, .xlsx, .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Restaurant name for the report
        #[arg(short, long, default_value = "Unnamed Restaurant")]
        restaurant: String,

        /// Period label, e.g. "November week 1"
        #[arg(short, long)]
        period: Option<String>,

        /// Declared report type (inferred from the data if not specified)
        #[arg(long)]
        report_type: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Persist the report to the database
        #[arg(long)]
        save: bool,
    },

    /// List stored reports
    Reports {
        /// Number of reports to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default the server requires the identity provider
        /// header on every request.
        #[arg(long)]
        no_auth: bool,

        /// Directory for stored upload files
        #[arg(long, default_value = "files")]
        files_dir: PathBuf,
    },
}
