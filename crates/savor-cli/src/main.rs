//! Savor CLI - Restaurant sales and labor analyzer
//!
//! Usage:
//!   savor init                     Initialize database
//!   savor analyze FILE...          Analyze spreadsheets into KPIs
//!   savor reports                  List stored reports
//!   savor serve --port 3000        Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Analyze {
            files,
            restaurant,
            period,
            report_type,
            json,
            save,
        } => {
            commands::cmd_analyze(
                &cli.db,
                &files,
                &restaurant,
                period.as_deref(),
                report_type.as_deref(),
                json,
                save,
            )
            .await
        }
        Commands::Reports { limit } => commands::cmd_reports(&cli.db, limit),
        Commands::Serve {
            port,
            host,
            no_auth,
            files_dir,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, &files_dir).await,
    }
}
