//! Report listing command implementation

use std::path::Path;

use anyhow::Result;

use super::{open_db, truncate};

pub fn cmd_reports(db_path: &Path, limit: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let reports = db.list_reports(None, limit)?;

    if reports.is_empty() {
        println!("No reports stored yet. Run `savor analyze ... --save` first.");
        return Ok(());
    }

    println!(
        "{:<5} {:<24} {:<16} {:<14} {:<12} {}",
        "ID", "Restaurant", "Type", "Net Sales", "Guests", "Created"
    );
    for report in &reports {
        println!(
            "{:<5} {:<24} {:<16} {:<14} {:<12} {}",
            report.id,
            truncate(&report.restaurant_name, 24),
            report.report_type,
            report
                .kpis
                .net_sales
                .map(|v| format!("${:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
            report
                .kpis
                .guests
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string()),
            report.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}
