//! Analyze command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use savor_core::ai::{AIBackend, AIClient};
use savor_core::analyze::{analyze_with_narrative, infer_report_type, Analysis, UploadedFile};
use savor_core::models::{NarrativeResult, NewReport};

use super::open_db;

pub async fn cmd_analyze(
    db_path: &Path,
    files: &[PathBuf],
    restaurant: &str,
    period: Option<&str>,
    report_type: Option<&str>,
    json: bool,
    save: bool,
) -> Result<()> {
    let mut uploads = Vec::new();
    for path in files {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid filename: {}", path.display()))?
            .to_string();
        uploads.push(UploadedFile { filename, bytes });
    }

    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        println!("🤖 Narrative backend: {} ({})", client.host(), client.model());
    }

    let (analysis, narrative) =
        analyze_with_narrative(&uploads, ai.as_ref(), restaurant, period).await;

    if analysis.files.is_empty() {
        for warning in &analysis.warnings {
            eprintln!("   ⚠️  {}: {}", warning.filename, warning.message);
        }
        anyhow::bail!("No readable files in the batch");
    }

    let report_type = report_type
        .map(str::to_string)
        .unwrap_or_else(|| infer_report_type(&analysis.groups));

    if json {
        print_json(&analysis, &narrative, &report_type)?;
    } else {
        print_summary(&analysis, &narrative, restaurant, &report_type);
    }

    if save {
        let db = open_db(db_path)?;
        let report = db.insert_report(&NewReport {
            restaurant_name: restaurant.to_string(),
            report_type,
            period_label: period.map(str::to_string),
            primary_file_key: None,
            kpis: analysis.resolved.kpis.clone(),
            available: analysis.resolved.available,
            narrative,
            charts: analysis.charts.clone(),
            owner_email: "local-cli".to_string(),
        })?;
        println!();
        println!("💾 Saved report {}", report.id);
    }

    Ok(())
}

fn print_json(analysis: &Analysis, narrative: &NarrativeResult, report_type: &str) -> Result<()> {
    let value = serde_json::json!({
        "report_type": report_type,
        "kpis": analysis.resolved.kpis,
        "available": analysis.resolved.available,
        "charts": analysis.charts,
        "narrative": narrative,
        "warnings": analysis.warnings,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_summary(
    analysis: &Analysis,
    narrative: &NarrativeResult,
    restaurant: &str,
    report_type: &str,
) {
    println!();
    println!("📊 {} ({})", restaurant, report_type);

    for source in &analysis.charts.sources {
        println!(
            "   {} -> {} ({} rows)",
            source.filename, source.dataset_type, source.row_count
        );
    }
    for warning in &analysis.warnings {
        println!("   ⚠️  {}: {}", warning.filename, warning.message);
    }
    println!();

    let kpis = &analysis.resolved.kpis;
    println!("   Net sales:     {}", fmt_money(kpis.net_sales));
    println!(
        "   Guests:        {}",
        kpis.guests
            .map(|g| g.to_string())
            .unwrap_or_else(|| "unavailable".to_string())
    );
    println!("   PPA:           {}", fmt_money(kpis.ppa));
    println!("   Tip %:         {}", fmt_percent(kpis.tip_percent));
    println!("   Labor %:       {}", fmt_percent(kpis.labor_percent));

    if !analysis.charts.category_mix.is_empty() {
        println!();
        println!("   Category mix:");
        for slice in &analysis.charts.category_mix {
            println!("     {:<20} ${:.2}", slice.category, slice.sales);
        }
    }

    if narrative.available {
        println!();
        for line in &narrative.summary {
            println!("   {}", line);
        }
        for insight in &narrative.insights {
            println!("   - {}", insight);
        }
        for action in &narrative.actions {
            println!("   → {}", action);
        }
    }
}

fn fmt_money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "unavailable".to_string())
}

fn fmt_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| "unavailable".to_string())
}
