//! Narrative request building and response parsing
//!
//! Renders the resolved KPIs and category mix into a bounded prompt for
//! the narrative-generation backend and splits its plain-text reply into
//! summary, insights, and actions. A failed or empty completion degrades
//! to an explicit "analysis unavailable" result rather than failing the
//! upload.

use tracing::warn;

use crate::ai::{AIBackend, AIClient};
use crate::models::{CategorySlice, NarrativeResult, ResolvedKpis};

/// System instruction sent with every narrative request
const SYSTEM_INSTRUCTION: &str = "You are a restaurant operations analyst. \
Given sales and labor figures, reply in plain text: a short summary of up \
to three lines, then up to three insight bullets and up to three \
recommended-action bullets, each starting with '-'. Do not invent numbers \
that were not provided.";

/// Category-mix entries included in the prompt, keeping it bounded
const PROMPT_CATEGORY_LIMIT: usize = 10;

/// Build the user prompt from the resolved KPIs.
///
/// Only KPIs marked available are listed; an unavailable metric is
/// omitted entirely rather than sent as a misleading zero.
pub fn build_prompt(
    restaurant_name: &str,
    period_label: Option<&str>,
    resolved: &ResolvedKpis,
    category_mix: &[CategorySlice],
) -> String {
    let mut lines = vec![format!("Restaurant: {}", restaurant_name)];
    if let Some(period) = period_label {
        lines.push(format!("Period: {}", period));
    }

    if let Some(net) = resolved.kpis.net_sales {
        lines.push(format!("Net sales: ${:.2}", net));
    }
    if let Some(guests) = resolved.kpis.guests {
        lines.push(format!("Guests: {}", guests));
    }
    if let Some(ppa) = resolved.kpis.ppa {
        lines.push(format!("Per-person average: ${:.2}", ppa));
    }
    if let Some(tip) = resolved.kpis.tip_percent {
        lines.push(format!("Tip percentage: {:.2}%", tip));
    }
    if let Some(labor) = resolved.kpis.labor_percent {
        lines.push(format!("Labor percentage: {:.2}%", labor));
    }

    if !category_mix.is_empty() {
        lines.push("Category mix:".to_string());
        for slice in category_mix.iter().take(PROMPT_CATEGORY_LIMIT) {
            lines.push(format!("  {}: ${:.2}", slice.category, slice.sales));
        }
    }

    lines.join("\n")
}

/// Split a plain-text completion into summary, insights, and actions.
///
/// First 3 non-empty lines become the summary; bullet-marked lines
/// (`-` or `•`) become insights (first 3) and actions (next 3).
pub fn parse_response(text: &str) -> NarrativeResult {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return NarrativeResult::unavailable();
    }

    let summary: Vec<String> = lines.iter().take(3).map(|s| s.to_string()).collect();

    let bullets: Vec<String> = lines
        .iter()
        .filter(|line| line.starts_with('-') || line.starts_with('•'))
        .map(|line| line.trim_start_matches(['-', '•']).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let insights: Vec<String> = bullets.iter().take(3).cloned().collect();
    let actions: Vec<String> = bullets.iter().skip(3).take(3).cloned().collect();

    NarrativeResult {
        summary,
        insights,
        actions,
        available: true,
    }
}

/// Request a narrative for the resolved KPIs.
///
/// Recovers locally from backend failure: the KPIs and stored file still
/// persist, only the narrative degrades.
pub async fn generate(
    ai: &AIClient,
    restaurant_name: &str,
    period_label: Option<&str>,
    resolved: &ResolvedKpis,
    category_mix: &[CategorySlice],
) -> NarrativeResult {
    let prompt = build_prompt(restaurant_name, period_label, resolved, category_mix);

    match ai.generate(SYSTEM_INSTRUCTION, &prompt).await {
        Ok(text) => parse_response(&text),
        Err(e) => {
            warn!("Narrative generation failed: {}", e);
            NarrativeResult::unavailable()
        }
    }
}
