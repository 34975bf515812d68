//! Provider command presentation: list, show, chains, stats, compare text/json.

use crate::cli::presentation::shared::{is_json, money, table, tier_label, to_json, yes_no};
use crate::error::ApiError;
use crate::provider::catalog::tier_description;
use crate::provider::commands::{
    ProviderChainsResult, ProviderComparison, ProviderListResult, ProviderShowResult,
    ProviderStatsResult,
};

pub fn format_provider_list(result: &ProviderListResult, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(&serde_json::json!({
            "providers": result.providers,
            "total": result.providers.len(),
        }));
    }
    if result.providers.is_empty() {
        return Ok("No providers found.".to_string());
    }
    let mut t = table(vec![
        "Name", "Category", "Tier", "Quality", "Cost/unit", "Max secs", "Available", "Features",
    ]);
    for record in &result.providers {
        t.add_row(vec![
            record.name.clone(),
            record.category.to_string(),
            tier_label(record.quality_tier),
            format!("{:.1}", record.quality_score),
            format!("{}", record.cost_per_unit),
            record
                .max_duration
                .map_or_else(|| "-".to_string(), |secs| secs.to_string()),
            yes_no(record.is_available),
            record.features.iter().cloned().collect::<Vec<_>>().join(", "),
        ]);
    }
    Ok(format!("{}\nTotal: {} provider(s)", t, result.providers.len()))
}

pub fn format_provider_show(result: &ProviderShowResult, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    let record = &result.record;
    let mut out = format!("Provider: {}\n", record.name);
    out.push_str(&format!("Category: {}\n", record.category));
    out.push_str(&format!(
        "Tier: {} ({})\n",
        tier_label(record.quality_tier),
        tier_description(record.quality_tier)
    ));
    out.push_str(&format!("Quality score: {:.1}\n", record.quality_score));
    out.push_str(&format!("Cost per unit: {}\n", record.cost_per_unit));
    if let Some(max) = record.max_duration {
        out.push_str(&format!("Max duration: {}s\n", max));
    }
    if !record.features.is_empty() {
        let features: Vec<&str> = record.features.iter().map(String::as_str).collect();
        out.push_str(&format!("Features: {}\n", features.join(", ")));
    }
    if !record.languages.is_empty() {
        out.push_str(&format!("Languages: {}\n", record.languages.join(", ")));
    }
    match result.chain_position {
        Some(position) => out.push_str(&format!("Fallback position: {}\n", position)),
        None => out.push_str("Fallback position: -\n"),
    }

    let health = &result.health;
    out.push_str("\nHealth:\n");
    out.push_str(&format!("  available: {}\n", yes_no(health.is_available)));
    out.push_str(&format!("  success rate: {:.1}%\n", health.success_rate * 100.0));
    if let Some(latency) = health.avg_latency_ms {
        out.push_str(&format!("  avg latency: {:.0} ms\n", latency));
    }
    if let Some(checked) = health.last_checked {
        out.push_str(&format!("  last checked: {}\n", checked.to_rfc3339()));
    }
    out.push_str(&format!("  requests: {}\n", result.usage.total_requests));
    out.push_str(&format!("  total cost: {}", money(result.usage.total_cost)));
    Ok(out)
}

pub fn format_provider_chains(result: &ProviderChainsResult, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    let mut out = String::from("Fallback chains:\n");
    for (category, chain) in &result.chains {
        let line = if chain.is_empty() {
            "(none)".to_string()
        } else {
            chain.join(" -> ")
        };
        out.push_str(&format!("  {:<9} {}\n", category.as_str(), line));
    }
    Ok(out.trim_end().to_string())
}

pub fn format_provider_stats(result: &ProviderStatsResult, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    if result.stats.is_empty() {
        return Ok("No usage recorded.".to_string());
    }
    let mut t = table(vec!["Provider", "Requests", "Succeeded", "Success rate", "Avg latency", "Total cost"]);
    for (name, stats) in &result.stats {
        t.add_row(vec![
            name.clone(),
            stats.total_requests.to_string(),
            stats.successful_requests.to_string(),
            format!("{:.1}%", stats.success_rate() * 100.0),
            format!("{:.0} ms", stats.avg_latency_ms),
            money(stats.total_cost),
        ]);
    }
    Ok(t.to_string())
}

pub fn format_provider_comparison(result: &ProviderComparison, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    let mut out = String::new();
    if !result.entries.is_empty() {
        let mut t = table(vec!["Name", "Category", "Tier", "Quality", "Est. cost", "Audio", "Success rate"]);
        for entry in &result.entries {
            t.add_row(vec![
                entry.name.clone(),
                entry.category.to_string(),
                tier_label(entry.quality_tier),
                format!("{:.1}", entry.quality_score),
                money(entry.estimated_cost),
                yes_no(entry.supports_audio),
                format!("{:.1}%", entry.success_rate * 100.0),
            ]);
        }
        out.push_str(&t.to_string());
        out.push('\n');
    }
    if let Some(best) = &result.best_quality {
        out.push_str(&format!("Best quality: {}\n", best));
    }
    if let Some(best) = &result.best_value {
        out.push_str(&format!("Best value: {}\n", best));
    }
    if !result.unknown.is_empty() {
        out.push_str(&format!("Unknown providers: {}\n", result.unknown.join(", ")));
    }
    if out.is_empty() {
        out.push_str("Nothing to compare.");
    }
    Ok(out.trim_end().to_string())
}
