//! Plan, recommendation and use-case presentation.

use crate::cli::presentation::shared::{is_json, money, table, tier_label, to_json, yes_no};
use crate::error::ApiError;
use crate::generation::{CandidateEstimate, GenerationPlan, ProviderSelection, Recommendation};
use crate::provider::catalog::UseCaseRecommendation;
use owo_colors::OwoColorize;

pub fn format_plan(plan: &GenerationPlan, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(plan);
    }
    let request = plan.request();
    let mut out = format!("Plan {}\n", plan.job_id().bold());
    out.push_str(&format!(
        "Duration: {}s  Aspect: {}  Resolution: {}\n",
        request.video_duration, request.aspect_ratio, request.resolution
    ));
    out.push_str(&format!("Prompt: {}\n\n", plan.enriched_prompt().enriched_text));

    let mut t = table(vec!["Stage", "Provider", "Tier", "Quality", "Fallback chain"]);
    let mut row = |stage: &str, selection: &ProviderSelection| {
        t.add_row(vec![
            stage.to_string(),
            selection.name.clone(),
            tier_label(selection.quality_tier),
            format!("{:.1}", selection.quality_score),
            selection.chain.join(" -> "),
        ]);
    };
    if let Some(language) = plan.language() {
        row("language", language);
    }
    row("voice", plan.voice());
    row("video", plan.video());
    out.push_str(&t.to_string());

    out.push_str(&format!(
        "\n\nEstimated cost: {} (video {}, voice {})\n",
        money(plan.estimated_total_cost()),
        money(plan.estimated_video_cost()),
        money(plan.estimated_voice_cost())
    ));
    out.push_str(&format!("Expected quality: {:.1}\n", plan.expected_quality_score()));
    out.push_str(&format!("Audio merge needed: {}", yes_no(plan.needs_audio_merge())));
    Ok(out)
}

fn candidate_table(title: &str, candidates: &[CandidateEstimate]) -> String {
    if candidates.is_empty() {
        return format!("{}: none available", title);
    }
    let mut t = table(vec!["Name", "Tier", "Quality", "Est. cost", "Covers duration", "Audio", "Cloning"]);
    for candidate in candidates {
        t.add_row(vec![
            candidate.name.clone(),
            tier_label(candidate.quality_tier),
            format!("{:.1}", candidate.quality_score),
            money(candidate.estimated_cost),
            yes_no(candidate.covers_duration),
            yes_no(candidate.supports_audio),
            yes_no(candidate.supports_cloning),
        ]);
    }
    format!("{}:\n{}", title, t)
}

pub fn format_recommendation(result: &Recommendation, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    let mut out = candidate_table("Video providers", &result.video);
    out.push_str("\n\n");
    out.push_str(&candidate_table("Voice providers", &result.voice));
    out.push_str("\n\n");
    match &result.best {
        Some(best) => {
            out.push_str(&format!(
                "Best combination: {} + {}",
                best.video.green(),
                best.voice.green()
            ));
            if let Some(language) = &best.language {
                out.push_str(&format!(" (language: {})", language));
            }
            out.push_str(&format!(
                "\nEstimated cost: {}  Expected quality: {:.1}  Audio merge: {}",
                money(best.total_estimated_cost),
                best.expected_quality_score,
                yes_no(best.needs_audio_merge)
            ));
        }
        None => out.push_str(&"No complete provider combination is available.".red().to_string()),
    }
    Ok(out)
}

pub fn format_use_case(result: &UseCaseRecommendation, format: &str) -> Result<String, ApiError> {
    if is_json(format) {
        return to_json(result);
    }
    Ok(format!(
        "Use case: {}\nRecommended: {}\nAlternative: {}\nWhy: {}",
        result.use_case, result.provider, result.alternative, result.reason
    ))
}
