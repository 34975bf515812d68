//! Read-only provider recommendations for a request.

use crate::config::SelectionConfig;
use crate::error::ApiError;
use crate::generation::plan::PlanBuilder;
use crate::generation::request::GenerationRequest;
use crate::provider::commands::round_cents;
use crate::provider::registry::ListFilter;
use crate::provider::{
    features, EnrichedPrompt, ProviderCategory, ProviderRecord, ProviderRegistry, QualityTier,
};
use serde::{Deserialize, Serialize};

/// One ranked candidate with its estimated cost for the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEstimate {
    pub name: String,
    pub quality_tier: QualityTier,
    pub quality_score: f64,
    /// Rounded to cents.
    pub estimated_cost: f64,
    pub max_duration: Option<u32>,
    pub covers_duration: bool,
    pub supports_audio: bool,
    pub supports_cloning: bool,
}

/// What the plan builder would pick right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCombination {
    pub video: String,
    pub voice: String,
    pub language: Option<String>,
    pub total_estimated_cost: f64,
    pub expected_quality_score: f64,
    pub needs_audio_merge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub video: Vec<CandidateEstimate>,
    pub voice: Vec<CandidateEstimate>,
    /// `None` when a mandatory category has no qualifying provider.
    pub best: Option<BestCombination>,
}

/// Rank the available video and voice providers for `request` without creating
/// a job or touching provider state.
pub fn recommend(
    registry: &ProviderRegistry,
    selection: &SelectionConfig,
    request: &GenerationRequest,
) -> Result<Recommendation, ApiError> {
    let request = request.clone().validated()?;
    let text_chars = request.text_chars();

    let candidates = |category: ProviderCategory| -> Vec<CandidateEstimate> {
        let filter = ListFilter {
            category: Some(category),
            tier: None,
            available_only: true,
        };
        let quantity = category.billed_quantity(request.video_duration, text_chars);
        registry
            .list(&filter)
            .iter()
            .take(selection.recommendation_limit)
            .map(|record| estimate(record, quantity, request.video_duration))
            .collect()
    };
    let video = candidates(ProviderCategory::Video);
    let voice = candidates(ProviderCategory::Voice);

    let enriched = EnrichedPrompt::literal(&request.prompt);
    let best = PlanBuilder::new(registry, selection)
        .build(request, enriched)
        .ok()
        .map(|plan| BestCombination {
            video: plan.video().name.clone(),
            voice: plan.voice().name.clone(),
            language: plan.language().map(|l| l.name.clone()),
            total_estimated_cost: round_cents(plan.estimated_total_cost()),
            expected_quality_score: plan.expected_quality_score(),
            needs_audio_merge: plan.needs_audio_merge(),
        });

    Ok(Recommendation { video, voice, best })
}

fn estimate(record: &ProviderRecord, quantity: f64, duration_secs: u32) -> CandidateEstimate {
    CandidateEstimate {
        name: record.name.clone(),
        quality_tier: record.quality_tier,
        quality_score: record.quality_score,
        estimated_cost: round_cents(record.estimated_cost(quantity)),
        max_duration: record.max_duration,
        covers_duration: record.covers_duration(duration_secs),
        supports_audio: record.supports_audio(),
        supports_cloning: record.supports(features::VOICE_CLONING),
    }
}
