//! Generation plan: immutable provider selections and estimates for one request.

use crate::config::SelectionConfig;
use crate::error::ApiError;
use crate::job::JobId;
use crate::provider::{
    features, EnrichedPrompt, PromptEnricher, ProviderCategory, ProviderRecord, ProviderRegistry,
    QualityTier, SelectionCriteria,
};
use crate::generation::request::GenerationRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

const VIDEO_WEIGHT: f64 = 0.6;
const VOICE_WEIGHT: f64 = 0.3;
const LANGUAGE_WEIGHT: f64 = 0.1;

/// The provider chosen for one category and the chain it leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSelection {
    pub name: String,
    pub quality_tier: QualityTier,
    pub quality_score: f64,
    pub cost_per_unit: f64,
    pub supports_audio: bool,
    /// Fallback order with the selected provider first.
    pub chain: Vec<String>,
}

impl ProviderSelection {
    fn new(record: &ProviderRecord, chain: Vec<String>) -> Self {
        Self {
            name: record.name.clone(),
            quality_tier: record.quality_tier,
            quality_score: record.quality_score,
            cost_per_unit: record.cost_per_unit,
            supports_audio: record.supports_audio(),
            chain,
        }
    }
}

/// Everything the executor needs to run one job. Built once, never mutated,
/// consumed by value when the job runs.
#[derive(Debug, Serialize)]
pub struct GenerationPlan {
    job_id: JobId,
    request: GenerationRequest,
    enriched_prompt: EnrichedPrompt,
    video: ProviderSelection,
    voice: ProviderSelection,
    language: Option<ProviderSelection>,
    estimated_video_cost: f64,
    estimated_voice_cost: f64,
    estimated_total_cost: f64,
    expected_quality_score: f64,
    needs_audio_merge: bool,
    created_at: DateTime<Utc>,
}

impl GenerationPlan {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn enriched_prompt(&self) -> &EnrichedPrompt {
        &self.enriched_prompt
    }

    pub fn video(&self) -> &ProviderSelection {
        &self.video
    }

    pub fn voice(&self) -> &ProviderSelection {
        &self.voice
    }

    /// `None` when detection was not requested or no language provider qualified.
    pub fn language(&self) -> Option<&ProviderSelection> {
        self.language.as_ref()
    }

    pub fn estimated_video_cost(&self) -> f64 {
        self.estimated_video_cost
    }

    pub fn estimated_voice_cost(&self) -> f64 {
        self.estimated_voice_cost
    }

    pub fn estimated_total_cost(&self) -> f64 {
        self.estimated_total_cost
    }

    pub fn expected_quality_score(&self) -> f64 {
        self.expected_quality_score
    }

    pub fn needs_audio_merge(&self) -> bool {
        self.needs_audio_merge
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ask the enricher for a better video prompt. The result always contains the
/// literal prompt; an enricher failure degrades to the literal prompt alone.
pub async fn enrich_prompt(
    enricher: &dyn PromptEnricher,
    request: &GenerationRequest,
) -> EnrichedPrompt {
    let prompt = request.prompt.as_str();
    match enricher
        .enrich(
            prompt,
            f64::from(request.video_duration),
            request.video_style.as_deref(),
        )
        .await
    {
        Ok(mut enriched) => {
            if enriched.enriched_text.trim().is_empty() {
                enriched.enriched_text = prompt.to_string();
            } else if !enriched.enriched_text.contains(prompt) {
                enriched.enriched_text = format!("{} {}", prompt, enriched.enriched_text);
            }
            debug!(quality_score = enriched.quality_score, "prompt_enriched");
            enriched
        }
        Err(err) => {
            warn!(error = %err, "prompt_enrichment_failed_using_literal");
            EnrichedPrompt::literal(prompt)
        }
    }
}

/// Selects providers and computes estimates against the registry's current state.
pub struct PlanBuilder<'a> {
    registry: &'a ProviderRegistry,
    selection: &'a SelectionConfig,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(registry: &'a ProviderRegistry, selection: &'a SelectionConfig) -> Self {
        Self {
            registry,
            selection,
        }
    }

    /// Build a plan or fail without side effects when a mandatory category
    /// (video, voice) has no qualifying provider.
    pub fn build(
        &self,
        request: GenerationRequest,
        enriched_prompt: EnrichedPrompt,
    ) -> Result<GenerationPlan, ApiError> {
        let request = request.validated()?;

        let video = self.select_video(&request)?;
        let voice = self.select_voice(&request)?;
        let language = if request.detect_language {
            self.select_language()
        } else {
            None
        };

        let video_chain = self
            .registry
            .fallback_chain(ProviderCategory::Video, Some(&video.name));
        let voice_chain = self
            .registry
            .fallback_chain(ProviderCategory::Voice, Some(&voice.name));
        let language = language.map(|record| {
            let chain = self
                .registry
                .fallback_chain(ProviderCategory::Language, Some(&record.name));
            ProviderSelection::new(&record, chain)
        });

        let text_chars = request.text_chars();
        let estimated_video_cost = video.estimated_cost(
            ProviderCategory::Video.billed_quantity(request.video_duration, text_chars),
        );
        let estimated_voice_cost = voice.estimated_cost(
            ProviderCategory::Voice.billed_quantity(request.video_duration, text_chars),
        );
        let estimated_total_cost = estimated_video_cost + estimated_voice_cost;

        let language_quality = language
            .as_ref()
            .map_or(self.selection.skipped_language_quality, |l| l.quality_score);
        let expected_quality_score = VIDEO_WEIGHT * video.quality_score
            + VOICE_WEIGHT * voice.quality_score
            + LANGUAGE_WEIGHT * language_quality;

        let needs_audio_merge = !video.supports_audio();

        let plan = GenerationPlan {
            job_id: JobId::generate(),
            video: ProviderSelection::new(&video, video_chain),
            voice: ProviderSelection::new(&voice, voice_chain),
            language,
            enriched_prompt,
            request,
            estimated_video_cost,
            estimated_voice_cost,
            estimated_total_cost,
            expected_quality_score,
            needs_audio_merge,
            created_at: Utc::now(),
        };

        info!(
            job_id = %plan.job_id,
            video = %plan.video.name,
            voice = %plan.voice.name,
            language = plan.language.as_ref().map(|l| l.name.as_str()).unwrap_or("skipped"),
            estimated_total_cost = plan.estimated_total_cost,
            expected_quality_score = plan.expected_quality_score,
            needs_audio_merge = plan.needs_audio_merge,
            "plan_created"
        );
        Ok(plan)
    }

    /// Prefer native audio when no narration voice was supplied, so the merge
    /// stage can be skipped; otherwise retry at the relaxed floor.
    fn select_video(&self, request: &GenerationRequest) -> Result<ProviderRecord, ApiError> {
        let mut strict = SelectionCriteria::new().min_quality(self.selection.video_min_quality);
        let mut relaxed =
            SelectionCriteria::new().min_quality(self.selection.video_relaxed_min_quality);
        if request.voice_id.is_none() {
            strict = strict.prefer(features::NATIVE_AUDIO);
        }
        if self.selection.require_duration_support {
            strict = strict.min_duration(request.video_duration);
            relaxed = relaxed.min_duration(request.video_duration);
        }

        self.registry
            .best(ProviderCategory::Video, &strict)
            .or_else(|| self.registry.best(ProviderCategory::Video, &relaxed))
            .ok_or(ApiError::NoProviderAvailable(ProviderCategory::Video))
    }

    /// Prefer cloning-capable voices when the request names a cloned voice.
    fn select_voice(&self, request: &GenerationRequest) -> Result<ProviderRecord, ApiError> {
        let mut strict = SelectionCriteria::new().min_quality(self.selection.voice_min_quality);
        if request.voice_id.is_some() {
            strict = strict.prefer(features::VOICE_CLONING);
        }

        self.registry
            .best(ProviderCategory::Voice, &strict)
            .or_else(|| {
                self.registry
                    .best(ProviderCategory::Voice, &SelectionCriteria::new())
            })
            .ok_or(ApiError::NoProviderAvailable(ProviderCategory::Voice))
    }

    fn select_language(&self) -> Option<ProviderRecord> {
        let strict = SelectionCriteria::new().min_quality(self.selection.language_min_quality);
        let selected = self
            .registry
            .best(ProviderCategory::Language, &strict)
            .or_else(|| {
                self.registry
                    .best(ProviderCategory::Language, &SelectionCriteria::new())
            });
        if selected.is_none() {
            debug!("no_language_provider_detection_skipped");
        }
        selected
    }
}
