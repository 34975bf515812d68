//! Stage pipeline for one job.
//!
//! Walks a [`GenerationPlan`] through language detection, speech, video and merge.
//! Every provider stage goes through the [`FallbackExecutor`] over the chain the
//! plan pinned; the job is written only through the [`JobLease`] it was handed.

use crate::error::{ApiError, ProviderError};
use crate::generation::plan::{GenerationPlan, ProviderSelection};
use crate::job::{GenerationResult, JobId, JobLease, JobStatus, JobUpdate, ResultProviders, Stage};
use crate::provider::{
    FallbackExecutor, GeneratedVideo, LanguageDetection, MediaMerger, ProviderCategory,
    ProviderClients, ProviderRegistry, SynthesizedSpeech, VideoSpec,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs plans against the registered provider clients.
#[derive(Clone)]
pub struct JobExecutor {
    clients: Arc<ProviderClients>,
    merger: Arc<dyn MediaMerger>,
    fallback: FallbackExecutor,
}

/// Stage outputs gathered while the pipeline runs.
#[derive(Default)]
struct Delivered {
    language: Option<(String, LanguageDetection)>,
    voice: Option<String>,
    video: Option<String>,
    total_cost: f64,
    used_fallback: bool,
}

impl Delivered {
    fn note(&mut self, planned: &ProviderSelection, provider: &str, cost: f64) {
        self.total_cost += cost;
        if planned.name != provider {
            self.used_fallback = true;
        }
    }
}

impl JobExecutor {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        clients: Arc<ProviderClients>,
        merger: Arc<dyn MediaMerger>,
    ) -> Self {
        Self {
            clients,
            merger,
            fallback: FallbackExecutor::new(registry),
        }
    }

    /// Drive `plan` to completion. Errors other than cancellation leave the job
    /// `Failed` with the error message; a cancelled job keeps its cancellation
    /// state and the run's output is discarded.
    pub async fn run(
        &self,
        plan: GenerationPlan,
        lease: JobLease,
    ) -> Result<GenerationResult, ApiError> {
        let job_id = lease.job_id().clone();
        let err = match self.drive(&plan, &lease).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };
        if let ApiError::Cancelled(_) = err {
            info!(job_id = %job_id, "job_run_stopped_after_cancel");
            return Err(err);
        }

        match lease.fail(&err.to_string()) {
            Ok(_) => Err(err),
            Err(ApiError::JobTerminal {
                status: JobStatus::Failed,
                ..
            }) => Err(ApiError::Cancelled(job_id)),
            Err(fail_err) => {
                warn!(job_id = %job_id, error = %fail_err, "job_failure_not_recorded");
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        plan: &GenerationPlan,
        lease: &JobLease,
    ) -> Result<GenerationResult, ApiError> {
        let started = Instant::now();
        let request = plan.request();
        let text_chars = request.text_chars();
        let clients = self.clients.as_ref();
        let mut delivered = Delivered::default();

        if let Some(planned) = plan.language().filter(|_| request.detect_language) {
            checkpoint(lease, Stage::LanguageDetection, planned)?;
            let text = request.prompt.as_str();
            let output = self
                .fallback
                .execute(
                    Stage::LanguageDetection,
                    &planned.chain,
                    ProviderCategory::Language.billed_quantity(request.video_duration, text_chars),
                    |name| detect_with(clients, name, text),
                )
                .await
                .into_stage_output(Stage::LanguageDetection)?;
            debug!(
                job_id = %lease.job_id(),
                language = %output.payload.language.code,
                confidence = output.payload.language.confidence,
                "language_detected"
            );
            delivered.note(planned, &output.provider_name, output.cost);
            delivered.language = Some((output.provider_name, output.payload));
        }

        let planned_voice = plan.voice();
        checkpoint(lease, Stage::SpeechSynthesis, planned_voice)?;
        let language_code = delivered
            .language
            .as_ref()
            .map(|(_, detection)| detection.language.code.clone());
        let speech = self
            .fallback
            .execute(
                Stage::SpeechSynthesis,
                &planned_voice.chain,
                ProviderCategory::Voice.billed_quantity(request.video_duration, text_chars),
                |name| {
                    synthesize_with(
                        clients,
                        name,
                        &request.prompt,
                        request.voice_id.as_deref(),
                        language_code.as_deref(),
                    )
                },
            )
            .await
            .into_stage_output(Stage::SpeechSynthesis)?;
        delivered.note(planned_voice, &speech.provider_name, speech.cost);
        delivered.voice = Some(speech.provider_name.clone());

        let planned_video = plan.video();
        checkpoint(lease, Stage::VideoGeneration, planned_video)?;
        let enriched = plan.enriched_prompt();
        let spec = VideoSpec {
            prompt: enriched.enriched_text.clone(),
            negative_prompt: Some(enriched.negative_text.clone()).filter(|n| !n.trim().is_empty()),
            duration_secs: request.video_duration,
            aspect_ratio: request.aspect_ratio.clone(),
            resolution: request.resolution.clone(),
            style: request.video_style.clone(),
        };
        let video = self
            .fallback
            .execute(
                Stage::VideoGeneration,
                &planned_video.chain,
                ProviderCategory::Video.billed_quantity(request.video_duration, text_chars),
                |name| generate_with(clients, name, &spec),
            )
            .await
            .into_stage_output(Stage::VideoGeneration)?;
        delivered.note(planned_video, &video.provider_name, video.cost);
        delivered.video = Some(video.provider_name.clone());

        let GeneratedVideo {
            video_ref,
            has_native_audio,
        } = video.payload;
        let SynthesizedSpeech { audio_ref, .. } = speech.payload;

        // No media work for a job cancelled while its video was rendering.
        if lease.is_cancelled() {
            return Err(ApiError::Cancelled(JobId::clone(lease.job_id())));
        }

        // Merging is a planned stage; a fallback video never adds it.
        let (final_video, final_audio, audio_merged) = if !plan.needs_audio_merge() {
            if !has_native_audio {
                warn!(
                    job_id = %lease.job_id(),
                    provider = %video.provider_name,
                    "fallback_video_without_audio_left_unmerged"
                );
            }
            (video_ref, audio_ref, false)
        } else if has_native_audio {
            debug!(job_id = %lease.job_id(), "native_audio_merge_skipped");
            (video_ref, audio_ref, false)
        } else {
            lease.advance(stage_update(Stage::MediaMerge)).map_err(|e| cancelled(lease, e))?;
            let (merged, adjusted) = self
                .merge(&video_ref, &audio_ref, f64::from(request.video_duration))
                .await?;
            (merged, adjusted, true)
        };

        let thumbnail_ref = match self.merger.thumbnail(&final_video).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(err) => {
                warn!(job_id = %lease.job_id(), error = %err, "thumbnail_failed");
                None
            }
        };

        let (language_provider, detected_language) = match delivered.language.take() {
            Some((provider, detection)) => (Some(provider), Some(detection.language.code)),
            None => (None, None),
        };
        let providers = ResultProviders {
            video: delivered.video.take().unwrap_or_else(|| planned_video.name.clone()),
            voice: delivered.voice.take().unwrap_or_else(|| planned_voice.name.clone()),
            language: language_provider,
        };
        let result = GenerationResult {
            job_id: lease.job_id().clone(),
            video_ref: final_video,
            audio_ref: final_audio,
            thumbnail_ref,
            duration_secs: request.video_duration,
            detected_language,
            total_cost: delivered.total_cost,
            generation_time_secs: started.elapsed().as_secs_f64(),
            quality_score: plan.expected_quality_score(),
            used_fallback: delivered.used_fallback,
            audio_merged,
            prompt: request.prompt.clone(),
            enriched_prompt: enriched.enriched_text.clone(),
            completed_at: Utc::now(),
            providers,
        };

        let message = format!(
            "Generated {}s video with {}",
            result.duration_secs, result.providers.video
        );
        lease
            .complete(result.clone(), message)
            .map_err(|e| cancelled(lease, e))?;
        info!(
            job_id = %result.job_id,
            video = %result.providers.video,
            voice = %result.providers.voice,
            total_cost = result.total_cost,
            used_fallback = result.used_fallback,
            generation_time_secs = result.generation_time_secs,
            "generation_completed"
        );
        Ok(result)
    }

    /// Fit the speech to the clip length, then mux it in.
    async fn merge(
        &self,
        video_ref: &str,
        audio_ref: &str,
        target_secs: f64,
    ) -> Result<(String, String), ApiError> {
        let stage_failed = |err: ProviderError| ApiError::StageFailed {
            stage: Stage::MediaMerge,
            message: err.to_string(),
        };
        let adjusted = self
            .merger
            .adjust_length(audio_ref, target_secs)
            .await
            .map_err(stage_failed)?;
        let merged = self
            .merger
            .merge(video_ref, &adjusted)
            .await
            .map_err(stage_failed)?;
        Ok((merged, adjusted))
    }
}

fn stage_update(stage: Stage) -> JobUpdate {
    JobUpdate::new(stage.status(), stage.checkpoint(), stage.step())
}

fn checkpoint(lease: &JobLease, stage: Stage, planned: &ProviderSelection) -> Result<(), ApiError> {
    let update = stage_update(stage).with_message(format!("Using {}", planned.name));
    lease.advance(update).map(|_| ()).map_err(|e| cancelled(lease, e))
}

/// A write rejected because the job already failed means someone cancelled it.
fn cancelled(lease: &JobLease, err: ApiError) -> ApiError {
    match err {
        ApiError::JobTerminal {
            status: JobStatus::Failed,
            ..
        } => ApiError::Cancelled(JobId::clone(lease.job_id())),
        other => other,
    }
}

async fn detect_with(
    clients: &ProviderClients,
    name: String,
    text: &str,
) -> Result<LanguageDetection, ProviderError> {
    clients.language(&name)?.detect(text).await
}

async fn synthesize_with(
    clients: &ProviderClients,
    name: String,
    text: &str,
    voice_id: Option<&str>,
    language: Option<&str>,
) -> Result<SynthesizedSpeech, ProviderError> {
    clients
        .voice(&name)?
        .synthesize(text, voice_id, language)
        .await
}

async fn generate_with(
    clients: &ProviderClients,
    name: String,
    spec: &VideoSpec,
) -> Result<GeneratedVideo, ProviderError> {
    clients.video(&name)?.generate(spec).await
}
