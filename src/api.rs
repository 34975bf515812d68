//! Generation Service APIs
//!
//! The facade callers use to plan, run and observe generation jobs and to
//! administer the provider registry. One instance owns the job store and the
//! progress bus; the registry is injected so several services (or a CLI) can
//! share the same provider state.

use crate::config::{ReelsmithConfig, SelectionConfig};
use crate::error::{ApiError, ProviderError};
use crate::generation::{
    enrich_prompt, recommend, GenerationPlan, GenerationRequest, JobExecutor, PlanBuilder,
    Recommendation,
};
use crate::job::{CancelOutcome, GenerationResult, JobId, JobSnapshot, JobStore, Stage};
use crate::progress::{FanOut, JobProgress, ProgressBus, ProgressSink};
use crate::provider::commands::{ProviderCommandService, ProviderComparison, ProviderShowResult};
use crate::provider::{
    features, FallbackExecutor, ListFilter, MediaMerger, PromptEnricher, ProviderCategory,
    ProviderClients, ProviderHealth, ProviderRecord, ProviderRegistry, UsageStats,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Voice registered through the voice chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonedVoice {
    pub provider: String,
    pub voice_id: String,
}

/// Handle to a submitted job. Dropping it does not stop the job.
pub struct JobHandle {
    job_id: JobId,
    store: Arc<JobStore>,
    handle: JoinHandle<Result<GenerationResult, ApiError>>,
}

impl JobHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job's executor. A task that was aborted by the runtime
    /// leaves its job `Failed` rather than stuck mid-pipeline.
    pub async fn wait(self) -> Result<GenerationResult, ApiError> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let reason = join_err.to_string();
                if let Err(err) = self.store.fail_abandoned(&self.job_id, &reason) {
                    warn!(job_id = %self.job_id, error = %err, "aborted_job_not_failed");
                }
                Err(ApiError::ExecutorAborted {
                    job_id: self.job_id,
                    reason,
                })
            }
        }
    }
}

/// Generation service
///
/// Every exposed operation of the orchestration core. Job execution happens on
/// the tokio runtime the service is used from.
pub struct GenerationService {
    registry: Arc<ProviderRegistry>,
    clients: Arc<ProviderClients>,
    enricher: Arc<dyn PromptEnricher>,
    executor: JobExecutor,
    fallback: FallbackExecutor,
    store: Arc<JobStore>,
    bus: ProgressBus,
    selection: SelectionConfig,
}

impl GenerationService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        clients: ProviderClients,
        enricher: Arc<dyn PromptEnricher>,
        merger: Arc<dyn MediaMerger>,
        config: &ReelsmithConfig,
    ) -> Self {
        let clients = Arc::new(clients);
        Self {
            executor: JobExecutor::new(Arc::clone(&registry), Arc::clone(&clients), merger),
            fallback: FallbackExecutor::new(Arc::clone(&registry)),
            store: Arc::new(JobStore::new(config.jobs.ttl())),
            bus: ProgressBus::new(config.jobs.progress_capacity),
            selection: config.selection.clone(),
            registry,
            clients,
            enricher,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Validate the request, enrich its prompt and select providers.
    ///
    /// Fails with [`ApiError::NoProviderAvailable`] before any job exists when
    /// video or voice has no qualifying provider.
    pub async fn create_plan(&self, request: GenerationRequest) -> Result<GenerationPlan, ApiError> {
        let request = request.validated()?;
        let enriched = enrich_prompt(self.enricher.as_ref(), &request).await;
        PlanBuilder::new(&self.registry, &self.selection).build(request, enriched)
    }

    /// Run a plan to completion on the current task, reporting progress to
    /// `sink` as well as to the service bus.
    pub async fn execute_plan(
        &self,
        plan: GenerationPlan,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<GenerationResult, ApiError> {
        let sink: Arc<dyn ProgressSink> =
            Arc::new(FanOut::new().with(Arc::new(self.bus.clone())).with(sink));
        self.store.create(plan.job_id().clone())?;
        let lease = self.store.claim(plan.job_id(), sink)?;
        self.executor.run(plan, lease).await
    }

    /// Register the plan's job and run it on a background task.
    ///
    /// The task is supervised: a panicking executor leaves the job `Failed`
    /// with the panic message instead of silently stuck.
    pub fn submit(&self, plan: GenerationPlan) -> Result<JobHandle, ApiError> {
        self.store.evict_expired();

        let job_id = plan.job_id().clone();
        self.store.create(job_id.clone())?;
        let lease = self
            .store
            .claim(&job_id, Arc::new(self.bus.clone()) as Arc<dyn ProgressSink>)?;

        let executor = self.executor.clone();
        let store = Arc::clone(&self.store);
        let bus = self.bus.clone();
        let task_job_id = job_id.clone();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(executor.run(plan, lease))
                .catch_unwind()
                .await;
            match outcome {
                Ok(result) => result,
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!(job_id = %task_job_id, reason = %reason, "executor_panicked");
                    match store.fail_abandoned(&task_job_id, &format!("Executor aborted: {}", reason)) {
                        Ok(snapshot) => bus.publish(JobProgress::from_snapshot(&snapshot)),
                        Err(err) => warn!(job_id = %task_job_id, error = %err, "aborted_job_not_failed"),
                    }
                    Err(ApiError::ExecutorAborted {
                        job_id: task_job_id,
                        reason,
                    })
                }
            }
        });

        info!(job_id = %job_id, "job_submitted");
        Ok(JobHandle {
            job_id,
            store: Arc::clone(&self.store),
            handle,
        })
    }

    /// Plan and submit in one call.
    pub async fn generate(&self, request: GenerationRequest) -> Result<JobHandle, ApiError> {
        let plan = self.create_plan(request).await?;
        self.submit(plan)
    }

    pub fn query_job(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        self.store.get(job_id)
    }

    pub fn query_result(&self, job_id: &JobId) -> Result<GenerationResult, ApiError> {
        self.store.result(job_id)
    }

    pub fn list_jobs(&self) -> Vec<JobSnapshot> {
        self.store.list()
    }

    /// Cancel a pending or running job. The running executor notices at its
    /// next checkpoint; in-flight provider calls are not interrupted. The
    /// `Failed` event goes to the job's own sink, which for
    /// [`execute_plan`](Self::execute_plan) includes the caller's.
    pub fn cancel(&self, job_id: &JobId) -> Result<CancelOutcome, ApiError> {
        self.store.cancel_notifying(job_id, &self.bus)
    }

    /// Progress events of every job run by this service.
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgress> {
        self.bus.subscribe()
    }

    /// Drop terminal jobs older than the configured TTL.
    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired()
    }

    pub fn list_providers(&self, filter: &ListFilter) -> Vec<ProviderRecord> {
        self.registry.list(filter)
    }

    pub fn provider_detail(&self, name: &str) -> Result<ProviderShowResult, ApiError> {
        ProviderCommandService::run_show(&self.registry, name)
    }

    pub fn provider_health(&self, name: &str) -> Result<ProviderHealth, ApiError> {
        self.registry.health(name)
    }

    pub fn set_availability(&self, name: &str, available: bool) -> Result<(), ApiError> {
        self.registry.set_availability(name, available)
    }

    pub fn fallback_chains(&self) -> BTreeMap<ProviderCategory, Vec<String>> {
        self.registry.fallback_chains()
    }

    pub fn usage_stats(&self) -> BTreeMap<String, UsageStats> {
        self.registry.all_usage_stats()
    }

    /// Ranked candidates and the combination a plan would use. Read-only.
    pub fn recommend(&self, request: &GenerationRequest) -> Result<Recommendation, ApiError> {
        recommend(&self.registry, &self.selection, request)
    }

    pub fn compare_providers(
        &self,
        names: &[String],
        duration_secs: u32,
        prompt_chars: usize,
    ) -> ProviderComparison {
        ProviderCommandService::run_compare(&self.registry, names, duration_secs, prompt_chars)
    }

    /// Clone a voice from `sample` with the best cloning-capable voice provider,
    /// falling back along the voice chain.
    pub async fn clone_voice(&self, sample: &[u8], name: &str) -> Result<ClonedVoice, ApiError> {
        if sample.is_empty() {
            return Err(ApiError::InvalidRequest("voice sample is empty".to_string()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidRequest("voice name cannot be empty".to_string()));
        }

        let chain: Vec<String> = self
            .registry
            .fallback_chain(ProviderCategory::Voice, None)
            .into_iter()
            .filter(|provider| {
                self.registry
                    .get(provider)
                    .map_or(false, |record| record.supports(features::VOICE_CLONING))
            })
            .collect();
        if chain.is_empty() {
            return Err(ApiError::NoProviderAvailable(ProviderCategory::Voice));
        }

        let clients = self.clients.as_ref();
        let output = self
            .fallback
            .execute(Stage::SpeechSynthesis, &chain, 0.0, |provider| {
                clone_with(clients, provider, sample, name)
            })
            .await
            .into_stage_output(Stage::SpeechSynthesis)?;

        info!(provider = %output.provider_name, voice = name, "voice_cloned");
        Ok(ClonedVoice {
            provider: output.provider_name,
            voice_id: output.payload,
        })
    }
}

async fn clone_with(
    clients: &ProviderClients,
    provider: String,
    sample: &[u8],
    name: &str,
) -> Result<String, ProviderError> {
    clients.voice(&provider)?.clone_voice(sample, name).await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "executor panicked".to_string()
    }
}
