//! Fallback execution: try each provider of a chain in order until one succeeds.
//!
//! Provider failures never escape this module as errors. Each attempt is timed and
//! folded into the registry's usage stats; the caller receives a [`ProviderResult`]
//! describing either the first success or the exhaustion of the chain.

use crate::error::{ApiError, ProviderError};
use crate::job::Stage;
use crate::provider::ProviderRegistry;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const ALL_PROVIDERS_FAILED: &str = "All providers failed";

/// One provider invocation made while walking a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub success: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of walking a fallback chain.
#[derive(Debug, Clone)]
pub struct ProviderResult<T> {
    pub success: bool,
    pub provider_name: Option<String>,
    pub payload: Option<T>,
    /// Latency of the successful attempt.
    pub latency_ms: f64,
    /// Billed cost of the successful attempt.
    pub cost: f64,
    pub quality_score: Option<f64>,
    /// Last provider error when every attempt failed.
    pub error: Option<String>,
    pub attempts: Vec<ProviderAttempt>,
}

/// Unpacked successful result.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub provider_name: String,
    pub payload: T,
    pub cost: f64,
    pub latency_ms: f64,
    pub attempts: Vec<ProviderAttempt>,
}

impl<T> ProviderResult<T> {
    fn exhausted(error: String, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            success: false,
            provider_name: None,
            payload: None,
            latency_ms: 0.0,
            cost: 0.0,
            quality_score: None,
            error: Some(error),
            attempts,
        }
    }

    /// Convert into the stage output, or a `ChainExhausted` error naming the stage.
    pub fn into_stage_output(self, stage: Stage) -> Result<StageOutput<T>, ApiError> {
        match (self.success, self.provider_name, self.payload) {
            (true, Some(provider_name), Some(payload)) => Ok(StageOutput {
                provider_name,
                payload,
                cost: self.cost,
                latency_ms: self.latency_ms,
                attempts: self.attempts,
            }),
            _ => Err(ApiError::ChainExhausted {
                stage,
                error: self
                    .error
                    .unwrap_or_else(|| ALL_PROVIDERS_FAILED.to_string()),
            }),
        }
    }
}

#[derive(Clone)]
pub struct FallbackExecutor {
    registry: Arc<ProviderRegistry>,
}

impl FallbackExecutor {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Invoke `operation` with each chain member until one succeeds.
    ///
    /// Names that are unregistered or currently unavailable are skipped without an
    /// attempt. The successful attempt is billed at `cost_per_unit * billed_quantity`;
    /// failed attempts cost nothing. There is no delay between attempts.
    pub async fn execute<T, F, Fut>(
        &self,
        stage: Stage,
        chain: &[String],
        billed_quantity: f64,
        mut operation: F,
    ) -> ProviderResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempts = Vec::new();
        let mut last_error: Option<String> = None;

        for name in chain {
            let Some(record) = self.registry.get(name) else {
                debug!(stage = %stage, provider = %name, "provider_skipped_unregistered");
                continue;
            };
            if !record.is_available {
                debug!(stage = %stage, provider = %name, "provider_skipped_unavailable");
                continue;
            }

            let started = Instant::now();
            let outcome = operation(name.clone()).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(payload) => {
                    let cost = record.estimated_cost(billed_quantity);
                    self.record(name, latency_ms, true, cost);
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        success: true,
                        latency_ms,
                        error: None,
                    });
                    info!(
                        stage = %stage,
                        provider = %name,
                        latency_ms,
                        cost,
                        attempt = attempts.len(),
                        "provider_succeeded"
                    );
                    return ProviderResult {
                        success: true,
                        provider_name: Some(name.clone()),
                        payload: Some(payload),
                        latency_ms,
                        cost,
                        quality_score: Some(record.quality_score),
                        error: None,
                        attempts,
                    };
                }
                Err(err) => {
                    let message = err.to_string();
                    self.record(name, latency_ms, false, 0.0);
                    warn!(
                        stage = %stage,
                        provider = %name,
                        latency_ms,
                        error = %message,
                        "provider_failed_trying_next"
                    );
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        success: false,
                        latency_ms,
                        error: Some(message.clone()),
                    });
                    last_error = Some(message);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| ALL_PROVIDERS_FAILED.to_string());
        warn!(stage = %stage, attempts = attempts.len(), error = %error, "fallback_chain_exhausted");
        ProviderResult::exhausted(error, attempts)
    }

    fn record(&self, name: &str, latency_ms: f64, success: bool, cost: f64) {
        if let Err(err) = self.registry.record_outcome(name, latency_ms, success, cost) {
            warn!(provider = name, error = %err, "provider_outcome_not_recorded");
        }
    }
}
