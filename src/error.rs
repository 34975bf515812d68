//! Error types for the reelsmith generation pipeline.

use crate::job::{JobId, JobStatus, Stage};
use crate::provider::ProviderCategory;
use thiserror::Error;

/// Failure of a single provider invocation.
///
/// Always absorbed by the fallback executor; callers only ever see
/// [`ApiError::ChainExhausted`] carrying the last of these messages.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Provider {provider} has no client configured for {category}")]
    NotConfigured {
        provider: String,
        category: ProviderCategory,
    },

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(String),
}

/// Errors surfaced by the registry, the plan builder, the job store and the service facade.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Invalid provider record '{name}': {reason}")]
    InvalidProvider { name: String, reason: String },

    #[error("No {0} providers available")]
    NoProviderAvailable(ProviderCategory),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{stage} failed: {error}")]
    ChainExhausted { stage: Stage, error: String },

    #[error("{stage} failed: {message}")]
    StageFailed { stage: Stage, message: String },

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job not yet completed. Status: {status}")]
    ResultNotReady { job_id: JobId, status: JobStatus },

    #[error("Job failed: {error}")]
    JobFailed { job_id: JobId, error: String },

    #[error("Job {0} was cancelled")]
    Cancelled(JobId),

    #[error("Cannot cancel completed job {0}")]
    CannotCancelCompleted(JobId),

    #[error("Job {job_id} is {status} and accepts no further updates")]
    JobTerminal { job_id: JobId, status: JobStatus },

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Job {job_id} progress cannot move from {current}% back to {requested}%")]
    ProgressRegression {
        job_id: JobId,
        current: u8,
        requested: u8,
    },

    #[error("Job {job_id} executor aborted: {reason}")]
    ExecutorAborted { job_id: JobId, reason: String },

    #[error("Job {0} already has an executor")]
    JobAlreadyDriven(JobId),

    #[error("Job {0} already exists")]
    DuplicateJob(JobId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output formatting failed: {0}")]
    OutputError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
