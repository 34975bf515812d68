//! Job Lifecycle
//!
//! Each accepted generation request becomes a job: an identifier, a status that only
//! moves forward through the pipeline stages, and (once complete) a result record.
//! The [`store::JobStore`] owns every job; a single [`store::JobLease`] holder may
//! write to a job while any number of callers read snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod result;
pub mod status;
pub mod store;

pub use result::{GenerationResult, ResultProviders};
pub use status::{JobStatus, Stage};
pub use store::{CancelOutcome, JobLease, JobSnapshot, JobStore, JobUpdate};

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque job identifier, unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Allocate a fresh identifier of the form `job-{millis}-{pid}-{seq}`.
    pub fn generate() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let pid = std::process::id();
        let seq = JOB_COUNTER.fetch_add(1, Ordering::Relaxed);
        JobId(format!("job-{ts}-{pid}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        JobId(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
