//! Event schema for job progress.

use crate::job::{JobId, JobSnapshot, JobStatus};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub ts: String,
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgress {
    pub fn from_snapshot(snapshot: &JobSnapshot) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            job_id: snapshot.job_id.clone(),
            status: snapshot.status,
            progress: snapshot.progress,
            current_step: snapshot.current_step.clone(),
            message: snapshot.message.clone(),
            error: snapshot.error.clone(),
        }
    }
}
