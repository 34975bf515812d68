//! Result record attached to a job once it completes.

use crate::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Providers that actually delivered each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultProviders {
    pub video: String,
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub job_id: JobId,
    pub video_ref: String,
    pub audio_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_ref: Option<String>,
    pub duration_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    pub providers: ResultProviders,
    /// Sum of the billed cost of every successful stage.
    pub total_cost: f64,
    /// Wall-clock execution time in seconds.
    pub generation_time_secs: f64,
    /// The planned expected quality, not a measurement.
    pub quality_score: f64,
    /// True when some stage was served by a provider other than the planned primary.
    pub used_fallback: bool,
    pub audio_merged: bool,
    pub prompt: String,
    pub enriched_prompt: String,
    pub completed_at: DateTime<Utc>,
}
