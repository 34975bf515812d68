//! Configuration System
//!
//! Layered runtime configuration: built-in defaults, the user's global file, the
//! workspace file, then `REELSMITH__SECTION__KEY` environment overrides. Holds the
//! selection thresholds used by the plan builder, job retention, the provider
//! catalog and logging.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReelsmithConfig {
    /// Provider selection thresholds
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Job retention and progress delivery
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Provider catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Quality floors applied when planning a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// First-pass floor for video providers
    #[serde(default = "default_video_min_quality")]
    pub video_min_quality: f64,

    /// Floor used when nothing clears `video_min_quality`
    #[serde(default = "default_video_relaxed_min_quality")]
    pub video_relaxed_min_quality: f64,

    #[serde(default = "default_voice_min_quality")]
    pub voice_min_quality: f64,

    #[serde(default = "default_language_min_quality")]
    pub language_min_quality: f64,

    /// Quality assumed for the language stage when detection is skipped
    #[serde(default = "default_skipped_language_quality")]
    pub skipped_language_quality: f64,

    /// Only pick video providers whose max duration covers the request
    #[serde(default = "default_true")]
    pub require_duration_support: bool,

    /// Candidates listed per category by the recommender
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

fn default_video_min_quality() -> f64 {
    80.0
}

fn default_video_relaxed_min_quality() -> f64 {
    75.0
}

fn default_voice_min_quality() -> f64 {
    85.0
}

fn default_language_min_quality() -> f64 {
    80.0
}

fn default_skipped_language_quality() -> f64 {
    90.0
}

fn default_true() -> bool {
    true
}

fn default_recommendation_limit() -> usize {
    5
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            video_min_quality: default_video_min_quality(),
            video_relaxed_min_quality: default_video_relaxed_min_quality(),
            voice_min_quality: default_voice_min_quality(),
            language_min_quality: default_language_min_quality(),
            skipped_language_quality: default_skipped_language_quality(),
            require_duration_support: default_true(),
            recommendation_limit: default_recommendation_limit(),
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let floors = [
            ("video_min_quality", self.video_min_quality),
            ("video_relaxed_min_quality", self.video_relaxed_min_quality),
            ("voice_min_quality", self.voice_min_quality),
            ("language_min_quality", self.language_min_quality),
            ("skipped_language_quality", self.skipped_language_quality),
        ];
        for (key, value) in floors {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{} must be within [0, 100], got {}", key, value));
            }
        }
        if self.video_relaxed_min_quality > self.video_min_quality {
            return Err(format!(
                "video_relaxed_min_quality ({}) cannot exceed video_min_quality ({})",
                self.video_relaxed_min_quality, self.video_min_quality
            ));
        }
        if self.recommendation_limit == 0 {
            return Err("recommendation_limit must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Largest progress buffer a subscriber may ask for.
pub const MAX_PROGRESS_CAPACITY: usize = 65_536;

/// Job store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Seconds a finished job stays queryable
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Buffered progress events per subscriber
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_progress_capacity() -> usize {
    64
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            progress_capacity: default_progress_capacity(),
        }
    }
}

impl JobsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("ttl_secs must be at least 1".to_string());
        }
        if !(1..=MAX_PROGRESS_CAPACITY).contains(&self.progress_capacity) {
            return Err(format!(
                "progress_capacity must be between 1 and {}",
                MAX_PROGRESS_CAPACITY
            ));
        }
        Ok(())
    }
}

/// Provider catalog settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Start from the built-in catalog
    #[serde(default = "default_true")]
    pub include_defaults: bool,

    /// Providers registered but marked unavailable
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Additional or overriding provider records
    #[serde(default)]
    pub providers: Vec<ProviderRecord>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            disabled: Vec::new(),
            providers: Vec::new(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Selection(String),
    Jobs(String),
    Provider(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Selection(msg) => write!(f, "Selection: {}", msg),
            ValidationError::Jobs(msg) => write!(f, "Jobs: {}", msg),
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ReelsmithConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.selection.validate() {
            errors.push(ValidationError::Selection(e));
        }
        if let Err(e) = self.jobs.validate() {
            errors.push(ValidationError::Jobs(e));
        }

        let mut seen = HashSet::new();
        for record in &self.catalog.providers {
            if let Err(e) = record.validate() {
                errors.push(ValidationError::Provider(record.name.clone(), e));
            }
            if !seen.insert(record.name.as_str()) {
                errors.push(ValidationError::Provider(
                    record.name.clone(),
                    "declared more than once in catalog.providers".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one configuration error.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}
