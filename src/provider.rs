//! Provider Domain
//!
//! Records describing the interchangeable third-party providers for each pipeline
//! category (video, voice, language), the registry that ranks them, the fallback
//! executor that drives them, and the collaborator traits their clients implement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub mod catalog;
pub mod clients;
pub mod commands;
pub mod fallback;
pub mod registry;

pub use clients::{
    DetectedLanguage, EnrichedPrompt, GeneratedVideo, LanguageDetection, LanguageDetector,
    MediaMerger, PassthroughEnricher, PromptEnricher, ProviderClient, ProviderClients,
    SynthesizedSpeech, VideoGenerator, VideoSpec, VoiceSynthesizer,
};
pub use fallback::{FallbackExecutor, ProviderAttempt, ProviderResult, StageOutput};
pub use registry::{ListFilter, ProviderHealth, ProviderRegistry, SelectionCriteria};

/// Well-known capability names used by selection policy.
pub mod features {
    /// Video provider renders its own soundtrack; no merge stage is needed.
    pub const NATIVE_AUDIO: &str = "native_audio";
    /// Voice provider can synthesize with a previously cloned voice.
    pub const VOICE_CLONING: &str = "voice_cloning";
    pub const UHD_4K: &str = "4k";
    pub const LIP_SYNC: &str = "lip_sync";
    pub const OPEN_SOURCE: &str = "open_source";
    pub const LOW_LATENCY: &str = "low_latency";
}

/// Pipeline category a provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Video,
    Voice,
    Language,
}

impl ProviderCategory {
    pub const ALL: [ProviderCategory; 3] = [
        ProviderCategory::Video,
        ProviderCategory::Voice,
        ProviderCategory::Language,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderCategory::Video => "video",
            ProviderCategory::Voice => "voice",
            ProviderCategory::Language => "language",
        }
    }

    /// Units a provider of this category bills for one job: seconds of video,
    /// thousands of characters of speech, or a single detection request.
    pub fn billed_quantity(self, duration_secs: u32, text_chars: usize) -> f64 {
        match self {
            ProviderCategory::Video => f64::from(duration_secs),
            ProviderCategory::Voice => text_chars as f64 / 1000.0,
            ProviderCategory::Language => 1.0,
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ProviderCategory::Video),
            "voice" => Ok(ProviderCategory::Voice),
            "language" => Ok(ProviderCategory::Language),
            other => Err(format!(
                "unknown category '{}' (expected video, voice or language)",
                other
            )),
        }
    }
}

/// Coarse quality bucket used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Premium,
    Standard,
    Budget,
    Experimental,
}

impl QualityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Premium => "premium",
            QualityTier::Standard => "standard",
            QualityTier::Budget => "budget",
            QualityTier::Experimental => "experimental",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium" => Ok(QualityTier::Premium),
            "standard" => Ok(QualityTier::Standard),
            "budget" => Ok(QualityTier::Budget),
            "experimental" => Ok(QualityTier::Experimental),
            other => Err(format!(
                "unknown tier '{}' (expected premium, standard, budget or experimental)",
                other
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_success_rate() -> f64 {
    1.0
}

/// Capability, quality, cost and live-health record for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub category: ProviderCategory,
    pub quality_tier: QualityTier,
    /// 0-100, higher is better.
    pub quality_score: f64,
    /// Per second of video, per 1k characters of speech, per detection request.
    pub cost_per_unit: f64,
    /// Longest clip the provider can render, in seconds.
    #[serde(default)]
    pub max_duration: Option<u32>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// All-time successes / attempts, 1.0 until the first attempt.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl ProviderRecord {
    pub fn new(
        name: impl Into<String>,
        category: ProviderCategory,
        quality_tier: QualityTier,
        quality_score: f64,
        cost_per_unit: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            quality_tier,
            quality_score,
            cost_per_unit,
            max_duration: None,
            features: BTreeSet::new(),
            languages: Vec::new(),
            is_available: true,
            success_rate: default_success_rate(),
            avg_latency_ms: None,
            last_checked: None,
        }
    }

    pub fn with_max_duration(mut self, seconds: u32) -> Self {
        self.max_duration = Some(seconds);
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages.extend(languages.into_iter().map(Into::into));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    pub fn supports(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// True when generated video already carries a soundtrack.
    pub fn supports_audio(&self) -> bool {
        self.supports(features::NATIVE_AUDIO)
    }

    /// Whether the provider can render `seconds` of output. Providers without a
    /// declared limit are assumed to cover any duration.
    pub fn covers_duration(&self, seconds: u32) -> bool {
        self.max_duration.map_or(true, |max| max >= seconds)
    }

    pub fn estimated_cost(&self, billed_quantity: f64) -> f64 {
        self.cost_per_unit * billed_quantity
    }

    /// Check the numeric bounds a record must satisfy before it is registered.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if !(0.0..=100.0).contains(&self.quality_score) {
            return Err(format!(
                "quality_score {} is outside [0, 100]",
                self.quality_score
            ));
        }
        if !self.cost_per_unit.is_finite() || self.cost_per_unit < 0.0 {
            return Err(format!(
                "cost_per_unit {} must be a non-negative number",
                self.cost_per_unit
            ));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(format!(
                "success_rate {} is outside [0, 1]",
                self.success_rate
            ));
        }
        if self.max_duration == Some(0) {
            return Err("max_duration must be positive when set".to_string());
        }
        Ok(())
    }
}

/// Cumulative usage counters for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub total_cost: f64,
    pub avg_latency_ms: f64,
}

impl UsageStats {
    /// Fold one attempt into the counters. Latency is an incremental mean over
    /// every attempt, successful or not.
    pub fn record(&mut self, latency_ms: f64, success: bool, cost: f64) {
        let latency_ms = sanitize(latency_ms);
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        }
        self.total_cost += sanitize(cost);
        let n = self.total_requests as f64;
        self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / n;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 1.0;
        }
        (self.successful_requests as f64 / self.total_requests as f64).clamp(0.0, 1.0)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
