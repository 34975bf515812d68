//! Collaborator ports implemented by concrete provider clients.
//!
//! The engine never speaks a vendor protocol itself. Each registered provider name
//! is bound to a client implementing one of these traits; the executor looks the
//! client up by the name the fallback chain hands it.

use crate::error::ProviderError;
use crate::provider::ProviderCategory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    /// ISO 639-1 code, e.g. `en`.
    pub code: String,
    pub name: String,
    /// 0.0-1.0
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub language: DetectedLanguage,
    #[serde(default)]
    pub alternatives: Vec<DetectedLanguage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedSpeech {
    /// Opaque reference to the rendered audio (path, URL or blob key).
    pub audio_ref: String,
    pub duration_secs: f64,
}

/// Everything a video provider needs to render one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSpec {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub duration_secs: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    pub video_ref: String,
    /// True when the clip already carries a soundtrack.
    pub has_native_audio: bool,
}

/// Prompt rewritten for video generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPrompt {
    pub enriched_text: String,
    #[serde(default)]
    pub negative_text: String,
    pub quality_score: f64,
}

impl EnrichedPrompt {
    /// The prompt used as-is, with a neutral quality score.
    pub fn literal(text: &str) -> Self {
        Self {
            enriched_text: text.to_string(),
            negative_text: String::new(),
            quality_score: 50.0,
        }
    }
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<LanguageDetection, ProviderError>;
}

#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
        language: Option<&str>,
    ) -> Result<SynthesizedSpeech, ProviderError>;

    /// Register a new voice from an audio sample and return its voice id.
    async fn clone_voice(&self, sample: &[u8], name: &str) -> Result<String, ProviderError> {
        let _ = (sample, name);
        Err(ProviderError::Rejected(
            "voice cloning is not supported".to_string(),
        ))
    }
}

#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(&self, spec: &VideoSpec) -> Result<GeneratedVideo, ProviderError>;
}

/// Local media toolkit used after the provider stages.
#[async_trait]
pub trait MediaMerger: Send + Sync {
    /// Mux the speech track onto the video and return the merged video reference.
    async fn merge(&self, video_ref: &str, audio_ref: &str) -> Result<String, ProviderError>;

    /// Pad or trim an audio track to `target_secs`.
    async fn adjust_length(&self, audio_ref: &str, target_secs: f64)
        -> Result<String, ProviderError>;

    async fn thumbnail(&self, video_ref: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait PromptEnricher: Send + Sync {
    async fn enrich(
        &self,
        text: &str,
        duration_secs: f64,
        style: Option<&str>,
    ) -> Result<EnrichedPrompt, ProviderError>;
}

/// Enricher that hands the prompt through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEnricher;

#[async_trait]
impl PromptEnricher for PassthroughEnricher {
    async fn enrich(
        &self,
        text: &str,
        _duration_secs: f64,
        _style: Option<&str>,
    ) -> Result<EnrichedPrompt, ProviderError> {
        Ok(EnrichedPrompt::literal(text))
    }
}

/// A client bound to one provider name.
#[derive(Clone)]
pub enum ProviderClient {
    Language(Arc<dyn LanguageDetector>),
    Voice(Arc<dyn VoiceSynthesizer>),
    Video(Arc<dyn VideoGenerator>),
}

impl ProviderClient {
    pub fn category(&self) -> ProviderCategory {
        match self {
            ProviderClient::Language(_) => ProviderCategory::Language,
            ProviderClient::Voice(_) => ProviderCategory::Voice,
            ProviderClient::Video(_) => ProviderCategory::Video,
        }
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderClient::{}", self.category())
    }
}

/// Name-keyed table of provider clients.
#[derive(Clone, Debug, Default)]
pub struct ProviderClients {
    clients: HashMap<String, ProviderClient>,
}

impl ProviderClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `client` to `name`, returning any client it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        client: ProviderClient,
    ) -> Option<ProviderClient> {
        self.clients.insert(name.into(), client)
    }

    pub fn with_language(mut self, name: impl Into<String>, client: Arc<dyn LanguageDetector>) -> Self {
        self.register(name, ProviderClient::Language(client));
        self
    }

    pub fn with_voice(mut self, name: impl Into<String>, client: Arc<dyn VoiceSynthesizer>) -> Self {
        self.register(name, ProviderClient::Voice(client));
        self
    }

    pub fn with_video(mut self, name: impl Into<String>, client: Arc<dyn VideoGenerator>) -> Self {
        self.register(name, ProviderClient::Video(client));
        self
    }

    pub fn language(&self, name: &str) -> Result<Arc<dyn LanguageDetector>, ProviderError> {
        match self.clients.get(name) {
            Some(ProviderClient::Language(client)) => Ok(Arc::clone(client)),
            _ => Err(not_configured(name, ProviderCategory::Language)),
        }
    }

    pub fn voice(&self, name: &str) -> Result<Arc<dyn VoiceSynthesizer>, ProviderError> {
        match self.clients.get(name) {
            Some(ProviderClient::Voice(client)) => Ok(Arc::clone(client)),
            _ => Err(not_configured(name, ProviderCategory::Voice)),
        }
    }

    pub fn video(&self, name: &str) -> Result<Arc<dyn VideoGenerator>, ProviderError> {
        match self.clients.get(name) {
            Some(ProviderClient::Video(client)) => Ok(Arc::clone(client)),
            _ => Err(not_configured(name, ProviderCategory::Video)),
        }
    }
}

fn not_configured(name: &str, category: ProviderCategory) -> ProviderError {
    ProviderError::NotConfigured {
        provider: name.to_string(),
        category,
    }
}
