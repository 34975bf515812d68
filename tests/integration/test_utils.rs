//! Shared test utilities for integration tests
//!
//! Scripted collaborator doubles for every provider port, plus a small provider
//! registry whose chains are easy to reason about.

use async_trait::async_trait;
use parking_lot::Mutex;
use reelsmith::config::ReelsmithConfig;
use reelsmith::provider::{
    DetectedLanguage, GeneratedVideo, LanguageDetection, LanguageDetector, MediaMerger,
    PassthroughEnricher, ProviderClients, SynthesizedSpeech, VideoGenerator, VideoSpec,
    VoiceSynthesizer,
};
use reelsmith::{
    GenerationService, JobProgress, ProviderCategory, ProviderError, ProviderRecord,
    ProviderRegistry, QualityTier,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

pub const PROMPT: &str = "A red kite circling above a chalk hillside";

/// Two providers per category, primary first:
/// video `alpha_video` (95, native audio) then `beta_video` (90, silent),
/// voice `alpha_voice` (92, cloning) then `beta_voice` (88),
/// language `alpha_lang` (90).
pub fn small_registry() -> Arc<ProviderRegistry> {
    let registry = ProviderRegistry::new();
    let records = [
        ProviderRecord::new("alpha_video", ProviderCategory::Video, QualityTier::Premium, 95.0, 0.5)
            .with_max_duration(60)
            .with_features(["native_audio"]),
        ProviderRecord::new("beta_video", ProviderCategory::Video, QualityTier::Standard, 90.0, 0.1)
            .with_max_duration(60),
        ProviderRecord::new("alpha_voice", ProviderCategory::Voice, QualityTier::Premium, 92.0, 0.2)
            .with_features(["voice_cloning"]),
        ProviderRecord::new("beta_voice", ProviderCategory::Voice, QualityTier::Standard, 88.0, 0.05),
        ProviderRecord::new("alpha_lang", ProviderCategory::Language, QualityTier::Premium, 90.0, 0.0),
    ];
    for record in records {
        registry.register(record).unwrap();
    }
    Arc::new(registry)
}

/// Lets a test park a provider call mid-flight and release it later.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct ScriptedVideo {
    name: String,
    native_audio: bool,
    failures_left: Mutex<usize>,
    panics: bool,
    gate: Option<Arc<Gate>>,
    gate_marker: Option<String>,
    pub calls: Mutex<Vec<VideoSpec>>,
}

impl ScriptedVideo {
    pub fn new(name: &str, native_audio: bool) -> Self {
        Self {
            name: name.to_string(),
            native_audio,
            failures_left: Mutex::new(0),
            panics: false,
            gate: None,
            gate_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `times` calls.
    pub fn failing(mut self, times: usize) -> Self {
        self.failures_left = Mutex::new(times);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Park only the calls whose prompt contains `marker`.
    pub fn gated_on(mut self, gate: Arc<Gate>, marker: &str) -> Self {
        self.gate = Some(gate);
        self.gate_marker = Some(marker.to_string());
        self
    }
}

#[async_trait]
impl VideoGenerator for ScriptedVideo {
    async fn generate(&self, spec: &VideoSpec) -> Result<GeneratedVideo, ProviderError> {
        self.calls.lock().push(spec.clone());
        let parked = self
            .gate_marker
            .as_deref()
            .map_or(true, |marker| spec.prompt.contains(marker));
        if let Some(gate) = self.gate.as_ref().filter(|_| parked) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.panics {
            panic!("{} crashed", self.name);
        }
        {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(ProviderError::RequestFailed(format!("{} down", self.name)));
            }
        }
        Ok(GeneratedVideo {
            video_ref: format!("{}.mp4", self.name),
            has_native_audio: self.native_audio,
        })
    }
}

pub struct ScriptedVoice {
    name: String,
    fails: bool,
    pub calls: Mutex<Vec<(Option<String>, Option<String>)>>,
}

impl ScriptedVoice {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fails = true;
        self
    }
}

#[async_trait]
impl VoiceSynthesizer for ScriptedVoice {
    async fn synthesize(
        &self,
        _text: &str,
        voice_id: Option<&str>,
        language: Option<&str>,
    ) -> Result<SynthesizedSpeech, ProviderError> {
        self.calls
            .lock()
            .push((voice_id.map(str::to_string), language.map(str::to_string)));
        if self.fails {
            return Err(ProviderError::AuthFailed(format!("{} key revoked", self.name)));
        }
        Ok(SynthesizedSpeech {
            audio_ref: format!("{}.mp3", self.name),
            duration_secs: 7.0,
        })
    }

    async fn clone_voice(&self, sample: &[u8], name: &str) -> Result<String, ProviderError> {
        if self.fails {
            return Err(ProviderError::Rejected("sample too short".to_string()));
        }
        Ok(format!("{}:{}:{}", self.name, name, sample.len()))
    }
}

pub struct FixedDetector {
    code: &'static str,
    fails: bool,
}

impl FixedDetector {
    pub fn new(code: &'static str) -> Self {
        Self { code, fails: false }
    }

    pub fn failing() -> Self {
        Self {
            code: "",
            fails: true,
        }
    }
}

#[async_trait]
impl LanguageDetector for FixedDetector {
    async fn detect(&self, _text: &str) -> Result<LanguageDetection, ProviderError> {
        if self.fails {
            return Err(ProviderError::RequestFailed("detector offline".to_string()));
        }
        Ok(LanguageDetection {
            language: DetectedLanguage {
                code: self.code.to_string(),
                name: self.code.to_uppercase(),
                confidence: 0.97,
            },
            alternatives: Vec::new(),
        })
    }
}

/// Records every media operation it performs.
#[derive(Default)]
pub struct RecordingMerger {
    fail_merge: bool,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingMerger {
    pub fn failing() -> Self {
        Self {
            fail_merge: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaMerger for RecordingMerger {
    async fn merge(&self, video_ref: &str, audio_ref: &str) -> Result<String, ProviderError> {
        self.calls.lock().push(format!("merge {} {}", video_ref, audio_ref));
        if self.fail_merge {
            return Err(ProviderError::RequestFailed("muxer crashed".to_string()));
        }
        Ok(format!("merged-{}", video_ref))
    }

    async fn adjust_length(&self, audio_ref: &str, target_secs: f64) -> Result<String, ProviderError> {
        self.calls.lock().push(format!("adjust {} {}", audio_ref, target_secs));
        Ok(format!("fit-{}", audio_ref))
    }

    async fn thumbnail(&self, video_ref: &str) -> Result<String, ProviderError> {
        self.calls.lock().push(format!("thumbnail {}", video_ref));
        Ok(format!("{}.jpg", video_ref))
    }
}

/// Clients for [`small_registry`] where every provider succeeds.
pub fn healthy_clients() -> ProviderClients {
    ProviderClients::new()
        .with_video("alpha_video", Arc::new(ScriptedVideo::new("alpha_video", true)))
        .with_video("beta_video", Arc::new(ScriptedVideo::new("beta_video", false)))
        .with_voice("alpha_voice", Arc::new(ScriptedVoice::new("alpha_voice")))
        .with_voice("beta_voice", Arc::new(ScriptedVoice::new("beta_voice")))
        .with_language("alpha_lang", Arc::new(FixedDetector::new("en")))
}

pub fn service_with(
    registry: Arc<ProviderRegistry>,
    clients: ProviderClients,
    merger: Arc<RecordingMerger>,
) -> GenerationService {
    GenerationService::new(
        registry,
        clients,
        Arc::new(PassthroughEnricher),
        merger,
        &ReelsmithConfig::default(),
    )
}

pub fn healthy_service() -> GenerationService {
    service_with(
        small_registry(),
        healthy_clients(),
        Arc::new(RecordingMerger::default()),
    )
}

/// Drain whatever is buffered on a progress subscription.
pub fn drain(rx: &mut broadcast::Receiver<JobProgress>) -> Vec<JobProgress> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
