//! Built-in provider catalog and use-case recommendations.

use crate::provider::features::{LIP_SYNC, LOW_LATENCY, NATIVE_AUDIO, OPEN_SOURCE, UHD_4K, VOICE_CLONING};
use crate::provider::{ProviderCategory, ProviderRecord, QualityTier};
use serde::{Deserialize, Serialize};

const MAJOR_LANGUAGES: [&str; 10] = ["en", "es", "fr", "de", "it", "pt", "ja", "ko", "zh", "hi"];

fn video(name: &str, tier: QualityTier, score: f64, cost: f64, max_secs: u32) -> ProviderRecord {
    ProviderRecord::new(name, ProviderCategory::Video, tier, score, cost).with_max_duration(max_secs)
}

fn voice(name: &str, tier: QualityTier, score: f64, cost: f64) -> ProviderRecord {
    ProviderRecord::new(name, ProviderCategory::Voice, tier, score, cost)
        .with_languages(MAJOR_LANGUAGES)
}

/// The providers known out of the box, with their published quality and pricing.
/// Video costs are per second, voice per 1k characters, language per request.
pub fn default_catalog() -> Vec<ProviderRecord> {
    use QualityTier::*;

    vec![
        video("veo_3.1", Premium, 98.0, 0.45, 120).with_features([NATIVE_AUDIO, UHD_4K]),
        video("sora_2", Premium, 97.0, 0.35, 20).with_features([NATIVE_AUDIO]),
        video("runway_gen4", Premium, 92.0, 0.08, 16).with_features([UHD_4K]),
        video("runway_gen3_turbo", Standard, 89.0, 0.05, 10).with_features([LOW_LATENCY]),
        video("kling_1.6", Standard, 88.0, 0.11, 120).with_features([NATIVE_AUDIO, LIP_SYNC]),
        video("luma_ray2", Standard, 85.0, 0.18, 9),
        video("hunyuan_video", Standard, 84.0, 0.0, 30).with_features([OPEN_SOURCE]),
        video("mochi_1", Standard, 82.0, 0.0, 30).with_features([OPEN_SOURCE]),
        video("pika_2.5", Budget, 80.0, 0.06, 5).with_features([LOW_LATENCY]),
        video("cogvideox", Budget, 78.0, 0.0, 10).with_features([OPEN_SOURCE]),
        voice("fish_audio", Premium, 96.0, 0.015).with_features([VOICE_CLONING]),
        voice("elevenlabs", Premium, 95.0, 0.30).with_features([VOICE_CLONING]),
        voice("cartesia", Premium, 93.0, 0.025).with_features([VOICE_CLONING, LOW_LATENCY]),
        voice("resemble_ai", Premium, 92.0, 0.02).with_features([VOICE_CLONING]),
        voice("chatterbox", Standard, 90.0, 0.0).with_features([VOICE_CLONING, OPEN_SOURCE]),
        ProviderRecord::new("lingua", ProviderCategory::Language, Premium, 95.0, 0.0)
            .with_features([OPEN_SOURCE]),
        ProviderRecord::new("google_cloud", ProviderCategory::Language, Premium, 92.0, 0.00002),
    ]
}

/// Hand-picked video provider for a named use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseRecommendation {
    pub use_case: String,
    pub provider: String,
    pub alternative: String,
    pub reason: String,
}

pub const USE_CASES: [&str; 5] = ["cinematic", "realism", "creative", "volume", "budget"];

/// Unknown use cases get the cinematic pick.
pub fn use_case_recommendation(use_case: &str) -> UseCaseRecommendation {
    let mut normalized = use_case.trim().to_ascii_lowercase();
    let (provider, alternative, reason) = match normalized.as_str() {
        "realism" => (
            "sora_2",
            "veo_3.1",
            "Most physically plausible motion and lighting",
        ),
        "creative" => (
            "runway_gen4",
            "runway_gen3_turbo",
            "Strong stylization at a moderate per-second price",
        ),
        "volume" => (
            "kling_1.6",
            "pika_2.5",
            "Long clips with native audio at a low price",
        ),
        "budget" => (
            "pika_2.5",
            "hunyuan_video",
            "Cheapest hosted option; open-source fallback",
        ),
        _ => {
            normalized = "cinematic".to_string();
            (
                "veo_3.1",
                "runway_gen4",
                "Highest fidelity with native audio and 4K output",
            )
        }
    };
    UseCaseRecommendation {
        use_case: normalized,
        provider: provider.to_string(),
        alternative: alternative.to_string(),
        reason: reason.to_string(),
    }
}

/// Score band each tier is expected to occupy.
pub fn tier_description(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Premium => "Top quality (90-100)",
        QualityTier::Standard => "Good quality (75-89)",
        QualityTier::Budget => "Acceptable quality (60-74)",
        QualityTier::Experimental => "Variable quality",
    }
}
