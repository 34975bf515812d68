//! Provider administration through the service: selection, health, availability,
//! recommendations, comparison, and voice cloning.

use crate::integration::test_utils::*;
use reelsmith::provider::{ListFilter, SelectionCriteria};
use reelsmith::{ApiError, GenerationRequest, ProviderCategory, QualityTier};
use std::sync::Arc;

#[test]
fn best_respects_availability_and_quality_floor() {
    let registry = small_registry();
    let criteria = SelectionCriteria::new().min_quality(92.0);

    let best = registry.best(ProviderCategory::Video, &criteria).unwrap();
    assert_eq!(best.name, "alpha_video");

    registry.set_availability("alpha_video", false).unwrap();
    assert!(registry.best(ProviderCategory::Video, &criteria).is_none());
    let relaxed = SelectionCriteria::new().min_quality(85.0);
    assert_eq!(
        registry.best(ProviderCategory::Video, &relaxed).unwrap().name,
        "beta_video"
    );
}

#[test]
fn availability_toggles_leave_chains_intact() {
    let service = healthy_service();
    service.set_availability("alpha_video", false).unwrap();

    let chains = service.fallback_chains();
    assert_eq!(chains[&ProviderCategory::Video], vec!["alpha_video", "beta_video"]);
    assert_eq!(chains[&ProviderCategory::Voice], vec!["alpha_voice", "beta_voice"]);

    let available = service.list_providers(&ListFilter {
        category: Some(ProviderCategory::Video),
        available_only: true,
        ..ListFilter::default()
    });
    let names: Vec<&str> = available.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["beta_video"]);

    assert!(matches!(
        service.set_availability("ghost", true),
        Err(ApiError::ProviderNotFound(_))
    ));
}

#[test]
fn list_filters_by_tier() {
    let service = healthy_service();
    let premium = service.list_providers(&ListFilter {
        tier: Some(QualityTier::Premium),
        ..ListFilter::default()
    });
    let names: Vec<&str> = premium.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha_video", "alpha_voice", "alpha_lang"]);
}

#[tokio::test]
async fn health_reflects_recorded_attempts() {
    let service = healthy_service();
    let fresh = service.provider_health("alpha_video").unwrap();
    assert_eq!(fresh.total_requests, 0);
    assert_eq!(fresh.success_rate, 1.0);
    assert!(fresh.last_checked.is_none());

    service
        .generate(GenerationRequest::new(PROMPT))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let health = service.provider_health("alpha_video").unwrap();
    assert_eq!(health.total_requests, 1);
    assert_eq!(health.success_rate, 1.0);
    assert!(health.avg_latency_ms.is_some());
    assert!(health.last_checked.is_some());

    let stats = service.usage_stats();
    assert_eq!(stats["alpha_video"].successful_requests, 1);
    assert!(!stats.contains_key("beta_video"));
}

#[test]
fn detail_reports_chain_position() {
    let service = healthy_service();
    let detail = service.provider_detail("beta_video").unwrap();
    assert_eq!(detail.record.quality_tier, QualityTier::Standard);
    assert_eq!(detail.chain_position, Some(2));
    assert_eq!(detail.usage.total_requests, 0);
    assert!(matches!(
        service.provider_detail("ghost"),
        Err(ApiError::ProviderNotFound(_))
    ));
}

#[test]
fn recommend_does_not_touch_usage() {
    let service = healthy_service();
    let request = GenerationRequest::new(PROMPT).with_duration(10);

    let recommendation = service.recommend(&request).unwrap();
    let videos: Vec<&str> = recommendation.video.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(videos, vec!["alpha_video", "beta_video"]);
    assert!(recommendation.video.iter().all(|c| c.covers_duration));

    let best = recommendation.best.unwrap();
    assert_eq!(best.video, "alpha_video");
    assert_eq!(best.voice, "alpha_voice");
    assert_eq!(best.language.as_deref(), Some("alpha_lang"));
    assert!(!best.needs_audio_merge);

    assert!(service.usage_stats().is_empty());
}

#[test]
fn recommend_without_voices_has_no_combination() {
    let service = healthy_service();
    service.set_availability("alpha_voice", false).unwrap();
    service.set_availability("beta_voice", false).unwrap();

    let recommendation = service.recommend(&GenerationRequest::new(PROMPT)).unwrap();
    assert!(recommendation.voice.is_empty());
    assert_eq!(recommendation.video.len(), 2);
    assert!(recommendation.best.is_none());
}

#[test]
fn compare_picks_quality_and_value_leaders() {
    let service = healthy_service();
    let names: Vec<String> = ["beta_voice", "alpha_video", "nope"]
        .iter()
        .map(|n| n.to_string())
        .collect();

    let comparison = service.compare_providers(&names, 10, 1000);
    let ranked: Vec<&str> = comparison.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(ranked, vec!["alpha_video", "beta_voice"]);
    assert_eq!(comparison.entries[0].estimated_cost, 5.0);
    assert_eq!(comparison.entries[1].estimated_cost, 0.05);
    assert_eq!(comparison.unknown, vec!["nope"]);
    assert_eq!(comparison.best_quality.as_deref(), Some("alpha_video"));
    assert_eq!(comparison.best_value.as_deref(), Some("beta_voice"));
}

#[tokio::test]
async fn clone_voice_uses_a_cloning_provider() {
    let service = healthy_service();
    let cloned = service.clone_voice(b"pcm", "narrator").await.unwrap();
    assert_eq!(cloned.provider, "alpha_voice");
    assert_eq!(cloned.voice_id, "alpha_voice:narrator:3");

    let stats = service.usage_stats();
    assert_eq!(stats["alpha_voice"].successful_requests, 1);
    assert_eq!(stats["alpha_voice"].total_cost, 0.0);
}

#[tokio::test]
async fn clone_voice_never_falls_back_to_non_cloning_providers() {
    let clients = healthy_clients()
        .with_voice("alpha_voice", Arc::new(ScriptedVoice::new("alpha_voice").failing()));
    let service = service_with(small_registry(), clients, Arc::default());

    let err = service.clone_voice(b"pcm", "narrator").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Speech generation failed: Provider rejected request: sample too short"
    );
    assert!(!service.usage_stats().contains_key("beta_voice"));
}

#[tokio::test]
async fn clone_voice_validates_its_inputs() {
    let service = healthy_service();
    assert!(matches!(
        service.clone_voice(b"", "narrator").await,
        Err(ApiError::InvalidRequest(_))
    ));
    assert!(matches!(
        service.clone_voice(b"pcm", "  ").await,
        Err(ApiError::InvalidRequest(_))
    ));

    service.set_availability("alpha_voice", false).unwrap();
    assert!(matches!(
        service.clone_voice(b"pcm", "narrator").await,
        Err(ApiError::ChainExhausted { .. })
    ));
}
