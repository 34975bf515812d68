//! Configuration files driving the provider catalog and the CLI run context.

use reelsmith::cli::{Commands, ProviderCommands, RunContext};
use reelsmith::config::WORKSPACE_CONFIG_FILE;
use reelsmith::{ApiError, ConfigLoader, ProviderCategory, ProviderRegistry};
use std::collections::HashMap;
use tempfile::TempDir;

const CUSTOM_CATALOG: &str = r#"
[selection]
video_min_quality = 85

[catalog]
include_defaults = false
disabled = ["budget_cut"]

[[catalog.providers]]
name = "house_video"
category = "video"
quality_tier = "premium"
quality_score = 91
cost_per_unit = 0.3
max_duration = 30
features = ["native_audio"]

[[catalog.providers]]
name = "budget_cut"
category = "video"
quality_tier = "budget"
quality_score = 70
cost_per_unit = 0.02
max_duration = 10

[[catalog.providers]]
name = "house_voice"
category = "voice"
quality_tier = "standard"
quality_score = 88
cost_per_unit = 0.1
"#;

fn write_workspace(contents: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(WORKSPACE_CONFIG_FILE), contents).unwrap();
    temp_dir
}

#[test]
fn catalog_from_file_replaces_the_defaults() {
    let workspace = write_workspace(CUSTOM_CATALOG);
    let path = workspace.path().join(WORKSPACE_CONFIG_FILE);
    let config = ConfigLoader::load_with_env(Some(&path), HashMap::new()).unwrap();
    assert_eq!(config.selection.video_min_quality, 85.0);

    let registry = ProviderRegistry::from_config(&config.catalog).unwrap();
    assert_eq!(registry.len(), 3);
    assert!(!registry.get("budget_cut").unwrap().is_available);
    assert!(registry.get("veo_3.1").is_none());
    assert_eq!(
        registry.fallback_chain(ProviderCategory::Video, None),
        vec!["house_video", "budget_cut"]
    );
    assert!(registry
        .fallback_chain(ProviderCategory::Language, None)
        .is_empty());
}

#[test]
fn disabled_names_must_exist() {
    let workspace = write_workspace(
        "[catalog]\ninclude_defaults = false\ndisabled = [\"nobody\"]\n",
    );
    let path = workspace.path().join(WORKSPACE_CONFIG_FILE);
    let config = ConfigLoader::load_with_env(Some(&path), HashMap::new()).unwrap();
    assert!(matches!(
        ProviderRegistry::from_config(&config.catalog),
        Err(ApiError::ConfigError(_))
    ));
}

#[test]
fn invalid_provider_records_fail_loading() {
    let workspace = write_workspace(
        r#"
[[catalog.providers]]
name = "overclocked"
category = "video"
quality_tier = "premium"
quality_score = 140
cost_per_unit = 0.3
"#,
    );
    let path = workspace.path().join(WORKSPACE_CONFIG_FILE);
    match ConfigLoader::load_with_env(Some(&path), HashMap::new()) {
        Err(ApiError::ConfigError(message)) => assert!(message.contains("overclocked")),
        other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_explicit_config_is_an_error() {
    let workspace = TempDir::new().unwrap();
    let missing = workspace.path().join("absent.toml");
    assert!(matches!(
        RunContext::new(workspace.path().to_path_buf(), Some(missing)),
        Err(ApiError::ConfigError(_))
    ));
}

#[tokio::test]
async fn cli_lists_the_configured_catalog() {
    let workspace = write_workspace(CUSTOM_CATALOG);
    let path = workspace.path().join(WORKSPACE_CONFIG_FILE);
    let context = RunContext::new(workspace.path().to_path_buf(), Some(path)).unwrap();

    let output = context
        .execute(&Commands::Providers {
            command: ProviderCommands::List {
                format: "json".to_string(),
                category: Some("video".to_string()),
                tier: None,
                available: true,
            },
        })
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["providers"][0]["name"], "house_video");

    let chains = context
        .execute(&Commands::Providers {
            command: ProviderCommands::Chains {
                format: "text".to_string(),
            },
        })
        .await
        .unwrap();
    assert!(chains.contains("house_video -> budget_cut"));
}
