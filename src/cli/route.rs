//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, ProviderCommands, RequestArgs};
use crate::cli::presentation::{
    format_plan, format_provider_chains, format_provider_comparison, format_provider_list,
    format_provider_show, format_provider_stats, format_recommendation, format_use_case,
    is_json, to_json,
};
use crate::config::{ConfigLoader, ReelsmithConfig};
use crate::error::ApiError;
use crate::generation::{enrich_prompt, recommend, GenerationRequest, PlanBuilder};
use crate::provider::catalog::use_case_recommendation;
use crate::provider::commands::ProviderCommandService;
use crate::provider::{PassthroughEnricher, ProviderRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runtime context for CLI execution: loaded configuration and the provider registry.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    registry: Arc<ProviderRegistry>,
    config: ReelsmithConfig,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::from_config(workspace_root, config)
    }

    pub fn from_config(workspace_root: PathBuf, config: ReelsmithConfig) -> Result<Self, ApiError> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.catalog)?);
        debug!(providers = registry.len(), "registry_loaded");
        Ok(Self {
            registry,
            config,
            workspace_root,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ReelsmithConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let name = command_name(command);
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = %name, duration_ms, "command_completed"),
            Err(err) => warn!(command = %name, duration_ms, error = %err, "command_failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Providers { command } => self.handle_providers(command),
            Commands::Recommend { request, format } => {
                let request = build_request(request);
                let result = recommend(&self.registry, &self.config.selection, &request)?;
                format_recommendation(&result, format)
            }
            Commands::Plan { request, format } => {
                let request = build_request(request).validated()?;
                let enriched = enrich_prompt(&PassthroughEnricher, &request).await;
                let plan = PlanBuilder::new(&self.registry, &self.config.selection)
                    .build(request, enriched)?;
                format_plan(&plan, format)
            }
            Commands::UseCase { name, format } => {
                format_use_case(&use_case_recommendation(name), format)
            }
            Commands::Config { format } => self.handle_config(format),
        }
    }

    fn handle_providers(&self, command: &ProviderCommands) -> Result<String, ApiError> {
        let registry = self.registry.as_ref();
        match command {
            ProviderCommands::List {
                format,
                category,
                tier,
                available,
            } => {
                let result = ProviderCommandService::run_list(
                    registry,
                    category.as_deref(),
                    tier.as_deref(),
                    *available,
                )?;
                format_provider_list(&result, format)
            }
            ProviderCommands::Show { name, format } => {
                format_provider_show(&ProviderCommandService::run_show(registry, name)?, format)
            }
            ProviderCommands::Chains { format } => {
                format_provider_chains(&ProviderCommandService::run_chains(registry), format)
            }
            ProviderCommands::Stats { name, format } => format_provider_stats(
                &ProviderCommandService::run_stats(registry, name.as_deref())?,
                format,
            ),
            ProviderCommands::Compare {
                names,
                duration,
                prompt_chars,
                format,
            } => format_provider_comparison(
                &ProviderCommandService::run_compare(registry, names, *duration, *prompt_chars),
                format,
            ),
        }
    }

    fn handle_config(&self, format: &str) -> Result<String, ApiError> {
        if is_json(format) {
            return to_json(&self.config);
        }
        let body = toml::to_string_pretty(&self.config)
            .map_err(|e| ApiError::OutputError(e.to_string()))?;
        Ok(format!(
            "# effective configuration for {}\n{}",
            self.workspace_root.display(),
            body
        ))
    }
}

fn build_request(args: &RequestArgs) -> GenerationRequest {
    let mut request = GenerationRequest::new(args.prompt.clone())
        .with_duration(args.duration)
        .with_aspect_ratio(args.aspect_ratio.clone())
        .with_resolution(args.resolution.clone());
    if let Some(voice_id) = &args.voice_id {
        request = request.with_voice_id(voice_id.clone());
    }
    if let Some(style) = &args.style {
        request = request.with_style(style.clone());
    }
    if args.no_detect_language {
        request = request.without_language_detection();
    }
    request
}
