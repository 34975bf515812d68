//! Configuration loader: merges every source into one validated [`ReelsmithConfig`].

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::ReelsmithConfig;
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<ReelsmithConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder, None)
    }

    /// Load configuration from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<ReelsmithConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true));
        Self::finish(builder, None)
    }

    /// Load from an explicit file with a fixed set of environment variables
    /// instead of the process environment.
    pub fn load_with_env(
        path: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> Result<ReelsmithConfig, ApiError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::finish(builder, Some(vars))
    }

    /// Built-in defaults only.
    pub fn default() -> ReelsmithConfig {
        ReelsmithConfig::default()
    }

    fn finish(
        builder: ConfigBuilder<DefaultState>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<ReelsmithConfig, ApiError> {
        let config: ReelsmithConfig = builder
            .add_source(environment::environment(vars))
            .build()?
            .try_deserialize()?;
        debug!(
            extra_providers = config.catalog.providers.len(),
            disabled = config.catalog.disabled.len(),
            "config_loaded"
        );
        config.validated()
    }
}
