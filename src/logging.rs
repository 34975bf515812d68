//! Logging System
//!
//! Structured logging on the `tracing` crate with configurable level, format and
//! destination. Library code only emits events; the binary installs the subscriber.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_FILTER_ENV: &str = "REELSMITH_LOG";
pub const LOG_FORMAT_ENV: &str = "REELSMITH_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "REELSMITH_LOG_OUTPUT";

/// `[logging]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off
    pub level: String,
    /// json or text
    pub format: String,
    /// stdout, stderr or file
    pub output: String,
    /// Destination when `output = "file"`
    pub file: PathBuf,
    /// ANSI colors for text written to a terminal stream
    pub color: bool,
    /// Per-module level overrides, e.g. `"reelsmith::provider" = "debug"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            output: "stderr".to_string(),
            file: PathBuf::from("reelsmith.log"),
            color: true,
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogTarget {
    Stdout,
    Stderr,
    File,
}

impl LogTarget {
    fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "stdout" => Ok(LogTarget::Stdout),
            "stderr" => Ok(LogTarget::Stderr),
            "file" => Ok(LogTarget::File),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
                other
            ))),
        }
    }
}

/// Install the global subscriber.
///
/// The `REELSMITH_LOG*` environment variables win over `config`, which already
/// carries any CLI flags; `None` means built-in defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = resolve_filter(config)?;
    // An unusable env format is ignored rather than fatal.
    let format = match std::env::var(LOG_FORMAT_ENV).ok().map(|v| LogFormat::parse(&v)) {
        Some(Ok(format)) => format,
        _ => LogFormat::parse(&config.format)?,
    };
    let target = match std::env::var(LOG_OUTPUT_ENV) {
        Ok(value) => LogTarget::parse(&value)?,
        Err(_) => LogTarget::parse(&config.output)?,
    };

    let writer = match target {
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::File => BoxMakeWriter::new(Mutex::new(open_append(&config.file)?)),
    };

    let subscriber = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color && target != LogTarget::File)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn resolve_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_FILTER_ENV) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    config
        .modules
        .iter()
        .try_fold(EnvFilter::new(&config.level), |filter, (module, level)| {
            let directive = format!("{}={}", module, level)
                .parse::<Directive>()
                .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))?;
            Ok(filter.add_directive(directive))
        })
}

fn open_append(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ApiError::ConfigError(format!("Failed to open log file {}: {}", path.display(), e))
        })
}
