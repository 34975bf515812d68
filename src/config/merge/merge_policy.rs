//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources replace earlier values key by key. Arrays such as
//! `catalog.providers` are replaced wholesale, never concatenated.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("selection.video_min_quality", 80.0)?
        .set_default("selection.video_relaxed_min_quality", 75.0)?
        .set_default("selection.voice_min_quality", 85.0)?
        .set_default("selection.language_min_quality", 80.0)?
        .set_default("jobs.ttl_secs", 3600)?
        .set_default("jobs.progress_capacity", 64)?
        .set_default("catalog.include_defaults", true)
}
