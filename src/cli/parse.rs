//! CLI parse: clap types for Reelsmith. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reelsmith CLI - multi-provider prompt-to-video planning
#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(about = "Inspect providers and plan prompt-to-video generation jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where reelsmith.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the provider registry
    Providers {
        #[command(subcommand)]
        command: ProviderCommands,
    },
    /// Rank providers for a prompt with estimated costs
    Recommend {
        #[command(flatten)]
        request: RequestArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Build the generation plan a prompt would run with
    Plan {
        #[command(flatten)]
        request: RequestArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the recommended video provider for a use case
    UseCase {
        /// cinematic, realism, creative, volume or budget
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Generation request fields shared by `plan` and `recommend`.
#[derive(clap::Args, Debug, Clone)]
pub struct RequestArgs {
    /// Prompt text to narrate and visualize
    pub prompt: String,
    /// Clip length in seconds
    #[arg(long, default_value = "8")]
    pub duration: u32,
    /// Cloned voice to narrate with
    #[arg(long)]
    pub voice_id: Option<String>,
    /// Aspect ratio as W:H
    #[arg(long, default_value = "16:9")]
    pub aspect_ratio: String,
    /// Output resolution
    #[arg(long, default_value = "720p")]
    pub resolution: String,
    /// Visual style hint for the prompt enricher
    #[arg(long)]
    pub style: Option<String>,
    /// Skip the language detection stage
    #[arg(long)]
    pub no_detect_language: bool,
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// List registered providers
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Filter by category (video, voice, language)
        #[arg(long)]
        category: Option<String>,
        /// Filter by quality tier (premium, standard, budget, experimental)
        #[arg(long)]
        tier: Option<String>,
        /// Only list available providers
        #[arg(long)]
        available: bool,
    },
    /// Show one provider with health and chain position
    Show {
        /// Provider name
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the fallback chain of every category
    Chains {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show usage statistics
    Stats {
        /// Limit to one provider
        name: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compare providers by quality and estimated cost
    Compare {
        /// Provider names
        #[arg(required = true)]
        names: Vec<String>,
        /// Clip length in seconds used for video estimates
        #[arg(long, default_value = "8")]
        duration: u32,
        /// Prompt length in characters used for voice estimates
        #[arg(long, default_value = "500")]
        prompt_chars: usize,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
