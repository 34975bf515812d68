//! CLI command-name contract for logging and routing.

use crate::cli::parse::{Commands, ProviderCommands};

/// Command name string for log spans (e.g. "providers.list", "plan").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Providers { command } => format!("providers.{}", provider_command_name(command)),
        Commands::Recommend { .. } => "recommend".to_string(),
        Commands::Plan { .. } => "plan".to_string(),
        Commands::UseCase { .. } => "use_case".to_string(),
        Commands::Config { .. } => "config".to_string(),
    }
}

pub fn provider_command_name(command: &ProviderCommands) -> &'static str {
    match command {
        ProviderCommands::List { .. } => "list",
        ProviderCommands::Show { .. } => "show",
        ProviderCommands::Chains { .. } => "chains",
        ProviderCommands::Stats { .. } => "stats",
        ProviderCommands::Compare { .. } => "compare",
    }
}
