//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, provider_command_name};
pub use output::map_error;
pub use parse::{Cli, Commands, ProviderCommands, RequestArgs};
pub use presentation::{
    format_plan, format_provider_chains, format_provider_comparison, format_provider_list,
    format_provider_show, format_provider_stats, format_recommendation, format_use_case,
};
pub use route::RunContext;
