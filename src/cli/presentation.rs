//! CLI presentation: text and json formatters per command family.

mod generation;
mod provider;
mod shared;

pub use generation::{format_plan, format_recommendation, format_use_case};
pub use provider::{
    format_provider_chains, format_provider_comparison, format_provider_list,
    format_provider_show, format_provider_stats,
};
pub use shared::{is_json, to_json};
