//! Shared presentation helpers: json rendering, table setup, colored labels.

use crate::error::ApiError;
use crate::provider::QualityTier;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::OutputError(e.to_string()))
}

pub fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table
}

pub fn tier_label(tier: QualityTier) -> String {
    match tier {
        QualityTier::Premium => tier.as_str().green().to_string(),
        QualityTier::Standard => tier.as_str().yellow().to_string(),
        QualityTier::Budget | QualityTier::Experimental => tier.as_str().dimmed().to_string(),
    }
}

pub fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}

pub fn money(value: f64) -> String {
    format!("${:.2}", value)
}
