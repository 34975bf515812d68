//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output, with a hint where the
/// fix is usually a configuration change.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::NoProviderAvailable(category) => format!(
            "{}\n\nEnable a {} provider or lower the selection floors in reelsmith.toml.",
            e, category
        ),
        ApiError::ProviderNotFound(_) => {
            format!("{}\n\nUse 'reelsmith providers list' to see registered providers.", e)
        }
        _ => e.to_string(),
    }
}
