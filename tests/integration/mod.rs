mod config_integration;
mod pipeline_lifecycle;
mod provider_admin;
pub mod test_utils;
