//! Environment overrides: `REELSMITH__JOBS__TTL_SECS=60` sets `jobs.ttl_secs`.

use config::Environment;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "REELSMITH";

/// Environment source reading the process environment, or `vars` when given.
pub fn environment(vars: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("catalog.disabled")
        .source(vars)
}
