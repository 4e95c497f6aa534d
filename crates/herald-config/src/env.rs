//! Environment variable fallbacks.
//!
//! `HERALD_*` variables only fill fields that no config file set. An
//! explicit value in a user or workspace file always wins.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Prefix for every environment variable this crate reads.
pub const ENV_PREFIX: &str = "HERALD_";

/// Environment variable to dotted config path.
const ENV_FALLBACKS: &[(&str, &str)] = &[
    ("HERALD_LOG_LEVEL", "logging.level"),
    ("HERALD_LOG_FORMAT", "logging.format"),
];

/// Snapshot the process environment, keeping only `HERALD_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply env fallbacks to fields still at their default.
///
/// Returns how many fields were set.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied = 0_usize;

    for (var, path) in ENV_FALLBACKS {
        let Some(value) = env_vars.get(*var) else {
            continue;
        };
        if sources
            .get(*path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }
        if set_path(merged, path, toml::Value::String(value.clone())) {
            sources.insert((*path).to_owned(), ConfigLayer::Environment);
            debug!(var, path, "applied environment fallback");
            applied = applied.saturating_add(1);
        }
    }

    applied
}

/// Set a dotted path, creating intermediate tables. Returns `false` if a
/// non-table value is in the way.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return true;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    false
}
