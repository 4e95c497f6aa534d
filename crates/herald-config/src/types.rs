//! Configuration types.
//!
//! These types have no dependency on the other herald crates; conversion to
//! runtime types happens at the boundary (see the `config` feature of
//! `herald-events` and `herald-telemetry`). Every struct implements
//! [`Default`], so a bare `[section]` header produces a working
//! configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatcher behaviour.
    pub dispatcher: DispatcherSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Dispatcher behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSection {
    /// Reset an event's propagation flag at the start of every dispatch.
    pub reset_propagation: bool,
    /// Catch handler panics and keep delivering.
    pub isolate_panics: bool,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            reset_propagation: true,
            isolate_panics: true,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["herald_events=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
