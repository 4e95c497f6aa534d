//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_config::prelude::*;` to load and inspect configuration.

pub use crate::{Config, ConfigError, ConfigResult, DispatcherSection, LoggingSection};

pub use crate::{ConfigLayer, ResolvedConfig, ShowFormat};
