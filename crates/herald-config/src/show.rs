//! Resolved configuration with provenance.

use serde::Serialize;

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// Output format for [`ResolvedConfig::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    /// TOML document.
    #[default]
    Toml,
    /// Pretty-printed JSON.
    Json,
}

/// A loaded configuration plus where each value came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The final, validated configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    pub field_sources: FieldSources,
    /// Files that contributed, lowest precedence first.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// The layer that set `field`, if it is known.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// Render the effective configuration.
    ///
    /// Serialization of these plain types does not fail in practice; the
    /// error text is returned in place of the document if it ever does.
    #[must_use]
    pub fn render(&self, format: ShowFormat) -> String {
        let rendered = match format {
            ShowFormat::Toml => toml::to_string_pretty(&self.config).map_err(|e| e.to_string()),
            ShowFormat::Json => {
                serde_json::to_string_pretty(&self.config).map_err(|e| e.to_string())
            },
        };
        rendered.unwrap_or_else(|e| format!("<failed to render config: {e}>"))
    }
}
