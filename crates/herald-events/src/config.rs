//! Dispatcher behaviour switches.

use serde::{Deserialize, Serialize};

/// Runtime options for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Reset the event's propagation flag to `true` at the start of every
    /// dispatch call, so a reused event cannot inherit a stop from an
    /// earlier call.
    pub reset_propagation: bool,
    /// Catch a panicking handler, log it and carry on with the next
    /// subscription. When off, the panic unwinds out of `dispatch`.
    pub isolate_panics: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            reset_propagation: true,
            isolate_panics: true,
        }
    }
}

impl DispatcherConfig {
    /// Keep whatever propagation state the caller hands in.
    #[must_use]
    pub fn without_propagation_reset(mut self) -> Self {
        self.reset_propagation = false;
        self
    }

    /// Let handler panics unwind to the caller.
    #[must_use]
    pub fn without_panic_isolation(mut self) -> Self {
        self.isolate_panics = false;
        self
    }
}

#[cfg(feature = "config")]
impl From<&herald_config::DispatcherSection> for DispatcherConfig {
    fn from(section: &herald_config::DispatcherSection) -> Self {
        Self {
            reset_propagation: section.reset_propagation,
            isolate_panics: section.isolate_panics,
        }
    }
}
