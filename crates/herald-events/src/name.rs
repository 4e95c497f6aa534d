//! Event names: the keys under which subscriptions are grouped.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Any value usable as an event name.
///
/// The catalog only needs equality and hashing, so typed enums work just as
/// well as [`EventName`]. The bound is blanket-implemented; there is nothing
/// to implement by hand.
pub trait EventKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> EventKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// A string event name.
///
/// ```rust
/// use herald_events::EventName;
///
/// let name = EventName::from("custom_data_changed");
/// assert_eq!(name.as_str(), "custom_data_changed");
/// assert_eq!(name.to_string(), "custom_data_changed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// Create an event name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the name, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
