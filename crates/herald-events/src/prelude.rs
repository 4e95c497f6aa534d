//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use herald_events::prelude::*;
//!
//! let dispatcher: Dispatcher<Envelope<u32>> = Dispatcher::new();
//! let counter = SubscriberHandle::shared("counter");
//!
//! counter.subscribe_to(&dispatcher, "tick", DEFAULT_WEIGHT, |event| **event += 1);
//!
//! let mut event = Envelope::new(0);
//! dispatcher.dispatch(&mut event, "tick");
//! assert_eq!(*event, 1);
//! ```

// Dispatcher
pub use crate::{Dispatcher, DispatcherConfig, SubscriptionGuard, WeakDispatcher};

// Events
pub use crate::{Envelope, Event, EventKey, EventName, NamedEvent};

// Subscribers and subscriptions
pub use crate::{
    DEFAULT_WEIGHT, Subscriber, SubscriberExt, SubscriberHandle, SubscriberId, SubscriptionKey,
    Weight,
};
