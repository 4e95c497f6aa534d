//! Herald Events - in-process publish/subscribe dispatch.
//!
//! This crate provides:
//! - A weighted subscription catalog keyed by event name
//! - A synchronous dispatcher with ordered delivery and stop-propagation
//! - Weak subscriber references, so dropped subscribers retire on their own
//! - Scoped subscriptions that unsubscribe when their guard is dropped
//!
//! # Architecture
//!
//! Subscribers are owned by the application as `Arc`s and identified by a
//! [`SubscriberId`]. They register `(event name, weight, handler)` with a
//! [`Dispatcher`]. Publishing an event walks a snapshot of that name's
//! subscriptions in ascending weight order:
//!
//! 1. Subscriptions whose subscriber is gone are skipped and evicted.
//! 2. Live handlers run one after another on the calling thread.
//! 3. A handler that calls [`Event::stop_propagation`] ends the walk.
//!
//! # Example
//!
//! ```rust
//! use herald_events::{Dispatcher, Envelope, Event, SubscriberHandle};
//!
//! let dispatcher: Dispatcher<Envelope<String>> = Dispatcher::new();
//!
//! let audit = SubscriberHandle::shared("audit");
//! let guard = SubscriberHandle::shared("guard");
//!
//! dispatcher.subscribe(&audit, "document_saved", 10, |event| {
//!     event.push_str(" audited");
//! });
//! dispatcher.subscribe(&guard, "document_saved", -10, |event| {
//!     if event.starts_with("secret") {
//!         event.stop_propagation();
//!     }
//! });
//!
//! let mut event = Envelope::new("report".to_string());
//! dispatcher.dispatch(&mut event, "document_saved");
//! assert_eq!(event.payload(), "report audited");
//!
//! let mut event = Envelope::new("secret plans".to_string());
//! dispatcher.dispatch(&mut event, "document_saved");
//! assert_eq!(event.payload(), "secret plans");
//!
//! // Dropping a subscriber retires its subscriptions.
//! drop(audit);
//! let mut event = Envelope::new("memo".to_string());
//! dispatcher.dispatch(&mut event, "document_saved");
//! assert_eq!(event.payload(), "memo");
//! assert_eq!(dispatcher.subscription_count("document_saved"), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod catalog;
mod config;
mod dispatcher;
mod event;
mod guard;
mod name;
mod subscriber;
mod subscription;

pub use catalog::{Catalog, InsertOutcome};
pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, WeakDispatcher};
pub use event::{Envelope, Event, NamedEvent};
pub use guard::SubscriptionGuard;
pub use name::{EventKey, EventName};
pub use subscriber::{Subscriber, SubscriberExt, SubscriberHandle, SubscriberId};
pub use subscription::{DEFAULT_WEIGHT, Handler, OrderKey, Subscription, SubscriptionKey, Weight};
