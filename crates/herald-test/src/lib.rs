//! Herald Test - shared test utilities for herald crates.
//!
//! Recording subscribers and fixtures for exercising a
//! [`Dispatcher`](herald_events::Dispatcher) in tests.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! herald-test.workspace = true
//! ```
//!
//! ```rust
//! use herald_test::{CallLog, RecordingSubscriber, test_dispatcher, test_envelope};
//!
//! let dispatcher = test_dispatcher::<u32>();
//! let log = CallLog::new();
//! let first = RecordingSubscriber::shared("first", &log);
//! let second = RecordingSubscriber::shared("second", &log);
//!
//! dispatcher.subscribe(&second, "tick", 5, second.recorder());
//! dispatcher.subscribe(&first, "tick", -5, first.recorder());
//!
//! dispatcher.dispatch(&mut test_envelope(1), "tick");
//! assert_eq!(log.labels(), ["first", "second"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
