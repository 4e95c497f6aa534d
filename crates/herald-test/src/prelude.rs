//! Prelude module - commonly used test helpers.
//!
//! Use `use herald_test::prelude::*;` in test modules.

pub use crate::{Call, CallLog, RecordingSubscriber};

pub use crate::{
    init_test_logging, test_dispatcher, test_envelope, test_event_name, test_strict_dispatcher,
    test_subscriber,
};
