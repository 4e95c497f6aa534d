//! Test fixtures for common types.

use std::sync::{Arc, Once};

use herald_events::{Dispatcher, DispatcherConfig, Envelope, EventName, SubscriberHandle};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Wrap a payload in a propagating envelope.
#[must_use]
pub fn test_envelope<P>(payload: P) -> Envelope<P> {
    Envelope::new(payload)
}

/// A unique event name, so parallel tests never share subscriptions.
#[must_use]
pub fn test_event_name() -> EventName {
    EventName::new(format!("test.event.{}", Uuid::new_v4().simple()))
}

/// A shared subscriber handle with the given name.
#[must_use]
pub fn test_subscriber(name: &str) -> Arc<SubscriberHandle> {
    SubscriberHandle::shared(name)
}

/// An empty dispatcher for `Envelope<P>` events with the default config.
#[must_use]
pub fn test_dispatcher<P: 'static>() -> Dispatcher<Envelope<P>> {
    Dispatcher::new()
}

/// An empty dispatcher that lets handler panics unwind to the caller.
#[must_use]
pub fn test_strict_dispatcher<P: 'static>() -> Dispatcher<Envelope<P>> {
    Dispatcher::with_config(DispatcherConfig::default().without_panic_isolation())
}

static LOGGING: Once = Once::new();

/// Route `tracing` output through the test harness writer.
///
/// Honours `RUST_LOG`, defaulting to `herald_events=trace`. Safe to call
/// from every test.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("herald_events=trace"));
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
