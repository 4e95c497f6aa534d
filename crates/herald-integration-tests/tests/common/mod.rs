//! Shared harness for integration tests.

use std::sync::Arc;

use herald_events::{Dispatcher, Envelope, Event, Weight};
use herald_test::{CallLog, RecordingSubscriber, init_test_logging};

/// Events used across the suites: a list of labels handlers append to.
pub type Trail = Envelope<Vec<String>>;

/// A dispatcher plus a shared call log, with tracing routed to the test
/// writer.
#[allow(dead_code)]
pub struct Harness {
    /// The dispatcher under test.
    pub dispatcher: Dispatcher<Trail>,
    /// Every recorder created by this harness writes here.
    pub log: CallLog,
}

#[allow(dead_code)]
impl Harness {
    /// A harness with the default dispatcher configuration.
    pub fn new() -> Self {
        Self::with_dispatcher(Dispatcher::new())
    }

    /// A harness around an existing dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher<Trail>) -> Self {
        init_test_logging();
        Self {
            dispatcher,
            log: CallLog::new(),
        }
    }

    /// A recording subscriber writing to this harness's log.
    pub fn subscriber(&self, name: &str) -> Arc<RecordingSubscriber> {
        RecordingSubscriber::shared(name, &self.log)
    }

    /// Subscribe `sub` to `event` at `weight` with a recording handler.
    pub fn listen(&self, sub: &Arc<RecordingSubscriber>, event: &str, weight: Weight) {
        self.dispatcher
            .subscribe(sub, event, weight, sub.recorder());
    }

    /// Subscribe `sub` to `event` at `weight` with a handler that records and
    /// then stops propagation.
    pub fn listen_and_stop(&self, sub: &Arc<RecordingSubscriber>, event: &str, weight: Weight) {
        self.dispatcher.subscribe(sub, event, weight, sub.stopper());
    }

    /// Dispatch a fresh event to `event` and return it.
    pub fn fire(&self, event: &str) -> Trail {
        let mut trail = Trail::default();
        self.dispatcher.dispatch(&mut trail, event);
        trail
    }

    /// Labels recorded so far.
    pub fn labels(&self) -> Vec<String> {
        self.log.labels()
    }
}

/// A handler that appends `label` to the event's trail.
#[allow(dead_code)]
pub fn append(label: &'static str) -> impl Fn(&mut Trail) + Send + Sync + 'static {
    move |event: &mut Trail| event.push(label.to_owned())
}

/// A handler that appends `label` and stops propagation.
#[allow(dead_code)]
pub fn append_and_stop(label: &'static str) -> impl Fn(&mut Trail) + Send + Sync + 'static {
    move |event: &mut Trail| {
        event.push(label.to_owned());
        event.stop_propagation();
    }
}
