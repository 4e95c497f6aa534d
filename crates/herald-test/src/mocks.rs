//! Recording subscribers for asserting delivery order.

use std::sync::{Arc, Mutex, MutexGuard};

use herald_events::{Event, Subscriber, SubscriberId};

/// One handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Label of the handler that ran.
    pub label: String,
    /// Whether the event was still propagating when the handler was entered.
    pub propagating: bool,
}

/// Shared, ordered record of handler invocations.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, label: impl Into<String>, propagating: bool) {
        self.lock().push(Call {
            label: label.into(),
            propagating,
        });
    }

    /// All calls so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Labels of all calls so far, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.label.clone()).collect()
    }

    /// Number of calls recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        // A panicking handler under test must not hide the calls before it.
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// A subscriber whose handlers append to a [`CallLog`].
#[derive(Debug)]
pub struct RecordingSubscriber {
    id: SubscriberId,
    name: String,
    log: CallLog,
}

impl RecordingSubscriber {
    /// Create a recording subscriber writing to `log` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            id: SubscriberId::new(),
            name: name.into(),
            log: log.clone(),
        }
    }

    /// [`new`](Self::new), wrapped in an `Arc` ready to subscribe.
    #[must_use]
    pub fn shared(name: impl Into<String>, log: &CallLog) -> Arc<Self> {
        Arc::new(Self::new(name, log))
    }

    /// The log this subscriber writes to.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// A handler that records this subscriber's name.
    pub fn recorder<E: Event + 'static>(&self) -> impl Fn(&mut E) + Send + Sync + 'static {
        self.recorder_labelled(self.name.clone())
    }

    /// A handler that records `label`, for subscribers registered at several
    /// weights.
    pub fn recorder_labelled<E: Event + 'static>(
        &self,
        label: impl Into<String>,
    ) -> impl Fn(&mut E) + Send + Sync + 'static {
        let log = self.log.clone();
        let label = label.into();
        move |event: &mut E| log.record(label.clone(), event.propagates())
    }

    /// A handler that records this subscriber's name, then stops propagation.
    pub fn stopper<E: Event + 'static>(&self) -> impl Fn(&mut E) + Send + Sync + 'static {
        let log = self.log.clone();
        let label = self.name.clone();
        move |event: &mut E| {
            log.record(label.clone(), event.propagates());
            event.stop_propagation();
        }
    }
}

impl Subscriber for RecordingSubscriber {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
