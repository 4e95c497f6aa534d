//! The subscriber capability: a stable identity the dispatcher can observe
//! without owning.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::event::Event;
use crate::name::EventKey;
use crate::subscription::Weight;

/// Stable identity of a subscriber.
///
/// Assigned once when the subscriber is created and never derived from its
/// memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Allocate a fresh subscriber ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything that can own subscriptions.
///
/// Subscribers live in an `Arc` owned by the application. The dispatcher
/// keeps only a `Weak` reference, so dropping the last `Arc` is enough to
/// retire every subscription the subscriber holds; stale entries are evicted
/// the next time the dispatcher walks past them.
pub trait Subscriber: Send + Sync {
    /// The subscriber's stable identity.
    fn subscriber_id(&self) -> SubscriberId;

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// A ready-made subscriber that is nothing but an identity and a name.
///
/// Useful when the component that subscribes has no natural type of its own
/// to implement [`Subscriber`] on: hold the `Arc` for as long as the
/// subscriptions should stay active.
#[derive(Debug)]
pub struct SubscriberHandle {
    id: SubscriberId,
    name: String,
}

impl SubscriberHandle {
    /// Create a handle with a fresh identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SubscriberId::new(),
            name: name.into(),
        }
    }

    /// Create a handle already wrapped in an `Arc`.
    #[must_use]
    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    /// This handle's identity.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Subscriber for SubscriberHandle {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Subscriber-side conveniences for working with a [`Dispatcher`].
///
/// ```rust
/// use herald_events::{Dispatcher, Envelope, EventName, SubscriberExt, SubscriberHandle};
///
/// let dispatcher: Dispatcher<Envelope<()>> = Dispatcher::new();
/// let me = SubscriberHandle::shared("me");
///
/// me.subscribe_to(&dispatcher, "created", 0, |_event| {});
/// me.subscribe_to(&dispatcher, "changed", 0, |_event| {});
/// assert_eq!(dispatcher.event_count(), 2);
///
/// me.unsubscribe_from_all(&dispatcher);
/// assert_eq!(dispatcher.subscription_count("created"), 0);
/// assert_eq!(dispatcher.subscription_count("changed"), 0);
/// ```
pub trait SubscriberExt {
    /// Subscribe this subscriber to `name` at `weight`.
    fn subscribe_to<E, N, F>(
        &self,
        dispatcher: &Dispatcher<E, N>,
        name: impl Into<N>,
        weight: Weight,
        handler: F,
    ) where
        E: Event + 'static,
        N: EventKey,
        F: Fn(&mut E) + Send + Sync + 'static;

    /// Remove this subscriber's subscriptions for one event name.
    fn unsubscribe_from<E, N, Q>(&self, dispatcher: &Dispatcher<E, N>, name: &Q)
    where
        E: Event + 'static,
        N: EventKey + Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized;

    /// Remove this subscriber from every event name.
    fn unsubscribe_from_all<E, N>(&self, dispatcher: &Dispatcher<E, N>)
    where
        E: Event + 'static,
        N: EventKey;
}

impl<S> SubscriberExt for Arc<S>
where
    S: Subscriber + 'static,
{
    fn subscribe_to<E, N, F>(
        &self,
        dispatcher: &Dispatcher<E, N>,
        name: impl Into<N>,
        weight: Weight,
        handler: F,
    ) where
        E: Event + 'static,
        N: EventKey,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        dispatcher.subscribe(self, name, weight, handler);
    }

    fn unsubscribe_from<E, N, Q>(&self, dispatcher: &Dispatcher<E, N>, name: &Q)
    where
        E: Event + 'static,
        N: EventKey + Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        dispatcher.unsubscribe(self.subscriber_id(), name);
    }

    fn unsubscribe_from_all<E, N>(&self, dispatcher: &Dispatcher<E, N>)
    where
        E: Event + 'static,
        N: EventKey,
    {
        dispatcher.unsubscribe_all(self.subscriber_id());
    }
}
