//! Subscriptions: the unit of registration.
//!
//! A subscription is identified by `(subscriber, weight)`; the handler takes
//! no part in equality. Subscribing the same subscriber at the same weight
//! again therefore replaces the handler instead of adding an entry.
//!
//! Ordering is separate from identity: subscriptions enumerate by
//! [`OrderKey`], weight ascending and then by insertion sequence, so equal
//! weights keep a stable, reproducible order.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::subscriber::{Subscriber, SubscriberId};

/// Delivery priority. Lower weights are delivered first; any `i64` is valid.
pub type Weight = i64;

/// Weight used when the caller does not pick one.
pub const DEFAULT_WEIGHT: Weight = 0;

/// Handler invoked with the event being dispatched.
pub type Handler<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Identity of a subscription within one event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    /// Owning subscriber.
    pub subscriber: SubscriberId,
    /// Delivery weight.
    pub weight: Weight,
}

impl SubscriptionKey {
    /// Build a key.
    #[must_use]
    pub fn new(subscriber: SubscriberId, weight: Weight) -> Self {
        Self { subscriber, weight }
    }
}

/// Position of a subscription in delivery order.
///
/// Sequence numbers are unique within a catalog, so two live subscriptions
/// never share an order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    /// Delivery weight (compared first).
    pub weight: Weight,
    /// Insertion sequence (tie-break).
    pub sequence: u64,
}

/// A registered handler for one event name.
pub struct Subscription<E> {
    key: SubscriptionKey,
    sequence: u64,
    subscriber: Weak<dyn Subscriber>,
    subscriber_name: Arc<str>,
    handler: Handler<E>,
}

impl<E> Subscription<E> {
    pub(crate) fn new<S>(
        subscriber: &Arc<S>,
        weight: Weight,
        sequence: u64,
        handler: Handler<E>,
    ) -> Self
    where
        S: Subscriber + 'static,
    {
        let weak: Weak<S> = Arc::downgrade(subscriber);
        let weak: Weak<dyn Subscriber> = weak;
        Self {
            key: SubscriptionKey::new(subscriber.subscriber_id(), weight),
            sequence,
            subscriber: weak,
            subscriber_name: Arc::from(subscriber.name()),
            handler,
        }
    }

    /// Identity of this subscription.
    #[must_use]
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    /// The owning subscriber's ID.
    #[must_use]
    pub fn subscriber_id(&self) -> SubscriberId {
        self.key.subscriber
    }

    /// Delivery weight.
    #[must_use]
    pub fn weight(&self) -> Weight {
        self.key.weight
    }

    /// Position in delivery order.
    #[must_use]
    pub fn order_key(&self) -> OrderKey {
        OrderKey {
            weight: self.key.weight,
            sequence: self.sequence,
        }
    }

    /// Name the subscriber reported when it subscribed.
    #[must_use]
    pub fn subscriber_name(&self) -> &str {
        &self.subscriber_name
    }

    /// Whether the owning subscriber still exists.
    ///
    /// Never extends the subscriber's lifetime. Once this returns `false` it
    /// returns `false` forever.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.subscriber.strong_count() > 0
    }

    /// Invoke the handler.
    pub fn invoke(&self, event: &mut E) {
        (self.handler)(event);
    }
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            sequence: self.sequence,
            subscriber: Weak::clone(&self.subscriber),
            subscriber_name: Arc::clone(&self.subscriber_name),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<E> PartialEq for Subscription<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<E> Eq for Subscription<E> {}

impl<E> Hash for Subscription<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<E> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("subscriber_id", &self.key.subscriber)
            .field("subscriber_name", &self.subscriber_name)
            .field("weight", &self.key.weight)
            .field("sequence", &self.sequence)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}
