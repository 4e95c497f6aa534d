//! The dispatcher: subscribe, unsubscribe, and ordered synchronous delivery.

use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::config::DispatcherConfig;
use crate::event::{Event, NamedEvent};
use crate::guard::SubscriptionGuard;
use crate::name::{EventKey, EventName};
use crate::subscriber::{Subscriber, SubscriberId};
use crate::subscription::{DEFAULT_WEIGHT, Handler, Subscription, SubscriptionKey, Weight};

pub(crate) fn lock_catalog<E, N>(catalog: &Mutex<Catalog<E, N>>) -> MutexGuard<'_, Catalog<E, N>> {
    catalog.lock().unwrap_or_else(|e| {
        warn!("Catalog lock poisoned, recovering");
        e.into_inner()
    })
}

/// In-process event dispatcher.
///
/// Handlers are registered per event name with a weight and run
/// synchronously on the publishing thread, lowest weight first. Equal
/// weights run in the order they were first subscribed.
///
/// Each dispatch call works from a snapshot taken before the first handler
/// runs: handlers may freely subscribe, unsubscribe or dispatch on the same
/// dispatcher, and those changes only affect later calls. The catalog lock
/// is never held while a handler runs.
///
/// Cloning a dispatcher shares its catalog.
///
/// **WARNING:** a handler that captures a clone of the dispatcher it is
/// registered on keeps the catalog alive through an `Arc` cycle until the
/// subscription is removed. Capture a [`WeakDispatcher`] instead when that
/// matters.
///
/// ```rust
/// use herald_events::{Dispatcher, Envelope, SubscriberHandle};
///
/// let dispatcher: Dispatcher<Envelope<Vec<&'static str>>> = Dispatcher::new();
/// let a = SubscriberHandle::shared("a");
/// let b = SubscriberHandle::shared("b");
///
/// dispatcher.subscribe(&b, "saved", 3, |event| event.push("b"));
/// dispatcher.subscribe(&a, "saved", -1, |event| event.push("a"));
///
/// let mut event = Envelope::new(Vec::new());
/// dispatcher.dispatch(&mut event, "saved");
/// assert_eq!(*event, vec!["a", "b"]);
/// ```
pub struct Dispatcher<E, N = EventName> {
    catalog: Arc<Mutex<Catalog<E, N>>>,
    config: DispatcherConfig,
}

impl<E, N> Dispatcher<E, N>
where
    E: Event + 'static,
    N: EventKey,
{
    /// Create a dispatcher with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher with the given options.
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(Catalog::new())),
            config,
        }
    }

    /// The options this dispatcher was built with.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Catalog<E, N>> {
        lock_catalog(&self.catalog)
    }

    /// Register `handler` for `name` on behalf of `subscriber`.
    ///
    /// Subscribing the same subscriber to the same name at the same weight
    /// again replaces the handler. A different weight adds a second
    /// subscription, delivered separately.
    ///
    /// The dispatcher keeps only a weak reference to `subscriber`; once the
    /// last `Arc` is dropped its subscriptions stop firing.
    pub fn subscribe<S, F>(
        &self,
        subscriber: &Arc<S>,
        name: impl Into<N>,
        weight: Weight,
        handler: F,
    ) where
        S: Subscriber + 'static,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let name = name.into();
        trace!(
            event = ?name,
            subscriber_id = %subscriber.subscriber_id(),
            subscriber_name = %subscriber.name(),
            weight,
            "Subscribing"
        );
        let handler: Handler<E> = Arc::new(handler);
        let (_, replaced) = self.lock().insert(subscriber, name, weight, handler);
        drop(replaced);
    }

    /// [`subscribe`](Self::subscribe) at [`DEFAULT_WEIGHT`].
    pub fn subscribe_default<S, F>(&self, subscriber: &Arc<S>, name: impl Into<N>, handler: F)
    where
        S: Subscriber + 'static,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.subscribe(subscriber, name, DEFAULT_WEIGHT, handler);
    }

    /// Subscribe and get a guard that unsubscribes when dropped.
    ///
    /// Dropping the guard removes exactly this subscription; other
    /// subscriptions of the same subscriber are untouched. The guard does not
    /// keep the dispatcher alive.
    pub fn subscribe_scoped<S, F>(
        &self,
        subscriber: &Arc<S>,
        name: impl Into<N>,
        weight: Weight,
        handler: F,
    ) -> SubscriptionGuard<E, N>
    where
        S: Subscriber + 'static,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let name = name.into();
        let key = SubscriptionKey::new(subscriber.subscriber_id(), weight);
        let handler: Handler<E> = Arc::new(handler);
        let (outcome, replaced) = self.lock().insert(subscriber, name.clone(), weight, handler);
        drop(replaced);
        let order = outcome.order_key();
        trace!(event = ?name, subscriber_id = %key.subscriber, weight, "Scoped subscription");
        SubscriptionGuard::new(Arc::downgrade(&self.catalog), name, key, order)
    }

    /// Remove `subscriber` from `name`.
    ///
    /// Dead subscriptions encountered while scanning are evicted too.
    /// Unknown subscribers and names are a no-op.
    pub fn unsubscribe<Q>(&self, subscriber: SubscriberId, name: &Q)
    where
        N: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let taken = self.lock().remove_subscriber(subscriber, name);
        trace!(
            event = ?name,
            subscriber_id = %subscriber,
            removed = owned_by(&taken, subscriber),
            "Unsubscribed"
        );
    }

    /// Remove `subscriber` from every event name.
    pub fn unsubscribe_all(&self, subscriber: SubscriberId) {
        let taken = self.lock().remove_subscriber_everywhere(subscriber);
        trace!(
            subscriber_id = %subscriber,
            removed = owned_by(&taken, subscriber),
            "Unsubscribed from all events"
        );
    }

    /// Deliver `event` to the live subscribers of `name` in weight order.
    ///
    /// Stops after the first handler that clears the event's propagation
    /// flag. Subscriptions whose subscriber has been dropped are skipped and
    /// removed from the catalog. An unknown name is a no-op.
    pub fn dispatch<Q>(&self, event: &mut E, name: &Q)
    where
        N: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        if self.config.reset_propagation {
            event.set_propagation(true);
        }

        let snapshot = self.lock().snapshot(name);
        let Some(snapshot) = snapshot else {
            trace!(event = ?name, "No subscriptions for event");
            return;
        };

        trace!(event = ?name, subscriptions = snapshot.len(), "Dispatching event");

        for subscription in &snapshot {
            if !subscription.is_alive() {
                let evicted = self.lock().evict_if_dead(name, &subscription.order_key());
                drop(evicted);
                continue;
            }

            self.invoke(subscription, event);

            if !event.propagates() {
                debug!(
                    event = ?name,
                    subscriber_id = %subscription.subscriber_id(),
                    weight = subscription.weight(),
                    "Propagation stopped"
                );
                break;
            }
        }
    }

    /// Dispatch an event under the name it carries.
    pub fn dispatch_named(&self, event: &mut E)
    where
        E: NamedEvent<N>,
    {
        let name = event.event_name();
        self.dispatch(event, &name);
    }

    fn invoke(&self, subscription: &Subscription<E>, event: &mut E) {
        if !self.config.isolate_panics {
            subscription.invoke(event);
            return;
        }

        // Catch panics to prevent one handler from affecting the rest
        let result = catch_unwind(AssertUnwindSafe(|| subscription.invoke(event)));

        if let Err(payload) = result {
            warn!(
                subscriber_id = %subscription.subscriber_id(),
                subscriber_name = %subscription.subscriber_name(),
                weight = subscription.weight(),
                error = %panic_message(payload.as_ref()),
                "Handler panicked"
            );
        }
    }

    /// Discard every subscription for every event name.
    ///
    /// A reset hook for tests and shutdown.
    pub fn clear_all(&self) {
        let cleared = self.lock().clear();
        debug!(cleared = cleared.len(), "All subscriptions cleared");
    }

    /// Evict every subscription whose subscriber has been dropped.
    ///
    /// Returns the number evicted.
    pub fn prune(&self) -> usize {
        let pruned = self.lock().prune_dead();
        let evicted = pruned.len();
        drop(pruned);
        if evicted > 0 {
            debug!(evicted, "Pruned dead subscriptions");
        }
        evicted
    }

    /// Number of stored subscriptions for `name`, dead ones included until
    /// they are evicted.
    #[must_use]
    pub fn subscription_count<Q>(&self, name: &Q) -> usize
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().subscription_count(name)
    }

    /// Number of event names in the catalog, including emptied ones.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lock().event_count()
    }

    /// Event names in the catalog, in no particular order.
    #[must_use]
    pub fn event_names(&self) -> Vec<N> {
        self.lock().event_names()
    }

    /// Number of stored subscriptions across all event names.
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.lock().total_subscriptions()
    }

    /// Whether `subscriber` holds at least one subscription under `name`.
    #[must_use]
    pub fn is_subscribed<Q>(&self, subscriber: SubscriberId, name: &Q) -> bool
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().contains(subscriber, name)
    }

    /// A non-owning reference to this dispatcher's catalog.
    #[must_use]
    pub fn downgrade(&self) -> WeakDispatcher<E, N> {
        WeakDispatcher {
            catalog: Arc::downgrade(&self.catalog),
            config: self.config,
        }
    }
}

fn owned_by<E>(taken: &[Subscription<E>], subscriber: SubscriberId) -> usize {
    taken
        .iter()
        .filter(|s| s.subscriber_id() == subscriber)
        .count()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl<E, N> Default for Dispatcher<E, N>
where
    E: Event + 'static,
    N: EventKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, N> Clone for Dispatcher<E, N> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            config: self.config,
        }
    }
}

impl<E, N: EventKey> fmt::Debug for Dispatcher<E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("catalog", &*lock_catalog(&self.catalog))
            .field("config", &self.config)
            .finish()
    }
}

/// Non-owning handle to a [`Dispatcher`], for handlers that need to reach
/// back into the dispatcher they are registered on.
pub struct WeakDispatcher<E, N = EventName> {
    catalog: std::sync::Weak<Mutex<Catalog<E, N>>>,
    config: DispatcherConfig,
}

impl<E, N> WeakDispatcher<E, N> {
    /// Recover the dispatcher if it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Dispatcher<E, N>> {
        self.catalog.upgrade().map(|catalog| Dispatcher {
            catalog,
            config: self.config,
        })
    }
}

impl<E, N> Clone for WeakDispatcher<E, N> {
    fn clone(&self) -> Self {
        Self {
            catalog: std::sync::Weak::clone(&self.catalog),
            config: self.config,
        }
    }
}

impl<E, N> fmt::Debug for WeakDispatcher<E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDispatcher")
            .field("alive", &(self.catalog.strong_count() > 0))
            .finish_non_exhaustive()
    }
}
