//! Ownership-based subscription lifetime.

use std::fmt;
use std::sync::{Mutex, Weak};

use tracing::trace;

use crate::catalog::Catalog;
use crate::dispatcher::lock_catalog;
use crate::name::EventKey;
use crate::subscription::{OrderKey, SubscriptionKey};

/// Keeps one subscription registered for as long as it lives.
///
/// Returned by [`Dispatcher::subscribe_scoped`]. Dropping the guard removes
/// the subscription it was created for, and nothing else. If the dispatcher
/// is already gone the drop does nothing.
///
/// ```rust
/// use herald_events::{Dispatcher, Envelope, SubscriberHandle};
///
/// let dispatcher: Dispatcher<Envelope<()>> = Dispatcher::new();
/// let me = SubscriberHandle::shared("me");
///
/// let guard = dispatcher.subscribe_scoped(&me, "tick", 0, |_event| {});
/// assert_eq!(dispatcher.subscription_count("tick"), 1);
///
/// drop(guard);
/// assert_eq!(dispatcher.subscription_count("tick"), 0);
/// ```
///
/// [`Dispatcher::subscribe_scoped`]: crate::Dispatcher::subscribe_scoped
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard<E, N: EventKey> {
    catalog: Weak<Mutex<Catalog<E, N>>>,
    name: N,
    key: SubscriptionKey,
    order: OrderKey,
}

impl<E, N: EventKey> SubscriptionGuard<E, N> {
    pub(crate) fn new(
        catalog: Weak<Mutex<Catalog<E, N>>>,
        name: N,
        key: SubscriptionKey,
        order: OrderKey,
    ) -> Self {
        Self {
            catalog,
            name,
            key,
            order,
        }
    }

    /// Identity of the guarded subscription.
    #[must_use]
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    /// Event name the subscription is registered under.
    #[must_use]
    pub fn event_name(&self) -> &N {
        &self.name
    }

    /// Whether the guarded subscription is still in the catalog.
    ///
    /// Turns `false` if it was unsubscribed some other way, evicted after
    /// its subscriber died, or cleared.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.catalog.upgrade().is_some_and(|catalog| {
            let catalog = lock_catalog(&catalog);
            catalog.holds(&self.name, &self.order)
        })
    }

    /// Unsubscribe now. Same as dropping the guard.
    pub fn cancel(self) {}
}

impl<E, N: EventKey> Drop for SubscriptionGuard<E, N> {
    fn drop(&mut self) {
        let Some(catalog) = self.catalog.upgrade() else {
            return;
        };
        let removed = lock_catalog(&catalog).evict(&self.name, &self.order);
        if let Some(subscription) = removed {
            trace!(
                event = ?self.name,
                subscriber_id = %self.key.subscriber,
                weight = self.key.weight,
                "Scoped subscription dropped"
            );
            // The handler may own further guards; the lock is already released.
            drop(subscription);
        }
    }
}

impl<E, N: EventKey> fmt::Debug for SubscriptionGuard<E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("event", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
