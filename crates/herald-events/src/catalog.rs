//! The subscription catalog: event name to ordered subscription set.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use crate::name::EventKey;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::subscription::{Handler, OrderKey, Subscription, SubscriptionKey, Weight};

/// What [`Catalog::insert`] did, and where the subscription now sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new subscription was stored.
    Added(OrderKey),
    /// An equal subscription existed; its handler was replaced in place.
    Replaced(OrderKey),
}

impl InsertOutcome {
    /// Delivery position of the stored subscription.
    #[must_use]
    pub fn order_key(&self) -> OrderKey {
        match self {
            Self::Added(order) | Self::Replaced(order) => *order,
        }
    }
}

/// Subscriptions registered under one event name.
///
/// Stored in delivery order, with a side index from identity to position so
/// overwrites and exact removals do not scan.
struct SubscriptionSet<E> {
    ordered: BTreeMap<OrderKey, Subscription<E>>,
    index: HashMap<SubscriptionKey, OrderKey>,
}

impl<E> SubscriptionSet<E> {
    fn new() -> Self {
        Self {
            ordered: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn get(&self, key: &SubscriptionKey) -> Option<&Subscription<E>> {
        self.index.get(key).and_then(|order| self.ordered.get(order))
    }

    fn insert(&mut self, subscription: Subscription<E>) -> Option<Subscription<E>> {
        let order = subscription.order_key();
        self.index.insert(subscription.key(), order);
        self.ordered.insert(order, subscription)
    }

    fn remove_key(&mut self, key: &SubscriptionKey) -> Option<Subscription<E>> {
        let order = self.index.remove(key)?;
        self.ordered.remove(&order)
    }

    fn remove_order(&mut self, order: &OrderKey) -> Option<Subscription<E>> {
        let subscription = self.ordered.remove(order)?;
        self.index.remove(&subscription.key());
        Some(subscription)
    }

    fn remove_where(
        &mut self,
        mut doomed: impl FnMut(&Subscription<E>) -> bool,
    ) -> Vec<Subscription<E>> {
        let orders: Vec<OrderKey> = self
            .ordered
            .iter()
            .filter(|&(_, subscription)| doomed(subscription))
            .map(|(order, _)| *order)
            .collect();
        orders
            .iter()
            .filter_map(|order| self.remove_order(order))
            .collect()
    }

    /// Take out every dead subscription and every subscription owned by
    /// `target`.
    fn remove_subscriber(&mut self, target: SubscriberId) -> Vec<Subscription<E>> {
        self.remove_where(|s| s.subscriber_id() == target || !s.is_alive())
    }

    fn prune_dead(&mut self) -> Vec<Subscription<E>> {
        self.remove_where(|s| !s.is_alive())
    }

    fn snapshot(&self) -> Vec<Subscription<E>> {
        self.ordered.values().cloned().collect()
    }
}

/// Mapping from event name to the subscriptions registered for it.
///
/// Invariant: within one event name no two stored subscriptions share a
/// [`SubscriptionKey`]. An event name's entry, once created, stays (possibly
/// empty) until [`Catalog::clear`].
///
/// The catalog itself is not synchronised; [`Dispatcher`] wraps it in a
/// mutex.
///
/// [`Dispatcher`]: crate::Dispatcher
pub struct Catalog<E, N> {
    sets: HashMap<N, SubscriptionSet<E>>,
    next_sequence: u64,
}

impl<E, N: EventKey> Catalog<E, N> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Store a subscription, replacing the handler of an equal one.
    ///
    /// A replaced subscription keeps its place among equal weights and is
    /// handed back alongside the outcome.
    ///
    /// Every method that takes subscriptions out of the catalog returns
    /// them. Handlers may own values whose drop re-enters the dispatcher,
    /// so callers holding the catalog lock release it before dropping what
    /// they got back.
    pub fn insert<S>(
        &mut self,
        subscriber: &Arc<S>,
        name: N,
        weight: Weight,
        handler: Handler<E>,
    ) -> (InsertOutcome, Option<Subscription<E>>)
    where
        S: Subscriber + 'static,
    {
        let key = SubscriptionKey::new(subscriber.subscriber_id(), weight);
        let set = self.sets.entry(name).or_insert_with(SubscriptionSet::new);

        if let Some(existing) = set.get(&key) {
            let order = existing.order_key();
            let replacement = Subscription::new(subscriber, weight, order.sequence, handler);
            let replaced = set.insert(replacement);
            return (InsertOutcome::Replaced(order), replaced);
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let subscription = Subscription::new(subscriber, weight, sequence, handler);
        let order = subscription.order_key();
        let displaced = set.insert(subscription);
        (InsertOutcome::Added(order), displaced)
    }

    /// Remove `subscriber` from one event name.
    ///
    /// Dead subscriptions under that name are evicted as well. Returns
    /// everything taken out; count entries matching `subscriber` to tell the
    /// two apart.
    #[must_use]
    pub fn remove_subscriber<Q>(
        &mut self,
        subscriber: SubscriberId,
        name: &Q,
    ) -> Vec<Subscription<E>>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets
            .get_mut(name)
            .map(|set| set.remove_subscriber(subscriber))
            .unwrap_or_default()
    }

    /// Remove `subscriber` from every event name, evicting dead
    /// subscriptions along the way.
    #[must_use]
    pub fn remove_subscriber_everywhere(
        &mut self,
        subscriber: SubscriberId,
    ) -> Vec<Subscription<E>> {
        self.sets
            .values_mut()
            .flat_map(|set| set.remove_subscriber(subscriber))
            .collect()
    }

    /// Remove exactly one subscription by identity.
    #[must_use]
    pub fn remove_key<Q>(&mut self, name: &Q, key: &SubscriptionKey) -> Option<Subscription<E>>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets.get_mut(name).and_then(|set| set.remove_key(key))
    }

    /// Remove the subscription occupying `order`, if it is still there.
    #[must_use]
    pub fn evict<Q>(&mut self, name: &Q, order: &OrderKey) -> Option<Subscription<E>>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets.get_mut(name).and_then(|set| set.remove_order(order))
    }

    /// Remove the subscription occupying `order` only if its subscriber is
    /// gone.
    ///
    /// A subscriber id can be re-registered at the same weight after its
    /// first owner was dropped; that replacement keeps the order key and
    /// must survive.
    #[must_use]
    pub fn evict_if_dead<Q>(&mut self, name: &Q, order: &OrderKey) -> Option<Subscription<E>>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let set = self.sets.get_mut(name)?;
        if set.ordered.get(order)?.is_alive() {
            return None;
        }
        set.remove_order(order)
    }

    /// The subscriptions for `name` in delivery order, or `None` when the
    /// name has never been subscribed to.
    #[must_use]
    pub fn snapshot<Q>(&self, name: &Q) -> Option<Vec<Subscription<E>>>
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets.get(name).map(SubscriptionSet::snapshot)
    }

    /// Evict every dead subscription under every event name.
    #[must_use]
    pub fn prune_dead(&mut self) -> Vec<Subscription<E>> {
        self.sets
            .values_mut()
            .flat_map(SubscriptionSet::prune_dead)
            .collect()
    }

    /// Discard every event name, returning the subscriptions that were
    /// stored.
    ///
    /// The sequence counter is kept so stale order keys never match a later
    /// subscription.
    #[must_use]
    pub fn clear(&mut self) -> Vec<Subscription<E>> {
        std::mem::take(&mut self.sets)
            .into_values()
            .flat_map(|set| set.ordered.into_values())
            .collect()
    }

    /// Number of stored subscriptions for `name` (0 when unknown).
    #[must_use]
    pub fn subscription_count<Q>(&self, name: &Q) -> usize
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets.get(name).map_or(0, SubscriptionSet::len)
    }

    /// Number of event names with an entry, including empty ones.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.sets.len()
    }

    /// Event names with an entry, in no particular order.
    #[must_use]
    pub fn event_names(&self) -> Vec<N> {
        self.sets.keys().cloned().collect()
    }

    /// Number of stored subscriptions across all event names.
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.sets
            .values()
            .map(SubscriptionSet::len)
            .fold(0_usize, usize::saturating_add)
    }

    /// Whether `subscriber` has at least one subscription under `name`.
    #[must_use]
    pub fn contains<Q>(&self, subscriber: SubscriberId, name: &Q) -> bool
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets.get(name).is_some_and(|set| {
            set.ordered
                .values()
                .any(|s| s.subscriber_id() == subscriber)
        })
    }

    /// Whether a subscription still occupies `order` under `name`.
    #[must_use]
    pub fn holds<Q>(&self, name: &Q, order: &OrderKey) -> bool
    where
        N: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sets
            .get(name)
            .is_some_and(|set| set.ordered.contains_key(order))
    }

    /// Whether the catalog has no event names at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl<E, N: EventKey> Default for Catalog<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, N: EventKey> std::fmt::Debug for Catalog<E, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("event_count", &self.event_count())
            .field("subscription_count", &self.total_subscriptions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::EventName;
    use crate::subscriber::SubscriberHandle;

    type TestCatalog = Catalog<u32, EventName>;

    fn noop() -> Handler<u32> {
        Arc::new(|_: &mut u32| {})
    }

    fn tagged(tag: u32) -> Handler<u32> {
        Arc::new(move |e: &mut u32| *e = tag)
    }

    fn weights(catalog: &TestCatalog, name: &str) -> Vec<Weight> {
        catalog
            .snapshot(name)
            .unwrap_or_default()
            .iter()
            .map(Subscription::weight)
            .collect()
    }

    #[test]
    fn test_insert_creates_entry() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");

        let (outcome, replaced) = catalog.insert(&a, "e".into(), 0, noop());

        assert!(matches!(outcome, InsertOutcome::Added(_)));
        assert!(replaced.is_none());
        assert_eq!(catalog.subscription_count("e"), 1);
        assert_eq!(catalog.event_count(), 1);
        assert!(catalog.contains(a.id(), "e"));
    }

    #[test]
    fn test_resubscribe_same_weight_replaces_handler() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");

        let (first, _) = catalog.insert(&a, "e".into(), 0, tagged(1));
        let (outcome, replaced) = catalog.insert(&a, "e".into(), 0, tagged(2));

        assert!(matches!(outcome, InsertOutcome::Replaced(_)));
        assert_eq!(outcome.order_key(), first.order_key());

        // The old handler comes back to the caller.
        let mut event = 0;
        replaced.unwrap().invoke(&mut event);
        assert_eq!(event, 1);
        assert_eq!(catalog.subscription_count("e"), 1);

        let mut event = 0;
        for subscription in catalog.snapshot("e").unwrap() {
            subscription.invoke(&mut event);
        }
        assert_eq!(event, 2);
    }

    #[test]
    fn test_replacement_keeps_tie_position() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let b = SubscriberHandle::shared("b");

        catalog.insert(&a, "e".into(), 5, noop());
        catalog.insert(&b, "e".into(), 5, noop());
        catalog.insert(&a, "e".into(), 5, noop());

        let ids: Vec<_> = catalog
            .snapshot("e")
            .unwrap()
            .iter()
            .map(Subscription::subscriber_id)
            .collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
    }

    #[test]
    fn test_two_weights_are_two_entries() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");

        catalog.insert(&a, "e".into(), 10, noop());
        catalog.insert(&a, "e".into(), -10, noop());

        assert_eq!(catalog.subscription_count("e"), 2);
        assert_eq!(weights(&catalog, "e"), vec![-10, 10]);
    }

    #[test]
    fn test_snapshot_orders_by_weight_then_insertion() {
        let mut catalog = TestCatalog::new();
        let subs: Vec<_> = (0..5)
            .map(|i| SubscriberHandle::shared(format!("s{i}")))
            .collect();

        catalog.insert(&subs[0], "e".into(), 3, noop());
        catalog.insert(&subs[1], "e".into(), -1, noop());
        catalog.insert(&subs[2], "e".into(), 3, noop());
        catalog.insert(&subs[3], "e".into(), i64::MIN, noop());
        catalog.insert(&subs[4], "e".into(), i64::MAX, noop());

        let order: Vec<_> = catalog
            .snapshot("e")
            .unwrap()
            .iter()
            .map(Subscription::subscriber_id)
            .collect();
        assert_eq!(
            order,
            vec![subs[3].id(), subs[1].id(), subs[0].id(), subs[2].id(), subs[4].id()]
        );
    }

    #[test]
    fn test_snapshot_unknown_event() {
        let catalog = TestCatalog::new();
        assert!(catalog.snapshot("missing").is_none());
        assert_eq!(catalog.subscription_count("missing"), 0);
    }

    #[test]
    fn test_remove_subscriber_single_event() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let b = SubscriberHandle::shared("b");

        catalog.insert(&a, "created".into(), 0, noop());
        catalog.insert(&a, "changed".into(), 0, noop());
        catalog.insert(&b, "created".into(), 0, noop());

        let removed = catalog.remove_subscriber(a.id(), "created");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].subscriber_id(), a.id());
        assert_eq!(catalog.subscription_count("created"), 1);
        assert_eq!(catalog.subscription_count("changed"), 1);
        assert!(!catalog.contains(a.id(), "created"));
        assert!(catalog.contains(b.id(), "created"));
    }

    #[test]
    fn test_remove_subscriber_everywhere() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");

        catalog.insert(&a, "created".into(), 0, noop());
        catalog.insert(&a, "changed".into(), 1, noop());
        catalog.insert(&a, "changed".into(), 2, noop());

        let removed = catalog.remove_subscriber_everywhere(a.id());

        assert_eq!(removed.len(), 3);
        assert_eq!(catalog.total_subscriptions(), 0);
        // Entries persist, empty, until cleared.
        assert_eq!(catalog.event_count(), 2);
    }

    #[test]
    fn test_remove_subscriber_evicts_dead_entries() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let b = SubscriberHandle::shared("b");
        let dead = SubscriberHandle::shared("dead");

        catalog.insert(&a, "e".into(), 0, noop());
        catalog.insert(&b, "e".into(), 0, noop());
        catalog.insert(&dead, "e".into(), 0, noop());
        catalog.insert(&dead, "other".into(), 0, noop());
        drop(dead);

        let removed = catalog.remove_subscriber(a.id(), "e");

        // a's entry plus the dead one.
        assert_eq!(removed.len(), 2);
        assert_eq!(removed.iter().filter(|s| s.subscriber_id() == a.id()).count(), 1);
        assert_eq!(catalog.subscription_count("e"), 1);
        // Only scanned sets are swept.
        assert_eq!(catalog.subscription_count("other"), 1);
    }

    #[test]
    fn test_remove_unknown_subscriber_is_noop() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        catalog.insert(&a, "e".into(), 0, noop());

        assert!(catalog.remove_subscriber_everywhere(SubscriberId::new()).is_empty());
        assert!(catalog.remove_subscriber(a.id(), "nope").is_empty());
        assert_eq!(catalog.subscription_count("e"), 1);
    }

    #[test]
    fn test_evict_by_order_key() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        catalog.insert(&a, "e".into(), 4, noop());

        let order = catalog.snapshot("e").unwrap()[0].order_key();
        assert!(catalog.evict("e", &order).is_some());
        assert!(catalog.evict("e", &order).is_none());
        assert_eq!(catalog.subscription_count("e"), 0);
    }

    #[test]
    fn test_evict_ignores_replaced_position() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        catalog.insert(&a, "e".into(), 4, noop());
        let stale = catalog.snapshot("e").unwrap()[0].order_key();

        assert!(catalog.remove_key("e", &SubscriptionKey::new(a.id(), 4)).is_some());
        catalog.insert(&a, "e".into(), 4, noop());

        assert!(catalog.evict("e", &stale).is_none());
        assert_eq!(catalog.subscription_count("e"), 1);
    }

    #[test]
    fn test_remove_key() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        catalog.insert(&a, "e".into(), 1, noop());
        catalog.insert(&a, "e".into(), 2, noop());

        assert!(catalog.remove_key("e", &SubscriptionKey::new(a.id(), 1)).is_some());
        assert!(catalog.remove_key("e", &SubscriptionKey::new(a.id(), 1)).is_none());
        assert_eq!(weights(&catalog, "e"), vec![2]);
    }

    #[test]
    fn test_prune_dead() {
        let mut catalog = TestCatalog::new();
        let keep = SubscriberHandle::shared("keep");
        let gone = SubscriberHandle::shared("gone");

        catalog.insert(&keep, "x".into(), 0, noop());
        catalog.insert(&gone, "x".into(), 0, noop());
        catalog.insert(&gone, "y".into(), 1, noop());
        catalog.insert(&gone, "y".into(), 2, noop());
        drop(gone);

        assert_eq!(catalog.prune_dead().len(), 3);
        assert_eq!(catalog.total_subscriptions(), 1);
        assert!(catalog.prune_dead().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let b = SubscriberHandle::shared("b");
        catalog.insert(&a, "e".into(), 100, noop());
        catalog.insert(&b, "e".into(), 200, noop());

        let cleared = catalog.clear();

        assert_eq!(cleared.len(), 2);
        assert!(catalog.is_empty());
        assert_eq!(catalog.event_count(), 0);
        assert!(catalog.snapshot("e").is_none());
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let (before, _) = catalog.insert(&a, "e".into(), 0, noop());

        let _ = catalog.clear();
        let (after, _) = catalog.insert(&a, "e".into(), 0, noop());

        assert_ne!(before.order_key(), after.order_key());
        assert!(catalog.evict("e", &before.order_key()).is_none());
        assert_eq!(catalog.subscription_count("e"), 1);
    }

    #[test]
    fn test_evict_if_dead_spares_live_entry() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        let (outcome, _) = catalog.insert(&a, "e".into(), 0, noop());
        let order = outcome.order_key();

        assert!(catalog.evict_if_dead("e", &order).is_none());
        assert_eq!(catalog.subscription_count("e"), 1);

        drop(a);
        assert!(catalog.evict_if_dead("e", &order).is_some());
        assert_eq!(catalog.subscription_count("e"), 0);
        assert!(catalog.evict_if_dead("missing", &order).is_none());
    }

    #[test]
    fn test_event_names() {
        let mut catalog = TestCatalog::new();
        let a = SubscriberHandle::shared("a");
        catalog.insert(&a, "created".into(), 0, noop());
        catalog.insert(&a, "changed".into(), 0, noop());

        let mut names = catalog.event_names();
        names.sort();
        assert_eq!(names, vec![EventName::from("changed"), EventName::from("created")]);
    }
}
