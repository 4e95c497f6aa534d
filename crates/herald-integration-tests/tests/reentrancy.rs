//! Handlers that subscribe, unsubscribe or dispatch while a dispatch is in
//! progress.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Harness, Trail, append};
use herald_events::{Event, Subscriber, SubscriberHandle};

#[test]
fn subscription_added_mid_dispatch_waits_for_the_next_call() {
    let h = Harness::new();
    let late = SubscriberHandle::shared("late");
    let adder = h.subscriber("adder");

    let dispatcher = h.dispatcher.clone();
    let late_ref = Arc::clone(&late);
    h.dispatcher.subscribe(&adder, "e", 0, move |event: &mut Trail| {
        event.push("adder".to_owned());
        dispatcher.subscribe(&late_ref, "e", 1, append("late"));
    });

    assert_eq!(*h.fire("e").payload(), ["adder"]);
    assert_eq!(*h.fire("e").payload(), ["adder", "late"]);
}

#[test]
fn unsubscribed_mid_dispatch_still_fires_this_time() {
    let h = Harness::new();
    let remover = h.subscriber("remover");
    let victim = h.subscriber("victim");

    let dispatcher = h.dispatcher.clone();
    let victim_id = victim.subscriber_id();
    h.dispatcher.subscribe(&remover, "e", -1, move |event: &mut Trail| {
        event.push("remover".to_owned());
        dispatcher.unsubscribe_all(victim_id);
    });
    h.dispatcher.subscribe(&victim, "e", 1, append("victim"));

    assert_eq!(*h.fire("e").payload(), ["remover", "victim"]);
    assert_eq!(*h.fire("e").payload(), ["remover"]);
}

#[test]
fn clear_all_mid_dispatch_finishes_the_snapshot() {
    let h = Harness::new();
    let clearer = h.subscriber("clearer");
    let after = h.subscriber("after");

    let dispatcher = h.dispatcher.clone();
    h.dispatcher.subscribe(&clearer, "e", 0, move |event: &mut Trail| {
        event.push("clearer".to_owned());
        dispatcher.clear_all();
    });
    h.dispatcher.subscribe(&after, "e", 1, append("after"));

    assert_eq!(*h.fire("e").payload(), ["clearer", "after"]);
    assert!(h.fire("e").payload().is_empty());
}

#[test]
fn nested_dispatch_runs_its_own_walk() {
    let h = Harness::new();
    let outer = h.subscriber("outer");
    let inner = h.subscriber("inner");
    let tail = h.subscriber("tail");
    let nested_runs = Arc::new(AtomicUsize::new(0));

    let dispatcher = h.dispatcher.clone();
    let runs = Arc::clone(&nested_runs);
    h.dispatcher.subscribe(&outer, "outer", 0, move |event: &mut Trail| {
        event.push("outer".to_owned());
        let mut nested = Trail::default();
        dispatcher.dispatch(&mut nested, "inner");
        runs.fetch_add(nested.len(), Ordering::SeqCst);
    });
    h.dispatcher.subscribe(&inner, "inner", 0, append_and_stop_inner());
    h.dispatcher.subscribe(&tail, "outer", 1, append("tail"));

    assert_eq!(*h.fire("outer").payload(), ["outer", "tail"]);
    assert_eq!(nested_runs.load(Ordering::SeqCst), 1);
}

/// Stopping the nested event must not stop the outer one.
fn append_and_stop_inner() -> impl Fn(&mut Trail) + Send + Sync + 'static {
    |event: &mut Trail| {
        event.push("inner".to_owned());
        event.stop_propagation();
    }
}

#[test]
fn reentrant_dispatch_on_the_same_name() {
    let h = Harness::new();
    let echo = h.subscriber("echo");
    let depth = Arc::new(AtomicUsize::new(0));

    let dispatcher = h.dispatcher.clone();
    let seen = Arc::clone(&depth);
    h.dispatcher.subscribe(&echo, "e", 0, move |event: &mut Trail| {
        event.push("echo".to_owned());
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            dispatcher.dispatch(event, "e");
        }
    });

    let trail = h.fire("e");
    assert_eq!(*trail.payload(), ["echo", "echo"]);
    assert_eq!(depth.load(Ordering::SeqCst), 2);
}

#[test]
fn subscriber_dropped_by_earlier_handler_is_skipped() {
    let h = Harness::new();
    let killer = h.subscriber("killer");
    let doomed = h.subscriber("doomed");
    let slot = Arc::new(std::sync::Mutex::new(Some(doomed)));

    let held = Arc::clone(&slot);
    h.dispatcher.subscribe(&killer, "e", 0, move |event: &mut Trail| {
        event.push("killer".to_owned());
        held.lock().unwrap().take();
    });
    {
        let guard = slot.lock().unwrap();
        let doomed = guard.as_ref().unwrap();
        h.listen(doomed, "e", 1);
    }

    assert_eq!(*h.fire("e").payload(), ["killer"]);
    assert!(h.log.is_empty());
    assert_eq!(h.dispatcher.subscription_count("e"), 1);
}

#[test]
fn scoped_guard_dropped_mid_dispatch() {
    let h = Harness::new();
    let owner = h.subscriber("owner");
    let scoped = h.subscriber("scoped");

    let guard = h
        .dispatcher
        .subscribe_scoped(&scoped, "e", 1, append("scoped"));
    let slot = Arc::new(std::sync::Mutex::new(Some(guard)));

    let held = Arc::clone(&slot);
    h.dispatcher.subscribe(&owner, "e", 0, move |event: &mut Trail| {
        event.push("owner".to_owned());
        held.lock().unwrap().take();
    });

    // The snapshot was taken before the guard dropped.
    assert_eq!(*h.fire("e").payload(), ["owner", "scoped"]);
    assert_eq!(*h.fire("e").payload(), ["owner"]);
}
