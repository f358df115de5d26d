use std::sync::{Arc, Mutex};

use consent_store::*;

type Hook = dyn Fn(u32) + Send + Sync;

#[test]
fn notifies_in_registration_order() {
    let bus: Listeners<Hook> = Listeners::new("test");
    let seen = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let sink = seen.clone();
        bus.add(Arc::new(move |n: u32| sink.lock().unwrap().push((tag, n))));
    }
    assert_eq!(bus.notify_each(|cb| cb(7)), 0);
    assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7), ("c", 7)]);
}

#[test]
fn panics_are_isolated_and_counted() {
    let bus: Listeners<Hook> = Listeners::new("test");
    let seen = Arc::new(Mutex::new(0));
    bus.add(Arc::new(|_: u32| panic!("boom")));
    let sink = seen.clone();
    bus.add(Arc::new(move |n: u32| *sink.lock().unwrap() += n));
    bus.add(Arc::new(|_: u32| panic!("boom again")));

    assert_eq!(bus.notify_each(|cb| cb(2)), 2);
    assert_eq!(*seen.lock().unwrap(), 2);
}

#[test]
fn remove_and_unsubscribe() {
    let bus: Listeners<Hook> = Listeners::new("test");
    let a = bus.add(Arc::new(|_: u32| {}));
    let b = bus.add(Arc::new(|_: u32| {}));
    assert_eq!(bus.len(), 2);

    assert!(bus.remove(a.id()));
    assert!(!bus.remove(a.id()));
    b.unsubscribe();
    assert!(bus.is_empty());
}

#[test]
fn dropping_a_subscription_keeps_the_listener() {
    let bus: Listeners<Hook> = Listeners::new("test");
    drop(bus.add(Arc::new(|_: u32| {})));
    assert_eq!(bus.len(), 1);
}

#[test]
fn listener_may_unsubscribe_during_delivery() {
    let bus: Arc<Listeners<Hook>> = Arc::new(Listeners::new("test"));
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let calls = Arc::new(Mutex::new(0));

    let inner_slot = slot.clone();
    let counter = calls.clone();
    let sub = bus.add(Arc::new(move |_: u32| {
        *counter.lock().unwrap() += 1;
        if let Some(s) = inner_slot.lock().unwrap().take() {
            s.unsubscribe();
        }
    }));
    *slot.lock().unwrap() = Some(sub);

    bus.notify_each(|cb| cb(1));
    bus.notify_each(|cb| cb(1));
    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(bus.is_empty());
}

#[test]
fn unsubscribe_after_registry_is_gone_is_harmless() {
    let bus: Listeners<Hook> = Listeners::new("test");
    let sub = bus.add(Arc::new(|_: u32| {}));
    drop(bus);
    sub.unsubscribe();
}
