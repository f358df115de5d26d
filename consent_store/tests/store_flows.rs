mod common;

use std::sync::{Arc, Mutex};

use common::*;
use consent_store::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn fresh_visit_defers_to_notice_with_deny_all_default() {
    let mut h = harness(frozen_host());
    assert_eq!(h.store.presentation(), Presentation::Hidden);

    assert_eq!(h.store.initialize(ConsentOptions::default()), None);
    assert_eq!(h.store.presentation(), Presentation::Notice);
    assert!(!h.store.has_valid_consent());
    assert!(h.store.is_initialized());

    let layer = layer_json(&h.layer);
    assert_eq!(layer.len(), 1);
    assert_eq!(layer[0][0], "consent");
    assert_eq!(layer[0][1], "default");
    assert_eq!(layer[0][2]["analytics_storage"], "denied");
    assert_eq!(layer[0][2]["security_storage"], "granted");
    assert!(h.host.directives().is_empty());
}

#[test]
fn initialize_notifies_notice_once() {
    let mut h = harness(frozen_host());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = h.store.on_presentation_change(move |p| sink.lock().unwrap().push(p));

    assert_eq!(h.store.initialize(ConsentOptions::default()), None);
    assert_eq!(*seen.lock().unwrap(), vec![Presentation::Notice]);

    // Already showing the notice: a second deferred load changes nothing.
    assert_eq!(h.store.initialize(ConsentOptions::default()), None);
    assert_eq!(*seen.lock().unwrap(), vec![Presentation::Notice]);
}

#[test]
fn matching_stored_record_is_adopted_verbatim() {
    let stored = record("1", ConsentCategories::all_granted());
    let host = frozen_host().with_cookie_header(&format!("other=1; {}", stored_cookie(&stored)));
    let mut h = harness(host);

    assert_eq!(h.store.initialize(ConsentOptions::default()), Some(stored.clone()));
    assert_eq!(h.store.consent(), Some(stored));
    assert_eq!(h.store.presentation(), Presentation::Hidden);
    assert!(h.store.has_valid_consent());
    assert!(h.store.is_granted(ConsentCategory::Marketing));

    let layer = layer_json(&h.layer);
    assert_eq!(layer.len(), 2);
    assert_eq!(layer[0][2]["ad_storage"], "denied");
    assert_eq!(layer[1][1], "default");
    assert_eq!(layer[1][2]["ad_storage"], "granted");
}

#[test]
fn stale_version_shows_notice_then_accept_writes_new_version() {
    let stored = record("1", ConsentCategories::all_granted());
    let mut h = harness(frozen_host().with_cookie_header(&stored_cookie(&stored)));

    let opts = ConsentOptions::default().with_consent_version("2");
    assert_eq!(h.store.initialize(opts), None);
    assert_eq!(h.store.presentation(), Presentation::Notice);
    assert!(!h.store.is_granted(ConsentCategory::Analytics));

    let rec = h.store.accept_all().unwrap();
    assert_eq!(rec.consent_version, "2");
    assert_eq!(rec.categories, ConsentCategories::all_granted());
    assert_eq!(rec.timestamp, NOW);
    assert_eq!(h.store.presentation(), Presentation::Hidden);
    assert!(h.store.has_valid_consent());

    let written = h.host.cookie("cc_consent").unwrap();
    assert_eq!(consent_core::decode_record(&written).unwrap(), rec);
}

#[test]
fn privacy_signal_auto_denies_without_reaching_notice() {
    let mut h = harness(frozen_host().with_gpc(true));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = h.store.on_presentation_change(move |p| sink.lock().unwrap().push(p));

    let rec = h.store.initialize(ConsentOptions::default()).unwrap();
    assert!(rec.gpc);
    assert_eq!(rec.categories, ConsentCategories::denied());
    assert_eq!(h.store.presentation(), Presentation::Hidden);
    assert!(seen.lock().unwrap().is_empty());

    let persisted = consent_core::decode_record(&h.host.cookie("cc_consent").unwrap()).unwrap();
    assert_eq!(persisted, rec);

    let layer = layer_json(&h.layer);
    assert_eq!(layer.len(), 3);
    assert_eq!(layer[1][1], "update");
    assert_eq!(layer[2]["event"], "consent_update");
    assert_eq!(layer[2]["consent_action"], "gpc");
}

#[test]
fn privacy_signal_does_not_override_an_existing_record() {
    let stored = record("1", ConsentCategories::all_granted());
    let mut h = harness(frozen_host().with_gpc(true).with_cookie_header(&stored_cookie(&stored)));

    assert_eq!(h.store.initialize(ConsentOptions::default()), Some(stored));
    assert!(h.host.directives().is_empty());
}

#[test]
fn corrupt_cookie_is_treated_as_absent() {
    let mut h = harness(frozen_host().with_cookie_header("cc_consent=%7Bnot-json"));
    assert_eq!(h.store.initialize(ConsentOptions::default()), None);
    assert_eq!(h.store.presentation(), Presentation::Notice);
}

#[test]
fn update_with_no_choices_denies_everything_but_necessary() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.store.accept_all().unwrap();

    let rec = h.store.update_consent(CategoryChoices::new(), ConsentAction::Custom).unwrap();
    assert_eq!(rec.categories, ConsentCategories::denied());
}

#[test]
fn accept_and_reject_are_idempotent_on_categories() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());

    let a1 = h.store.accept_all().unwrap();
    let a2 = h.store.accept_all().unwrap();
    assert_eq!(a1.categories, a2.categories);
    assert_eq!(a1.categories, ConsentCategories::all_granted());

    let r1 = h.store.reject_all().unwrap();
    let r2 = h.store.reject_all().unwrap();
    assert_eq!(r1.categories, r2.categories);
    assert_eq!(r1.categories, ConsentCategories::denied());
}

#[test]
fn update_records_current_privacy_signal() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.host.set_gpc(true);
    let rec = h.store.accept_all().unwrap();
    assert!(rec.gpc);
}

#[test]
fn update_emits_update_signal_and_event() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.layer.drain();

    let choices = CategoryChoices::new().with(ConsentCategory::Analytics, true);
    h.store.update_consent(choices, ConsentAction::Custom).unwrap();

    let layer = layer_json(&h.layer);
    assert_eq!(layer.len(), 2);
    assert_eq!(
        layer[0],
        json!(["consent", "update", {
            "security_storage": "granted",
            "functionality_storage": "denied",
            "personalization_storage": "denied",
            "analytics_storage": "granted",
            "ad_storage": "denied",
            "ad_user_data": "denied",
            "ad_personalization": "denied"
        }])
    );
    assert_eq!(
        layer[1],
        json!({
            "event": "consent_update",
            "consent_action": "custom",
            "consent_categories": {
                "necessary": true,
                "functional": false,
                "analytics": true,
                "marketing": false
            }
        })
    );
}

#[test]
fn returned_records_are_copies() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    let mut rec = h.store.accept_all().unwrap();
    rec.categories.marketing = false;

    let mut again = h.store.consent().unwrap();
    again.consent_version = "tampered".into();

    let current = h.store.consent().unwrap();
    assert!(current.categories.marketing);
    assert_eq!(current.consent_version, "1");
}

#[test]
fn reset_forgets_consent_without_notifying_consent_subscribers() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.store.accept_all().unwrap();

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let _sub = h.store.on_consent_change(move |_, _| *counter.lock().unwrap() += 1);
    let ui = Arc::new(Mutex::new(Vec::new()));
    let ui_sink = ui.clone();
    let _ui_sub = h.store.on_presentation_change(move |p| ui_sink.lock().unwrap().push(p));
    h.layer.drain();

    h.store.reset_consent();
    assert_eq!(h.store.consent(), None);
    assert_eq!(h.store.presentation(), Presentation::Notice);
    assert_eq!(*calls.lock().unwrap(), 0);
    assert_eq!(*ui.lock().unwrap(), vec![Presentation::Notice]);
    assert_eq!(h.host.cookie("cc_consent"), None);
    assert_eq!(
        h.host.last_directive().unwrap(),
        "cc_consent=; path=/; max-age=0; SameSite=Lax"
    );

    let layer = layer_json(&h.layer);
    assert_eq!(layer.len(), 1);
    assert_eq!(layer[0][1], "default");
    assert_eq!(layer[0][2]["ad_storage"], "denied");
}

#[test]
fn consent_subscribers_get_record_and_action_in_order() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());

    let log = Arc::new(Mutex::new(Vec::new()));
    let first = log.clone();
    let second = log.clone();
    let _a = h.store.on_consent_change(move |r, a| first.lock().unwrap().push(("first", r.clone(), a)));
    let _b = h.store.on_consent_change(move |r, a| second.lock().unwrap().push(("second", r.clone(), a)));

    let rec = h.store.reject_all().unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], ("first", rec.clone(), ConsentAction::RejectAll));
    assert_eq!(log[1], ("second", rec, ConsentAction::RejectAll));
}

#[test]
fn panicking_subscriber_does_not_block_the_next_one() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());

    let got = Arc::new(Mutex::new(None));
    let sink = got.clone();
    let _bad = h.store.on_consent_change(|_, _| panic!("subscriber bug"));
    let _good = h.store.on_consent_change(move |r, a| *sink.lock().unwrap() = Some((r.clone(), a)));

    let rec = h.store.accept_all().unwrap();
    assert_eq!(*got.lock().unwrap(), Some((rec, ConsentAction::AcceptAll)));
    assert_eq!(h.store.presentation(), Presentation::Hidden);
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let sub = h.store.on_consent_change(move |_, _| *counter.lock().unwrap() += 1);
    h.store.accept_all().unwrap();
    sub.unsubscribe();
    h.store.accept_all().unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn presentation_transitions_skip_redundant_notifications() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = h.store.on_presentation_change(move |p| sink.lock().unwrap().push(p));

    h.store.show_banner();
    h.store.show_preferences();
    h.store.open_manage();
    h.store.hide();
    h.store.hide();
    h.store.open_manage();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Presentation::Preferences, Presentation::Hidden, Presentation::Preferences]
    );
}

#[test]
fn reinitialize_replaces_configuration() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default().with_cookie_name("first"));
    assert_eq!(h.store.config().cookie_name, "first");

    h.store.initialize(ConsentOptions::default().with_cookie_expiry(7));
    let cfg = h.store.config();
    assert_eq!(cfg.cookie_name, "cc_consent");
    assert_eq!(cfg.cookie_expiry_days, 7);
}

#[test]
fn version_bump_invalidates_in_memory_record() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.store.accept_all().unwrap();
    assert!(h.store.has_valid_consent());

    // Second page load under a new version: the cookie from the first is stale.
    let mut next = harness(h.host.clone());
    assert_eq!(next.store.initialize(ConsentOptions::default().with_consent_version("2")), None);
    assert!(!next.store.has_valid_consent());
}

#[test]
fn headless_store_is_inert() {
    let mut store = ConsentStore::headless();
    assert_eq!(store.initialize(ConsentOptions::default()), None);
    assert!(!store.is_initialized());
    assert_eq!(store.consent(), None);
    assert_eq!(store.presentation(), Presentation::Hidden);
    assert_eq!(
        store.accept_all(),
        Err(ConsentError::NonInteractiveHost { operation: "update_consent" })
    );
}

#[test]
fn non_interactive_memory_host_rejects_updates_and_skips_init() {
    let host = frozen_host().with_interactive(false).with_gpc(true);
    let mut h = harness(host);
    assert_eq!(h.store.initialize(ConsentOptions::default()), None);
    assert!(h.layer.is_empty());
    assert!(h.store.reject_all().is_err());
    assert!(h.host.directives().is_empty());
}

#[test]
fn dispose_drops_subscribers_and_state_but_keeps_cookie() {
    let mut h = harness(frozen_host());
    h.store.initialize(ConsentOptions::default());
    h.store.accept_all().unwrap();

    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let _sub = h.store.on_consent_change(move |_, _| *counter.lock().unwrap() += 1);

    h.store.dispose();
    assert!(!h.store.is_initialized());
    assert_eq!(h.store.consent(), None);
    assert_eq!(h.store.presentation(), Presentation::Hidden);
    assert!(h.host.cookie("cc_consent").is_some());

    h.store.initialize(ConsentOptions::default()).unwrap();
    h.store.accept_all().unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
}
