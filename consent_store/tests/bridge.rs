use consent_store::*;
use serde_json::json;

#[test]
fn default_push_is_a_single_command() {
    let layer = DataLayer::new();
    let mut bridge = GtagBridge::new(layer.clone());
    bridge.push_default(&ConsentCategories::denied());

    let entries = layer.entries();
    assert_eq!(entries.len(), 1);
    let DataLayerEntry::Command(cmd) = &entries[0] else {
        panic!("expected a command, got {:?}", entries[0]);
    };
    assert_eq!(cmd.kind, CommandKind::Default);
    assert_eq!(cmd.params.len(), 7);
}

#[test]
fn update_push_adds_command_then_event() {
    let layer = DataLayer::new();
    let mut bridge = GtagBridge::new(layer.clone());
    bridge.push_update(&ConsentCategories::all_granted(), ConsentAction::AcceptAll);

    let v = layer.to_json();
    assert_eq!(v[0][1], "update");
    assert_eq!(v[0][2]["ad_personalization"], "granted");
    assert_eq!(
        v[1],
        json!({
            "event": "consent_update",
            "consent_action": "accept_all",
            "consent_categories": {
                "necessary": true,
                "functional": true,
                "analytics": true,
                "marketing": true
            }
        })
    );
}

#[test]
fn drain_empties_the_queue_in_order() {
    let layer = DataLayer::new();
    let mut bridge = GtagBridge::new(layer.clone());
    bridge.push_default(&ConsentCategories::denied());
    bridge.push_update(&ConsentCategories::denied(), ConsentAction::RejectAll);

    let drained = layer.drain();
    assert_eq!(drained.len(), 3);
    assert!(matches!(drained[0], DataLayerEntry::Command(ConsentCommand { kind: CommandKind::Default, .. })));
    assert!(matches!(drained[2], DataLayerEntry::Event(_)));
    assert!(layer.is_empty());
}

#[test]
fn global_layer_is_created_once() {
    let a = DataLayer::global();
    let b = GtagBridge::global();
    let before = a.len();
    a.push(DataLayerEntry::Event(ConsentUpdateEvent::new(
        ConsentAction::Custom,
        ConsentCategories::denied(),
    )));
    assert_eq!(b.data_layer().len(), before + 1);
}
