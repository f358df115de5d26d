#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use consent_store::*;

pub const NOW: &str = "2024-05-01T10:00:00.000Z";

pub struct Harness {
    pub host: MemoryHost,
    pub layer: DataLayer,
    pub store: ConsentStore,
}

pub fn frozen_host() -> MemoryHost {
    MemoryHost::new().with_clock(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
}

pub fn harness(host: MemoryHost) -> Harness {
    let layer = DataLayer::new();
    let store = ConsentStore::new(host.clone(), GtagBridge::new(layer.clone()));
    Harness { host, layer, store }
}

pub fn stored_cookie(record: &ConsentRecord) -> String {
    format!("cc_consent={}", consent_core::encode_record(record))
}

pub fn record(version: &str, categories: ConsentCategories) -> ConsentRecord {
    ConsentRecord::new(categories, version, "2023-01-01T00:00:00.000Z", false)
}

/// `(kind, params)` for every command in the layer, plus `consent_update` events as JSON.
pub fn layer_json(layer: &DataLayer) -> Vec<serde_json::Value> {
    match layer.to_json() {
        serde_json::Value::Array(v) => v,
        other => panic!("data layer is not an array: {other}"),
    }
}
