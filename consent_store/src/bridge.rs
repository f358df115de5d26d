//! Signal bridge: relays consent to a tag-management data layer.
//!
//! The store only sees the `ConsentSignals` trait. `GtagBridge` is the
//! data-layer implementation; `NoopSignals` drops everything.

use std::sync::{Arc, OnceLock};

use consent_core::{consent_params, ConsentAction, ConsentCategories, ConsentParams};
use parking_lot::Mutex;
use serde::ser::Serializer;
use serde::Serialize;

/// Injectable consent-signal sink.
pub trait ConsentSignals {
    /// Provisional or page-load state; emitted before any tag may fire.
    fn push_default(&mut self, categories: &ConsentCategories);

    /// A decision was made; also enqueues a `consent_update` event.
    fn push_update(&mut self, categories: &ConsentCategories, action: ConsentAction);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Default,
    Update,
}

/// A `("consent", kind, params)` submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentCommand {
    pub kind: CommandKind,
    pub params: ConsentParams,
}

impl Serialize for ConsentCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ("consent", self.kind, &self.params).serialize(serializer)
    }
}

/// Structured change record for downstream analytics consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentUpdateEvent {
    pub event: &'static str,
    pub consent_action: ConsentAction,
    pub consent_categories: ConsentCategories,
}

impl ConsentUpdateEvent {
    pub const NAME: &'static str = "consent_update";

    pub fn new(action: ConsentAction, categories: ConsentCategories) -> Self {
        Self {
            event: Self::NAME,
            consent_action: action,
            consent_categories: categories,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DataLayerEntry {
    Command(ConsentCommand),
    Event(ConsentUpdateEvent),
}

/// Shared FIFO queue read by analytics consumers.
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone, Debug, Default)]
pub struct DataLayer {
    entries: Arc<Mutex<Vec<DataLayerEntry>>>,
}

static GLOBAL_DATA_LAYER: OnceLock<DataLayer> = OnceLock::new();

impl DataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide queue, created on first use.
    pub fn global() -> DataLayer {
        GLOBAL_DATA_LAYER.get_or_init(DataLayer::new).clone()
    }

    pub fn push(&self, entry: DataLayerEntry) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn entries(&self) -> Vec<DataLayerEntry> {
        self.entries.lock().clone()
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<DataLayerEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Current contents as a JSON array, the shape a page's `dataLayer` has.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&*self.entries.lock()).unwrap_or(serde_json::Value::Null)
    }
}

/// `gtag`-style bridge writing into a `DataLayer`.
#[derive(Clone, Debug, Default)]
pub struct GtagBridge {
    layer: DataLayer,
}

impl GtagBridge {
    pub fn new(layer: DataLayer) -> Self {
        Self { layer }
    }

    /// Bridge onto `DataLayer::global()`.
    pub fn global() -> Self {
        Self::new(DataLayer::global())
    }

    pub fn data_layer(&self) -> &DataLayer {
        &self.layer
    }

    fn gtag(&self, command: ConsentCommand) {
        self.layer.push(DataLayerEntry::Command(command));
    }
}

impl ConsentSignals for GtagBridge {
    fn push_default(&mut self, categories: &ConsentCategories) {
        self.gtag(ConsentCommand {
            kind: CommandKind::Default,
            params: consent_params(categories),
        });
    }

    fn push_update(&mut self, categories: &ConsentCategories, action: ConsentAction) {
        self.gtag(ConsentCommand {
            kind: CommandKind::Update,
            params: consent_params(categories),
        });
        self.layer
            .push(DataLayerEntry::Event(ConsentUpdateEvent::new(action, *categories)));
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSignals;

impl ConsentSignals for NoopSignals {
    fn push_default(&mut self, _categories: &ConsentCategories) {}

    fn push_update(&mut self, _categories: &ConsentCategories, _action: ConsentAction) {}
}
