//! Consent-signal vocabulary understood by tag-management bridges.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::category::{ConsentCategories, ConsentCategory};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Granted,
    Denied,
}

impl SignalState {
    #[inline]
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            SignalState::Granted
        } else {
            SignalState::Denied
        }
    }
}

/// One state per mapped signal name, in category order.
///
/// Serializes as a JSON object whose key order follows the mapping table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentParams(Vec<(&'static str, SignalState)>);

impl ConsentParams {
    pub fn get(&self, signal: &str) -> Option<SignalState> {
        self.0.iter().find(|(name, _)| *name == signal).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, SignalState)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ConsentParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, state) in &self.0 {
            map.serialize_entry(name, state)?;
        }
        map.end()
    }
}

/// Translate a category map into the signal vocabulary.
pub fn consent_params(categories: &ConsentCategories) -> ConsentParams {
    let mut out = Vec::with_capacity(7);
    for cat in ConsentCategory::ALL {
        let state = SignalState::from_granted(categories.get(cat));
        for name in cat.signal_names() {
            out.push((*name, state));
        }
    }
    ConsentParams(out)
}
