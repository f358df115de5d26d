use serde::{Deserialize, Serialize};

use crate::category::{ConsentCategories, ConsentCategory};
use crate::cfg::ConsentConfig;

/// The persisted/observable consent decision.
///
/// Replaced wholesale on every change, never partially mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub categories: ConsentCategories,
    pub consent_version: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// Set when the record came from the global privacy signal.
    pub gpc: bool,
}

impl ConsentRecord {
    pub fn new(
        categories: ConsentCategories,
        consent_version: impl Into<String>,
        timestamp: impl Into<String>,
        gpc: bool,
    ) -> Self {
        Self {
            categories: categories.normalized(),
            consent_version: consent_version.into(),
            timestamp: timestamp.into(),
            gpc,
        }
    }

    /// A record is valid iff it was written under the configured schema version.
    #[inline]
    pub fn is_valid_for(&self, cfg: &ConsentConfig) -> bool {
        self.consent_version == cfg.consent_version
    }

    #[inline]
    pub fn is_granted(&self, category: ConsentCategory) -> bool {
        self.categories.is_granted(category)
    }
}

/// What external renderers should display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Hidden,
    Notice,
    Preferences,
}

impl Presentation {
    pub fn as_str(self) -> &'static str {
        match self {
            Presentation::Hidden => "hidden",
            Presentation::Notice => "notice",
            Presentation::Preferences => "preferences",
        }
    }
}
