use serde::{Deserialize, Serialize};

/// Closed set of processing purposes a visitor can authorize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentCategory {
    Necessary,
    Functional,
    Analytics,
    Marketing,
}

impl ConsentCategory {
    /// All categories in canonical order.
    pub const ALL: [ConsentCategory; 4] = [
        ConsentCategory::Necessary,
        ConsentCategory::Functional,
        ConsentCategory::Analytics,
        ConsentCategory::Marketing,
    ];

    /// Consent-signal names governed by this category.
    pub fn signal_names(self) -> &'static [&'static str] {
        match self {
            ConsentCategory::Necessary => &["security_storage"],
            ConsentCategory::Functional => &["functionality_storage", "personalization_storage"],
            ConsentCategory::Analytics => &["analytics_storage"],
            ConsentCategory::Marketing => &["ad_storage", "ad_user_data", "ad_personalization"],
        }
    }
}

/// Authorization for every category. All four keys are always present on the wire.
///
/// `necessary` is always `true`; the constructors enforce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentCategories {
    pub necessary: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl Default for ConsentCategories {
    fn default() -> Self {
        Self::denied()
    }
}

impl ConsentCategories {
    pub fn all_granted() -> Self {
        Self {
            necessary: true,
            functional: true,
            analytics: true,
            marketing: true,
        }
    }

    /// Everything but `necessary` denied.
    pub fn denied() -> Self {
        Self {
            necessary: true,
            functional: false,
            analytics: false,
            marketing: false,
        }
    }

    pub fn get(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Necessary => self.necessary,
            ConsentCategory::Functional => self.functional,
            ConsentCategory::Analytics => self.analytics,
            ConsentCategory::Marketing => self.marketing,
        }
    }

    /// Same as `get`, but `necessary` is granted regardless of the stored flag.
    pub fn is_granted(&self, category: ConsentCategory) -> bool {
        category == ConsentCategory::Necessary || self.get(category)
    }

    /// Restore the `necessary = true` invariant on data from outside.
    #[inline]
    pub fn normalized(mut self) -> Self {
        self.necessary = true;
        self
    }
}

/// Partial category input for a consent update.
///
/// An omitted category is an explicit opt-out, not "unchanged": there is no
/// merge with a previous record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryChoices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing: Option<bool>,
}

impl CategoryChoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one category. A `Necessary` choice is accepted and ignored.
    pub fn with(mut self, category: ConsentCategory, granted: bool) -> Self {
        match category {
            ConsentCategory::Necessary => {}
            ConsentCategory::Functional => self.functional = Some(granted),
            ConsentCategory::Analytics => self.analytics = Some(granted),
            ConsentCategory::Marketing => self.marketing = Some(granted),
        }
        self
    }

    pub fn all(granted: bool) -> Self {
        Self {
            functional: Some(granted),
            analytics: Some(granted),
            marketing: Some(granted),
        }
    }

    pub fn resolve(&self) -> ConsentCategories {
        ConsentCategories {
            necessary: true,
            functional: self.functional.unwrap_or(false),
            analytics: self.analytics.unwrap_or(false),
            marketing: self.marketing.unwrap_or(false),
        }
    }
}

/// What triggered a consent change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentAction {
    AcceptAll,
    RejectAll,
    #[default]
    Custom,
    /// Automatic opt-out from the global privacy signal.
    Gpc,
}

impl ConsentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentAction::AcceptAll => "accept_all",
            ConsentAction::RejectAll => "reject_all",
            ConsentAction::Custom => "custom",
            ConsentAction::Gpc => "gpc",
        }
    }
}
