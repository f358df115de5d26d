use serde::{Deserialize, Serialize};

pub const DEFAULT_COOKIE_NAME: &str = "cc_consent";
pub const DEFAULT_COOKIE_EXPIRY_DAYS: u32 = 365;
pub const DEFAULT_CONSENT_VERSION: &str = "1";

const SECS_PER_DAY: u64 = 86_400;

/// Fully-resolved configuration for one initialization cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentConfig {
    pub cookie_name: String,
    /// `None` leaves the cookie host-only.
    pub cookie_domain: Option<String>,
    pub cookie_expiry_days: u32,
    pub consent_version: String,
    pub gtm_id: Option<String>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_domain: None,
            cookie_expiry_days: DEFAULT_COOKIE_EXPIRY_DAYS,
            consent_version: DEFAULT_CONSENT_VERSION.to_string(),
            gtm_id: None,
        }
    }
}

impl ConsentConfig {
    /// Cookie lifetime in seconds (`max-age`).
    #[inline]
    pub fn max_age_secs(&self) -> u64 {
        u64::from(self.cookie_expiry_days) * SECS_PER_DAY
    }
}

/// Caller-supplied partial configuration.
///
/// Every field is optional; missing fields take the `ConsentConfig` defaults.
/// Deserializes from the same camelCase keys a page script would pass
/// (`cookieName`, `cookieDomain`, `cookieExpiry`, `consentVersion`, `gtmId`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsentOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_expiry: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtm_id: Option<String>,
}

impl ConsentOptions {
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Some(name.into());
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn with_cookie_expiry(mut self, days: u32) -> Self {
        self.cookie_expiry = Some(days);
        self
    }

    pub fn with_consent_version(mut self, version: impl Into<String>) -> Self {
        self.consent_version = Some(version.into());
        self
    }

    pub fn with_gtm_id(mut self, id: impl Into<String>) -> Self {
        self.gtm_id = Some(id.into());
        self
    }

    /// Merge onto `ConsentConfig::default()`.
    ///
    /// An empty domain or tag-manager id means "not configured".
    pub fn resolve(&self) -> ConsentConfig {
        let d = ConsentConfig::default();
        ConsentConfig {
            cookie_name: self.cookie_name.clone().unwrap_or(d.cookie_name),
            cookie_domain: non_empty(self.cookie_domain.as_deref()),
            cookie_expiry_days: self.cookie_expiry.unwrap_or(d.cookie_expiry_days),
            consent_version: self.consent_version.clone().unwrap_or(d.consent_version),
            gtm_id: non_empty(self.gtm_id.as_deref()),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|v| !v.is_empty()).map(str::to_string)
}
