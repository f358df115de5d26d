//consent_core/decide.rs

use crate::{category::ConsentCategories, cfg::ConsentConfig, state::ConsentRecord};

/// Outcome of the page-load decision procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitDecision {
    /// Privacy signal active and nothing persisted: deny everything and persist it.
    AutoDeny(ConsentRecord),
    /// Persisted record matches the configured version.
    Adopt(ConsentRecord),
    /// No usable record; the visitor has to decide.
    Defer,
}

impl InitDecision {
    pub fn record(&self) -> Option<&ConsentRecord> {
        match self {
            InitDecision::AutoDeny(r) | InitDecision::Adopt(r) => Some(r),
            InitDecision::Defer => None,
        }
    }
}

/// Decide what a fresh page load starts from.
///
/// `stored` is whatever decoded from storage, regardless of version: a stale
/// record still counts as persisted and suppresses the auto-deny path.
pub fn decide_initial(
    stored: Option<ConsentRecord>,
    gpc: bool,
    cfg: &ConsentConfig,
    timestamp: &str,
) -> InitDecision {
    match stored {
        None if gpc => InitDecision::AutoDeny(ConsentRecord::new(
            ConsentCategories::denied(),
            cfg.consent_version.clone(),
            timestamp,
            true,
        )),
        Some(rec) if rec.is_valid_for(cfg) => InitDecision::Adopt(rec),
        _ => InitDecision::Defer,
    }
}
