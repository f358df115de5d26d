//! The consent store: one owned session per page.
//!
//! Owns configuration, the current record and the presentation state, and
//! orchestrates persistence, signalling and notification around them:
//! - every mutation replaces the record wholesale
//! - every mutation finishes its notifications before returning
//! - no threads, no blocking, no retries

use std::sync::Arc;

use consent_core::{
    decide_initial, CategoryChoices, ConsentAction, ConsentCategories, ConsentCategory,
    ConsentConfig, ConsentOptions, ConsentRecord, InitDecision, Presentation,
};
use tracing::{debug, info};

use crate::adapter::{timestamp, HeadlessHost, Host};
use crate::bridge::{ConsentSignals, NoopSignals};
use crate::bus::{ConsentListener, Listeners, PresentationListener, Subscription};
use crate::cookie::ConsentCookie;
use crate::error::{ConsentError, Result};

pub struct ConsentStore {
    host: Box<dyn Host>,
    signals: Box<dyn ConsentSignals>,
    cfg: ConsentConfig,
    record: Option<ConsentRecord>,
    presentation: Presentation,
    initialized: bool,
    consent_listeners: Listeners<ConsentListener>,
    presentation_listeners: Listeners<PresentationListener>,
}

impl std::fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore")
            .field("cfg", &self.cfg)
            .field("record", &self.record)
            .field("presentation", &self.presentation)
            .field("initialized", &self.initialized)
            .field("consent_listeners", &self.consent_listeners)
            .field("presentation_listeners", &self.presentation_listeners)
            .finish_non_exhaustive()
    }
}

impl ConsentStore {
    /// Create an uninitialized store. Presentation starts `Hidden`.
    pub fn new(host: impl Host + 'static, signals: impl ConsentSignals + 'static) -> Self {
        Self {
            host: Box::new(host),
            signals: Box::new(signals),
            cfg: ConsentConfig::default(),
            record: None,
            presentation: Presentation::Hidden,
            initialized: false,
            consent_listeners: Listeners::new("consent"),
            presentation_listeners: Listeners::new("presentation"),
        }
    }

    /// A store for contexts without a display surface.
    pub fn headless() -> Self {
        Self::new(HeadlessHost, NoopSignals)
    }

    /// Run the page-load decision procedure.
    ///
    /// Returns the record now in force, or `None` when the visitor still has
    /// to decide. On a non-interactive host this returns `None` and touches nothing.
    pub fn initialize(&mut self, options: ConsentOptions) -> Option<ConsentRecord> {
        if !self.host.is_interactive() {
            debug!("no interactive host; skipping consent initialization");
            return None;
        }

        self.cfg = options.resolve();
        self.initialized = true;

        // Nothing may track before a decision is reached.
        self.signals.push_default(&ConsentCategories::denied());

        let gpc = self.host.global_privacy_control();
        let stored = ConsentCookie::new(&self.cfg).read(self.host.as_ref());
        let now = timestamp(self.host.as_ref());

        let decision = decide_initial(stored, gpc, &self.cfg, &now);
        match &decision {
            InitDecision::AutoDeny(rec) => {
                debug!(version = %self.cfg.consent_version, "privacy signal active; denying by default");
                ConsentCookie::new(&self.cfg).write(self.host.as_ref(), rec);
                self.signals.push_update(&rec.categories, ConsentAction::Gpc);
            }
            InitDecision::Adopt(rec) => {
                debug!(version = %rec.consent_version, "adopting stored consent");
                self.signals.push_default(&rec.categories);
            }
            InitDecision::Defer => {
                debug!(version = %self.cfg.consent_version, "no valid consent; showing notice");
            }
        }

        self.record = decision.record().cloned();
        self.set_presentation(match self.record {
            Some(_) => Presentation::Hidden,
            None => Presentation::Notice,
        });
        self.record.clone()
    }

    /// Copy of the current record.
    pub fn consent(&self) -> Option<ConsentRecord> {
        self.record.clone()
    }

    pub fn config(&self) -> ConsentConfig {
        self.cfg.clone()
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn has_valid_consent(&self) -> bool {
        self.record
            .as_ref()
            .is_some_and(|r| r.is_valid_for(&self.cfg))
    }

    /// Whether `category` is authorized by a valid record. `false` when there is none.
    pub fn is_granted(&self, category: ConsentCategory) -> bool {
        match &self.record {
            Some(r) if r.is_valid_for(&self.cfg) => r.is_granted(category),
            _ => false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Record a new decision built from `choices`.
    ///
    /// Omitted categories are denied. Persists, signals, notifies consent
    /// subscribers with `(record, action)` and hides the UI.
    pub fn update_consent(
        &mut self,
        choices: CategoryChoices,
        action: ConsentAction,
    ) -> Result<ConsentRecord> {
        if !self.host.is_interactive() {
            return Err(ConsentError::NonInteractiveHost {
                operation: "update_consent",
            });
        }

        let rec = ConsentRecord::new(
            choices.resolve(),
            self.cfg.consent_version.clone(),
            timestamp(self.host.as_ref()),
            self.host.global_privacy_control(),
        );
        info!(
            action = action.as_str(),
            functional = rec.categories.functional,
            analytics = rec.categories.analytics,
            marketing = rec.categories.marketing,
            "consent updated"
        );

        self.record = Some(rec.clone());
        ConsentCookie::new(&self.cfg).write(self.host.as_ref(), &rec);
        self.signals.push_update(&rec.categories, action);
        self.consent_listeners.notify_each(|cb| cb(&rec, action));
        self.set_presentation(Presentation::Hidden);
        Ok(rec)
    }

    pub fn accept_all(&mut self) -> Result<ConsentRecord> {
        self.update_consent(CategoryChoices::all(true), ConsentAction::AcceptAll)
    }

    pub fn reject_all(&mut self) -> Result<ConsentRecord> {
        self.update_consent(CategoryChoices::all(false), ConsentAction::RejectAll)
    }

    /// Forget the decision: delete the cookie, deny by default, show the notice.
    ///
    /// Consent subscribers are not notified; no decision was made.
    pub fn reset_consent(&mut self) {
        info!(cookie = %self.cfg.cookie_name, "consent reset");
        ConsentCookie::new(&self.cfg).remove(self.host.as_ref());
        self.record = None;
        if self.host.is_interactive() {
            self.signals.push_default(&ConsentCategories::denied());
        }
        self.set_presentation(Presentation::Notice);
    }

    pub fn on_consent_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConsentRecord, ConsentAction) + Send + Sync + 'static,
    {
        self.consent_listeners.add(Arc::new(callback))
    }

    pub fn on_presentation_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Presentation) + Send + Sync + 'static,
    {
        self.presentation_listeners.add(Arc::new(callback))
    }

    pub fn show_banner(&mut self) {
        self.set_presentation(Presentation::Notice);
    }

    pub fn show_preferences(&mut self) {
        self.set_presentation(Presentation::Preferences);
    }

    pub fn hide(&mut self) {
        self.set_presentation(Presentation::Hidden);
    }

    /// Entry point for a "manage cookies" link.
    pub fn open_manage(&mut self) {
        self.show_preferences();
    }

    /// Tear the session down: drop subscribers and in-memory state.
    ///
    /// The persisted cookie is left alone; use `reset_consent` to forget it.
    pub fn dispose(&mut self) {
        debug!("disposing consent store");
        self.consent_listeners.clear();
        self.presentation_listeners.clear();
        self.record = None;
        self.presentation = Presentation::Hidden;
        self.cfg = ConsentConfig::default();
        self.initialized = false;
    }

    fn set_presentation(&mut self, next: Presentation) {
        if self.presentation == next {
            return;
        }
        debug!(from = self.presentation.as_str(), to = next.as_str(), "presentation change");
        self.presentation = next;
        self.presentation_listeners.notify_each(|cb| cb(next));
    }
}
