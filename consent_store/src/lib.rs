//! consent_store
//!
//! Session layer around `consent_core`.
//!
//! Responsibilities:
//! - own the current configuration, consent record and presentation state
//! - persist the record in the consent cookie
//! - relay consent to the tag-management data layer
//! - notify consent and presentation subscribers
//!
//! Non-goals:
//! - no rendering, DOM binding or focus management
//! - no server-side audit log
//! - no cross-site synchronization

pub mod adapter;
pub mod bridge;
pub mod bus;
pub mod cookie;
pub mod error;
pub mod store;

pub use adapter::{timestamp, HeadlessHost, Host, MemoryHost};

pub use bridge::{
    CommandKind,
    ConsentCommand,
    ConsentSignals,
    ConsentUpdateEvent,
    DataLayer,
    DataLayerEntry,
    GtagBridge,
    NoopSignals,
};

pub use bus::{ConsentListener, Listeners, PresentationListener, Subscription};
pub use cookie::{find_cookie, ConsentCookie};
pub use error::ConsentError;
pub use store::ConsentStore;

pub use consent_core::{
    CategoryChoices, ConsentAction, ConsentCategories, ConsentCategory, ConsentConfig,
    ConsentOptions, ConsentRecord, Presentation,
};
