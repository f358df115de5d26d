#![allow(clippy::missing_safety_doc)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;

use consent_core::{CategoryChoices, ConsentAction, ConsentOptions, ConsentRecord, Presentation};
use consent_store::{ConsentError, ConsentStore, DataLayer, GtagBridge, MemoryHost, Subscription};

/// FFI ABI version for consent_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const CC_CONSENT_FFI_VERSION: u32 = 2;

pub const CC_OK: i32 = 0;
pub const CC_ERR_NULL: i32 = -1;
pub const CC_ERR_UTF8: i32 = -2;
pub const CC_ERR_CONFIG: i32 = -3;
pub const CC_ERR_NOT_INTERACTIVE: i32 = -4;
pub const CC_ERR_ACTION: i32 = -5;
/// The store is in the middle of delivering a callback.
pub const CC_ERR_REENTRANT: i32 = -6;

#[no_mangle]
pub extern "C" fn cc_consent_ffi_version() -> u32 {
    CC_CONSENT_FFI_VERSION
}

/// Opaque handle exposed over FFI.
///
/// Entry points only ever take a shared reference to the handle. The store sits
/// behind a `RefCell` that stays mutably borrowed while callbacks run, so a
/// callback reaching back into the store is refused instead of aliased.
pub struct CcConsentStore {
    inner: RefCell<ConsentStore>,
    host: MemoryHost,
    layer: DataLayer,
    subs: RefCell<HashMap<u64, Subscription>>,
    next_token: Cell<u64>,
}

/// FFI string view (UTF-8 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CcStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl CcStr {
    fn as_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).ok()
    }
}

/// Owned byte buffer; free with `cc_consent_bytes_free`.
#[repr(C)]
pub struct CcBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl CcBytes {
    fn empty() -> Self {
        CcBytes { ptr: ptr::null_mut(), len: 0 }
    }

    fn from_vec(v: Vec<u8>) -> Self {
        let mut boxed = v.into_boxed_slice();
        let ptr = boxed.as_mut_ptr();
        let len = boxed.len();
        std::mem::forget(boxed);
        CcBytes { ptr, len }
    }
}

/// What the embedder knows about the page.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CcHostDesc {
    pub interactive: u8,
    pub gpc: u8,
    pub secure: u8,
    /// Current `document.cookie`-style header (may be null).
    pub cookie_header: CcStr,
}

/// Category flags of a record (1 = granted).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CcConsent {
    pub necessary: u8,
    pub functional: u8,
    pub analytics: u8,
    pub marketing: u8,
    pub gpc: u8,
}

impl From<&ConsentRecord> for CcConsent {
    fn from(r: &ConsentRecord) -> Self {
        CcConsent {
            necessary: r.categories.necessary as u8,
            functional: r.categories.functional as u8,
            analytics: r.categories.analytics as u8,
            marketing: r.categories.marketing as u8,
            gpc: r.gpc as u8,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcPresentation {
    Hidden = 0,
    Notice = 1,
    Preferences = 2,
}

fn presentation_to_ffi(p: Presentation) -> CcPresentation {
    match p {
        Presentation::Hidden => CcPresentation::Hidden,
        Presentation::Notice => CcPresentation::Notice,
        Presentation::Preferences => CcPresentation::Preferences,
    }
}

/// Action codes: 0 accept_all, 1 reject_all, 2 custom, 3 gpc.
fn action_from_ffi(code: i32) -> Option<ConsentAction> {
    match code {
        0 => Some(ConsentAction::AcceptAll),
        1 => Some(ConsentAction::RejectAll),
        2 => Some(ConsentAction::Custom),
        3 => Some(ConsentAction::Gpc),
        _ => None,
    }
}

fn action_to_ffi(a: ConsentAction) -> i32 {
    match a {
        ConsentAction::AcceptAll => 0,
        ConsentAction::RejectAll => 1,
        ConsentAction::Custom => 2,
        ConsentAction::Gpc => 3,
    }
}

/// `-1` omitted, `0` denied, anything else granted.
fn tri_state(v: i8) -> Option<bool> {
    if v < 0 {
        None
    } else {
        Some(v != 0)
    }
}

fn error_rc(e: &ConsentError) -> i32 {
    match e {
        ConsentError::NonInteractiveHost { .. } => CC_ERR_NOT_INTERACTIVE,
    }
}

/// Consent-change callback: the new record's flags and the action code.
///
/// Runs synchronously inside the call that changed consent. While it runs the
/// store is busy: every entry point that reads or changes store state returns
/// `CC_ERR_REENTRANT` (or its empty/zero value). Host setters,
/// `cc_consent_unsubscribe`, `cc_consent_cookie_header` and
/// `cc_consent_take_data_layer` remain usable. Do not free the handle here.
pub type CcConsentCallback = extern "C" fn(user_data: *mut c_void, consent: CcConsent, action: i32);

/// Presentation-change callback: the new state. Same contract as `CcConsentCallback`;
/// the state argument is current, there is no need to query it back.
pub type CcPresentationCallback = extern "C" fn(user_data: *mut c_void, state: CcPresentation);

/// Embedder-owned pointer handed back to callbacks verbatim.
#[derive(Clone, Copy)]
struct UserData(*mut c_void);

// The store is single-threaded; the pointer is only ever passed back to the embedder.
unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

impl CcConsentStore {
    fn with_store<R>(&self, f: impl FnOnce(&ConsentStore) -> R) -> Result<R, i32> {
        match self.inner.try_borrow() {
            Ok(store) => Ok(f(&store)),
            Err(_) => Err(CC_ERR_REENTRANT),
        }
    }

    fn with_store_mut<R>(&self, f: impl FnOnce(&mut ConsentStore) -> R) -> Result<R, i32> {
        match self.inner.try_borrow_mut() {
            Ok(mut store) => Ok(f(&mut store)),
            Err(_) => {
                tracing::warn!("consent store called back from its own callback; refusing");
                Err(CC_ERR_REENTRANT)
            }
        }
    }

    fn keep_subscription(&self, sub: Subscription) -> u64 {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        match self.subs.try_borrow_mut() {
            Ok(mut subs) => {
                subs.insert(token, sub);
                token
            }
            Err(_) => {
                sub.unsubscribe();
                0
            }
        }
    }
}

fn rc(result: Result<(), i32>) -> i32 {
    match result {
        Ok(()) => CC_OK,
        Err(code) => code,
    }
}

/// Create a store over an in-memory host seeded from `host`.
#[no_mangle]
pub extern "C" fn cc_consent_store_new(host: CcHostDesc) -> *mut CcConsentStore {
    let mem = MemoryHost::new()
        .with_interactive(host.interactive != 0)
        .with_gpc(host.gpc != 0)
        .with_secure_origin(host.secure != 0)
        .with_cookie_header(host.cookie_header.as_str().unwrap_or(""));
    let layer = DataLayer::new();
    let inner = ConsentStore::new(mem.clone(), GtagBridge::new(layer.clone()));
    Box::into_raw(Box::new(CcConsentStore {
        inner: RefCell::new(inner),
        host: mem,
        layer,
        subs: RefCell::new(HashMap::new()),
        next_token: Cell::new(1),
    }))
}

/// Free a handle. Ignored when called from one of the handle's own callbacks.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_store_free(h: *mut CcConsentStore) {
    let Some(handle) = h.as_ref() else {
        return;
    };
    if handle.inner.try_borrow_mut().is_err() {
        tracing::warn!("consent store freed from its own callback; ignoring");
        return;
    }
    drop(Box::from_raw(h));
}

/// Initialize from a JSON options object (`cookieName`, `consentVersion`, ...).
///
/// An empty or null string means defaults. Returns 1 when a record is in
/// force, 0 when the notice should be shown, negative on error.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_initialize(h: *mut CcConsentStore, config_json: CcStr) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };

    let options = if config_json.ptr.is_null() || config_json.len == 0 {
        ConsentOptions::default()
    } else {
        let Some(text) = config_json.as_str() else {
            return CC_ERR_UTF8;
        };
        match serde_json::from_str::<ConsentOptions>(text) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting consent configuration");
                return CC_ERR_CONFIG;
            }
        }
    };

    match handle.with_store_mut(|s| s.initialize(options)) {
        Ok(Some(_)) => 1,
        Ok(None) => 0,
        Err(code) => code,
    }
}

/// Copy the current record's flags into `out`. Returns 1 if present, 0 if absent.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_get(h: *mut CcConsentStore, out: *mut CcConsent) -> i32 {
    let (Some(handle), false) = (h.as_ref(), out.is_null()) else {
        return CC_ERR_NULL;
    };
    match handle.with_store(|s| s.consent()) {
        Ok(Some(r)) => {
            *out = CcConsent::from(&r);
            1
        }
        Ok(None) => 0,
        Err(code) => code,
    }
}

/// Current record in its stored JSON shape (empty buffer when absent).
#[no_mangle]
pub unsafe extern "C" fn cc_consent_get_json(h: *mut CcConsentStore) -> CcBytes {
    let Some(handle) = h.as_ref() else {
        return CcBytes::empty();
    };
    let record = handle.with_store(|s| s.consent()).ok().flatten();
    match record.and_then(|r| serde_json::to_vec(&r).ok()) {
        Some(bytes) => CcBytes::from_vec(bytes),
        None => CcBytes::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_has_valid(h: *mut CcConsentStore) -> u8 {
    let Some(handle) = h.as_ref() else {
        return 0;
    };
    handle.with_store(|s| s.has_valid_consent()).unwrap_or(false) as u8
}

fn finish_update(
    result: Result<consent_store::error::Result<ConsentRecord>, i32>,
    out: *mut CcConsent,
) -> i32 {
    match result {
        Ok(Ok(r)) => {
            if !out.is_null() {
                unsafe { *out = CcConsent::from(&r) };
            }
            CC_OK
        }
        Ok(Err(e)) => error_rc(&e),
        Err(code) => code,
    }
}

/// Record a decision. Category arguments are tri-state (`-1` omitted = denied).
/// `out` may be null.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_update(
    h: *mut CcConsentStore,
    functional: i8,
    analytics: i8,
    marketing: i8,
    action: i32,
    out: *mut CcConsent,
) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    let Some(action) = action_from_ffi(action) else {
        return CC_ERR_ACTION;
    };
    let choices = CategoryChoices {
        functional: tri_state(functional),
        analytics: tri_state(analytics),
        marketing: tri_state(marketing),
    };
    finish_update(handle.with_store_mut(|s| s.update_consent(choices, action)), out)
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_accept_all(h: *mut CcConsentStore, out: *mut CcConsent) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    finish_update(handle.with_store_mut(|s| s.accept_all()), out)
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_reject_all(h: *mut CcConsentStore, out: *mut CcConsent) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    finish_update(handle.with_store_mut(|s| s.reject_all()), out)
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_reset(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| s.reset_consent()))
}

/// Drop all callbacks and in-memory state; the handle stays usable.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_dispose(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| {
        if let Ok(mut subs) = handle.subs.try_borrow_mut() {
            subs.clear();
        }
        s.dispose();
    }))
}

/// Current presentation state. `Hidden` for a null handle or while a callback runs.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_presentation(h: *mut CcConsentStore) -> CcPresentation {
    let Some(handle) = h.as_ref() else {
        return CcPresentation::Hidden;
    };
    handle
        .with_store(|s| presentation_to_ffi(s.presentation()))
        .unwrap_or(CcPresentation::Hidden)
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_show_banner(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| s.show_banner()))
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_show_preferences(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| s.show_preferences()))
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_hide(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| s.hide()))
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_open_manage(h: *mut CcConsentStore) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    rc(handle.with_store_mut(|s| s.open_manage()))
}

/// Update the global privacy signal seen by later decisions.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_set_gpc(h: *mut CcConsentStore, gpc: u8) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    handle.host.set_gpc(gpc != 0);
    CC_OK
}

/// Whether later cookie writes carry `Secure`.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_set_secure(h: *mut CcConsentStore, secure: u8) -> i32 {
    let Some(handle) = h.as_ref() else {
        return CC_ERR_NULL;
    };
    handle.host.set_secure_origin(secure != 0);
    CC_OK
}

/// Register a consent-change callback. Returns a non-zero token, or 0 on bad input
/// or when called from a callback.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_on_change(
    h: *mut CcConsentStore,
    cb: Option<CcConsentCallback>,
    user_data: *mut c_void,
) -> u64 {
    let (Some(cb), Some(handle)) = (cb, h.as_ref()) else {
        return 0;
    };
    let ud = UserData(user_data);
    let sub = handle.with_store(|s| {
        s.on_consent_change(move |r, a| {
            let ud = ud;
            cb(ud.0, CcConsent::from(r), action_to_ffi(a))
        })
    });
    match sub {
        Ok(sub) => handle.keep_subscription(sub),
        Err(_) => 0,
    }
}

/// Register a presentation-change callback. Returns a non-zero token, or 0 on bad input
/// or when called from a callback.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_on_presentation(
    h: *mut CcConsentStore,
    cb: Option<CcPresentationCallback>,
    user_data: *mut c_void,
) -> u64 {
    let (Some(cb), Some(handle)) = (cb, h.as_ref()) else {
        return 0;
    };
    let ud = UserData(user_data);
    let sub = handle.with_store(|s| {
        s.on_presentation_change(move |p| {
            let ud = ud;
            cb(ud.0, presentation_to_ffi(p))
        })
    });
    match sub {
        Ok(sub) => handle.keep_subscription(sub),
        Err(_) => 0,
    }
}

/// Returns 1 if `token` was registered. Safe to call from a callback, including
/// the callback being removed.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_unsubscribe(h: *mut CcConsentStore, token: u64) -> u8 {
    let Some(handle) = h.as_ref() else {
        return 0;
    };
    let removed = match handle.subs.try_borrow_mut() {
        Ok(mut subs) => subs.remove(&token),
        Err(_) => None,
    };
    match removed {
        Some(sub) => {
            sub.unsubscribe();
            1
        }
        None => 0,
    }
}

/// Cookie header after everything the store wrote, for the embedder to mirror.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_cookie_header(h: *mut CcConsentStore) -> CcBytes {
    let Some(handle) = h.as_ref() else {
        return CcBytes::empty();
    };
    use consent_store::Host;
    CcBytes::from_vec(handle.host.cookie_header().into_bytes())
}

/// The stored value of the consent cookie alone (empty buffer when unset).
#[no_mangle]
pub unsafe extern "C" fn cc_consent_cookie_value(h: *mut CcConsentStore) -> CcBytes {
    let Some(handle) = h.as_ref() else {
        return CcBytes::empty();
    };
    let Ok(name) = handle.with_store(|s| s.config().cookie_name) else {
        return CcBytes::empty();
    };
    match handle.host.cookie(&name) {
        Some(v) => CcBytes::from_vec(v.into_bytes()),
        None => CcBytes::empty(),
    }
}

/// Drain queued data-layer entries as a JSON array.
#[no_mangle]
pub unsafe extern "C" fn cc_consent_take_data_layer(h: *mut CcConsentStore) -> CcBytes {
    let Some(handle) = h.as_ref() else {
        return CcBytes::empty();
    };
    let entries = handle.layer.drain();
    match serde_json::to_vec(&entries) {
        Ok(bytes) => CcBytes::from_vec(bytes),
        Err(_) => CcBytes::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn cc_consent_bytes_free(b: CcBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}
