//! Host capability layer: what the store needs from the page it runs in.
//!
//! The store never queries its environment directly. Embedders implement `Host`
//! (or use the provided `MemoryHost`) and non-interactive contexts use
//! `HeadlessHost`, which makes every consent operation a safe no-op.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

/// Capabilities of the hosting page.
pub trait Host {
    /// Whether there is an interactive display surface at all.
    fn is_interactive(&self) -> bool;

    /// The visitor's global privacy-opt-out signal.
    fn global_privacy_control(&self) -> bool;

    /// Whether the page itself was loaded over a secure transport.
    fn is_secure_origin(&self) -> bool;

    /// Current cookies as the page sees them: `name=value; name=value`.
    fn cookie_header(&self) -> String;

    /// Apply one `Set-Cookie`-style directive.
    fn set_cookie(&self, directive: &str);

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.
pub fn timestamp(host: &dyn Host) -> String {
    host.now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stand-in for contexts with no display surface (server rendering, workers).
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessHost;

impl Host for HeadlessHost {
    fn is_interactive(&self) -> bool {
        false
    }

    fn global_privacy_control(&self) -> bool {
        false
    }

    fn is_secure_origin(&self) -> bool {
        false
    }

    fn cookie_header(&self) -> String {
        String::new()
    }

    fn set_cookie(&self, _directive: &str) {}
}

#[derive(Debug, Default)]
struct MemoryHostState {
    interactive: bool,
    gpc: bool,
    secure: bool,
    /// Insertion-ordered `(name, value)` pairs.
    cookies: Vec<(String, String)>,
    directives: Vec<String>,
    clock: Option<DateTime<Utc>>,
}

/// Interactive in-memory host with a cookie jar that honors the directives it receives.
///
/// Cloning yields another handle onto the same jar, so a caller can keep one
/// handle while the store owns the other.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    inner: Arc<Mutex<MemoryHostState>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Interactive, insecure origin, no privacy signal, empty jar, system clock.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryHostState {
                interactive: true,
                ..MemoryHostState::default()
            })),
        }
    }

    pub fn with_gpc(self, gpc: bool) -> Self {
        self.set_gpc(gpc);
        self
    }

    pub fn with_secure_origin(self, secure: bool) -> Self {
        self.set_secure_origin(secure);
        self
    }

    pub fn with_interactive(self, interactive: bool) -> Self {
        self.set_interactive(interactive);
        self
    }

    /// Seed the jar from a `name=value; name=value` header.
    pub fn with_cookie_header(self, header: &str) -> Self {
        {
            let mut st = self.inner.lock();
            for pair in header.split(';') {
                let pair = pair.trim();
                if let Some((name, value)) = pair.split_once('=') {
                    upsert(&mut st.cookies, name.trim(), value);
                }
            }
        }
        self
    }

    /// Freeze the clock at `at`.
    pub fn with_clock(self, at: DateTime<Utc>) -> Self {
        self.inner.lock().clock = Some(at);
        self
    }

    pub fn set_gpc(&self, gpc: bool) {
        self.inner.lock().gpc = gpc;
    }

    pub fn set_secure_origin(&self, secure: bool) {
        self.inner.lock().secure = secure;
    }

    pub fn set_interactive(&self, interactive: bool) {
        self.inner.lock().interactive = interactive;
    }

    pub fn set_clock(&self, at: Option<DateTime<Utc>>) {
        self.inner.lock().clock = at;
    }

    /// Raw value currently stored under `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let st = self.inner.lock();
        st.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Every directive applied so far, oldest first.
    pub fn directives(&self) -> Vec<String> {
        self.inner.lock().directives.clone()
    }

    pub fn last_directive(&self) -> Option<String> {
        self.inner.lock().directives.last().cloned()
    }
}

fn upsert(cookies: &mut Vec<(String, String)>, name: &str, value: &str) {
    match cookies.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = value.to_string(),
        None => cookies.push((name.to_string(), value.to_string())),
    }
}

/// `max-age` at or below zero expires the cookie immediately.
fn expires_now(attrs: &str) -> bool {
    attrs.split(';').any(|attr| {
        let attr = attr.trim();
        match attr.split_once('=') {
            Some((k, v)) if k.eq_ignore_ascii_case("max-age") => {
                v.trim().parse::<i64>().map(|secs| secs <= 0).unwrap_or(false)
            }
            _ => false,
        }
    })
}

impl Host for MemoryHost {
    fn is_interactive(&self) -> bool {
        self.inner.lock().interactive
    }

    fn global_privacy_control(&self) -> bool {
        self.inner.lock().gpc
    }

    fn is_secure_origin(&self) -> bool {
        self.inner.lock().secure
    }

    fn cookie_header(&self) -> String {
        let st = self.inner.lock();
        st.cookies
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set_cookie(&self, directive: &str) {
        let mut st = self.inner.lock();
        st.directives.push(directive.to_string());

        let (pair, attrs) = directive.split_once(';').unwrap_or((directive, ""));
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();
        if expires_now(attrs) {
            st.cookies.retain(|(n, _)| n != name);
        } else {
            upsert(&mut st.cookies, name, value);
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.inner.lock().clock.unwrap_or_else(Utc::now)
    }
}
