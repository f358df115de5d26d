//! Persistence adapter: the single consent cookie.

use consent_core::{decode_record, encode_record, ConsentConfig, ConsentRecord};
use tracing::debug;

use crate::adapter::Host;

/// Reads, writes and deletes the consent record under the configured cookie.
///
/// Knows nothing about what the categories mean. Every operation is inert on
/// a non-interactive host.
#[derive(Clone, Copy, Debug)]
pub struct ConsentCookie<'a> {
    cfg: &'a ConsentConfig,
}

impl<'a> ConsentCookie<'a> {
    pub fn new(cfg: &'a ConsentConfig) -> Self {
        Self { cfg }
    }

    /// Stored record, or `None` when missing or undecodable.
    pub fn read(&self, host: &dyn Host) -> Option<ConsentRecord> {
        if !host.is_interactive() {
            return None;
        }
        let header = host.cookie_header();
        let raw = find_cookie(&header, &self.cfg.cookie_name)?;
        match decode_record(raw) {
            Ok(rec) => Some(rec),
            Err(e) => {
                debug!(cookie = %self.cfg.cookie_name, error = %e, "discarding unreadable consent cookie");
                None
            }
        }
    }

    pub fn write(&self, host: &dyn Host, record: &ConsentRecord) {
        if !host.is_interactive() {
            return;
        }
        let directive = self.write_directive(&encode_record(record), host.is_secure_origin());
        host.set_cookie(&directive);
    }

    /// Expire the cookie with the same scope it was written with.
    pub fn remove(&self, host: &dyn Host) {
        if !host.is_interactive() {
            return;
        }
        host.set_cookie(&self.remove_directive());
    }

    /// `Secure` is only added on secure origins; an insecure page would drop the cookie.
    pub fn write_directive(&self, value: &str, secure: bool) -> String {
        let mut parts = vec![
            format!("{}={}", self.cfg.cookie_name, value),
            "path=/".to_string(),
            format!("max-age={}", self.cfg.max_age_secs()),
            "SameSite=Lax".to_string(),
        ];
        if let Some(domain) = &self.cfg.cookie_domain {
            parts.push(format!("domain={domain}"));
        }
        if secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }

    pub fn remove_directive(&self) -> String {
        let mut parts = vec![
            format!("{}=", self.cfg.cookie_name),
            "path=/".to_string(),
            "max-age=0".to_string(),
            "SameSite=Lax".to_string(),
        ];
        if let Some(domain) = &self.cfg.cookie_domain {
            parts.push(format!("domain={domain}"));
        }
        parts.join("; ")
    }
}

/// Value of the exact cookie `name` in a `name=value; name=value` header.
pub fn find_cookie<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    header
        .split("; ")
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
}
