//! The cached role session: its record, on-disk store and lifecycle.

use std::fmt;

use chrono::NaiveDateTime;

use crate::{aws::Credentials, constants::TOKEN_TTL_FORMAT};

pub mod manager;
pub mod store;

pub use manager::{ActiveSession, SessionManager, SessionState};
pub use store::SessionStore;

/// A complete role session, as persisted and as projected into the
/// environment. Incomplete data never becomes a `SessionRecord`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub profile: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Local time, second precision
    pub expires_at: NaiveDateTime,
}

impl SessionRecord {
    pub fn new(profile: &str, credentials: Credentials, expires_at: NaiveDateTime) -> Self {
        Self {
            profile: profile.to_string(),
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expires_at,
        }
    }

    /// Alias of the session token kept for older consumers
    pub fn security_token(&self) -> &str {
        &self.session_token
    }

    pub fn token_ttl(&self) -> String {
        format_token_ttl(self.expires_at)
    }

    pub fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.token_ttl())
            .finish()
    }
}

pub fn format_token_ttl(at: NaiveDateTime) -> String {
    at.format(TOKEN_TTL_FORMAT).to_string()
}

pub fn parse_token_ttl(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TOKEN_TTL_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(expires_at: NaiveDateTime) -> SessionRecord {
        SessionRecord {
            profile: "ds-nonprod".to_string(),
            access_key_id: "AKID".to_string(),
            secret_access_key: "SECRET".to_string(),
            session_token: "TOKEN".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_token_ttl_format() {
        assert_eq!(format_token_ttl(at(20, 5, 9)), "2030-01-01 20:05:09");
        assert_eq!(parse_token_ttl(" 2030-01-01 20:05:09\n"), Some(at(20, 5, 9)));
    }

    #[test]
    fn test_token_ttl_rejects_other_formats() {
        assert_eq!(parse_token_ttl("2030-01-01T20:05:09Z"), None);
        assert_eq!(parse_token_ttl(""), None);
        assert_eq!(parse_token_ttl("tomorrow"), None);
    }

    #[test]
    fn test_validity_boundary() {
        let now = at(12, 0, 0);
        assert!(record(now + TimeDelta::hours(1)).is_valid_at(now));
        assert!(!record(now - TimeDelta::seconds(1)).is_valid_at(now));
        assert!(!record(now).is_valid_at(now));
    }

    #[test]
    fn test_security_token_aliases_session_token() {
        assert_eq!(record(at(1, 0, 0)).security_token(), "TOKEN");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", record(at(1, 0, 0)));
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("TOKEN"));
    }
}
