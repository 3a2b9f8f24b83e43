//! Per-owner settings records: SMTP override and session cookie settings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::email::{is_valid_email, normalize_email};
use crate::error::{CoreError, Result};

/// Port used when an SMTP record leaves it unset.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Cookie lifetime used when neither the owner nor the server sets one.
pub const DEFAULT_COOKIE_DAYS: u32 = 30;

/// Smallest cookie lifetime an owner may choose.
pub const MIN_COOKIE_DAYS: u32 = 1;

/// Largest cookie lifetime an owner may choose.
pub const MAX_COOKIE_DAYS: u32 = 365;

/// Outbound mail server settings.
///
/// Used both as a per-owner override and as the server-wide default. A record
/// is "configured" when host and from-address are both non-blank.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl SmtpSettings {
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.from.trim().is_empty()
    }

    /// True when neither host nor from-address is set.
    pub fn is_cleared(&self) -> bool {
        self.host.trim().is_empty() && self.from.trim().is_empty()
    }

    /// Port to connect to, substituting the default for an unset port.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_SMTP_PORT
        } else {
            self.port
        }
    }

    /// Trim host and username, normalize the from-address, fill the port.
    pub fn normalized(self) -> Self {
        let port = self.effective_port();
        Self {
            host: self.host.trim().to_string(),
            port,
            username: self.username.trim().to_string(),
            password: self.password,
            from: normalize_email(&self.from),
        }
    }

    /// Reject half-configured records and invalid from-addresses.
    ///
    /// A fully cleared record is valid: it means "use the server default".
    pub fn validate(&self) -> Result<()> {
        if self.is_cleared() {
            return Ok(());
        }
        if self.host.trim().is_empty() || self.from.trim().is_empty() {
            return Err(CoreError::InvalidSettings(
                "host and from must both be provided".into(),
            ));
        }
        if !is_valid_email(self.from.trim()) {
            return Err(CoreError::InvalidSettings(format!(
                "invalid from email address: {}",
                self.from.trim()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("from", &self.from)
            .finish()
    }
}

/// Per-owner session cookie settings.
///
/// `cookie_version` is a revocation generation: credentials carry the version
/// current at issuance and stop validating once it is bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub cookie_days: u32,
    pub cookie_version: u64,
}

impl SessionSettings {
    pub fn new(cookie_days: u32) -> Self {
        Self {
            cookie_days,
            cookie_version: 1,
        }
    }

    /// Fill unset fields: days from `default_days` (or 30), version 1.
    pub fn normalized(mut self, default_days: u32) -> Self {
        if self.cookie_days == 0 {
            self.cookie_days = if default_days == 0 {
                DEFAULT_COOKIE_DAYS
            } else {
                default_days
            };
        }
        if self.cookie_version == 0 {
            self.cookie_version = 1;
        }
        self
    }

    /// Start a new revocation generation.
    pub fn bump_version(&mut self) {
        self.cookie_version = self.cookie_version.saturating_add(1);
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_DAYS)
    }
}

/// Validate an owner-chosen cookie lifetime.
pub fn validate_cookie_days(days: i64) -> Result<u32> {
    if days < i64::from(MIN_COOKIE_DAYS) || days > i64::from(MAX_COOKIE_DAYS) {
        return Err(CoreError::InvalidSettings(format!(
            "cookie_days must be between {} and {}",
            MIN_COOKIE_DAYS, MAX_COOKIE_DAYS
        )));
    }
    Ok(days as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp(host: &str, from: &str) -> SmtpSettings {
        SmtpSettings {
            host: host.into(),
            from: from.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_configured_requires_host_and_from() {
        assert!(smtp("mail.example.com", "diary@example.com").is_configured());
        assert!(!smtp("mail.example.com", "").is_configured());
        assert!(!smtp("  ", "diary@example.com").is_configured());
        assert!(!SmtpSettings::default().is_configured());
    }

    #[test]
    fn test_normalized() {
        let s = SmtpSettings {
            host: " mail.example.com ".into(),
            port: 0,
            username: " user ".into(),
            password: " keep spaces ".into(),
            from: " Diary@Example.com ".into(),
        }
        .normalized();
        assert_eq!(s.host, "mail.example.com");
        assert_eq!(s.port, DEFAULT_SMTP_PORT);
        assert_eq!(s.username, "user");
        assert_eq!(s.password, " keep spaces ");
        assert_eq!(s.from, "diary@example.com");
    }

    #[test]
    fn test_validate_host_xor_from() {
        assert!(smtp("mail.example.com", "").validate().is_err());
        assert!(smtp("", "diary@example.com").validate().is_err());
        assert!(smtp("", "").validate().is_ok());
        assert!(smtp("mail.example.com", "diary@example.com").validate().is_ok());
    }

    #[test]
    fn test_validate_from_address() {
        assert!(smtp("mail.example.com", "not-an-address").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let s = SmtpSettings {
            password: "hunter2".into(),
            ..smtp("h", "f@x.org")
        };
        let debug = format!("{:?}", s);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_smtp_deserialize_partial() {
        let s: SmtpSettings = serde_json::from_str(r#"{"host":"h"}"#).unwrap();
        assert_eq!(s.host, "h");
        assert_eq!(s.port, 0);
        assert_eq!(s.effective_port(), DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_session_settings_normalized() {
        let s = SessionSettings {
            cookie_days: 0,
            cookie_version: 0,
        }
        .normalized(14);
        assert_eq!(s.cookie_days, 14);
        assert_eq!(s.cookie_version, 1);

        let s = SessionSettings {
            cookie_days: 0,
            cookie_version: 5,
        }
        .normalized(0);
        assert_eq!(s.cookie_days, DEFAULT_COOKIE_DAYS);
        assert_eq!(s.cookie_version, 5);
    }

    #[test]
    fn test_bump_version() {
        let mut s = SessionSettings::default();
        s.bump_version();
        s.bump_version();
        assert_eq!(s.cookie_version, 3);
    }

    #[test]
    fn test_validate_cookie_days() {
        assert_eq!(validate_cookie_days(1).unwrap(), 1);
        assert_eq!(validate_cookie_days(365).unwrap(), 365);
        assert!(validate_cookie_days(0).is_err());
        assert!(validate_cookie_days(-3).is_err());
        assert!(validate_cookie_days(366).is_err());
    }
}
