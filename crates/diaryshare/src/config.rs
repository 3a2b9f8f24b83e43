//! Service configuration.

use std::fmt;
use std::path::Path;

use diaryshare_core::{SmtpSettings, DEFAULT_COOKIE_DAYS};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShareError};

/// Verification code lifetime when not configured.
pub const DEFAULT_CODE_TTL_MINUTES: u32 = 10;

/// Configuration for a [`ShareService`](crate::ShareService).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// HMAC key for session credentials.
    pub server_secret: String,
    /// Lifetime of an emailed verification code, in minutes.
    pub code_ttl_minutes: u32,
    /// Cookie lifetime for owners who never chose one.
    pub default_cookie_days: i64,
    /// Server-wide SMTP settings, used when an owner has no override.
    pub global_smtp: SmtpSettings,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            server_secret: String::new(),
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
            default_cookie_days: i64::from(DEFAULT_COOKIE_DAYS),
            global_smtp: SmtpSettings::default(),
        }
    }
}

impl fmt::Debug for ShareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConfig")
            .field("server_secret", &"<redacted>")
            .field("code_ttl_minutes", &self.code_ttl_minutes)
            .field("default_cookie_days", &self.default_cookie_days)
            .field("global_smtp", &self.global_smtp)
            .finish()
    }
}

impl ShareConfig {
    /// A default configuration with the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            server_secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ShareError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ShareError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_secret.is_empty() {
            return Err(ShareError::Configuration("server_secret must be set".into()));
        }
        if self.code_ttl_minutes == 0 {
            return Err(ShareError::Configuration(
                "code_ttl_minutes must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Cookie lifetime fallback in days; non-positive values mean 30.
    pub fn cookie_days_fallback(&self) -> u32 {
        u32::try_from(self.default_cookie_days)
            .ok()
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_COOKIE_DAYS)
    }

    /// The global SMTP settings with the port filled in.
    pub fn global_smtp_effective(&self) -> SmtpSettings {
        let mut settings = self.global_smtp.clone();
        settings.port = settings.effective_port();
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShareConfig::from_json_str(r#"{"server_secret":"s3cret"}"#).unwrap();
        assert_eq!(config.code_ttl_minutes, 10);
        assert_eq!(config.cookie_days_fallback(), 30);
        assert!(!config.global_smtp.is_configured());
        assert_eq!(config.global_smtp_effective().port, 587);
    }

    #[test]
    fn test_full_config() {
        let config = ShareConfig::from_json_str(
            r#"{
                "server_secret": "s3cret",
                "code_ttl_minutes": 15,
                "default_cookie_days": 7,
                "global_smtp": {"host": "mail.example.com", "from": "noreply@example.com"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.code_ttl_minutes, 15);
        assert_eq!(config.cookie_days_fallback(), 7);
        assert!(config.global_smtp.is_configured());
    }

    #[test]
    fn test_non_positive_cookie_days_fall_back() {
        let mut config = ShareConfig::with_secret("x");
        config.default_cookie_days = 0;
        assert_eq!(config.cookie_days_fallback(), 30);
        config.default_cookie_days = -4;
        assert_eq!(config.cookie_days_fallback(), 30);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            ShareConfig::from_json_str("{}"),
            Err(ShareError::Configuration(_))
        ));
        assert!(matches!(
            ShareConfig::from_json_str(r#"{"server_secret":"x","code_ttl_minutes":0}"#),
            Err(ShareError::Configuration(_))
        ));
        assert!(ShareConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("share.json");
        std::fs::write(&path, r#"{"server_secret":"abc"}"#).unwrap();

        let config = ShareConfig::from_json_file(&path).unwrap();
        assert_eq!(config.server_secret, "abc");

        assert!(ShareConfig::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
