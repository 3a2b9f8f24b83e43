//! Request and response shapes of the share endpoints.
//!
//! Field names match the JSON bodies exchanged with the browser.

use diaryshare_core::{DerivedKey, OwnerId, SmtpSettings, TokenHash};
use serde::{Deserialize, Serialize};

/// A share token that resolved to an owner.
#[derive(Debug, Clone)]
pub struct ResolvedShare {
    pub owner: OwnerId,
    pub derived_key: DerivedKey,
    pub token_hash: TokenHash,
}

/// Body of a code request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeRequest {
    pub email: String,
    /// Preferred mail language; empty means "use Accept-Language".
    pub language: String,
}

/// Body of a code submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSubmission {
    pub email: String,
    pub code: String,
}

/// Body of an SMTP test request. Blank host and from mean "use what is saved".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEmailRequest {
    pub to_email: String,
    #[serde(flatten)]
    pub settings: SmtpSettings,
}

/// Whether a viewer must verify, and whether they already have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStatus {
    pub required: bool,
    pub verified: bool,
}

/// The owner's verification settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSettingsView {
    pub emails: Vec<String>,
    /// Whether the owner's own SMTP override is configured.
    pub smtp_configured: bool,
}

/// The owner's SMTP settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpSettingsView {
    /// The owner's saved override (blank when never saved).
    pub settings: SmtpSettings,
    /// The settings mail is actually sent with.
    pub effective_settings: SmtpSettings,
    pub using_global_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bodies_tolerate_missing_fields() {
        let req: CodeRequest = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert_eq!(req.language, "");

        let sub: CodeSubmission = serde_json::from_str("{}").unwrap();
        assert_eq!(sub, CodeSubmission::default());
    }

    #[test]
    fn test_test_email_request_flattens_settings() {
        let req: TestEmailRequest = serde_json::from_str(
            r#"{"to_email":"me@example.com","host":"smtp.example.com","port":2525,"from":"x@example.com"}"#,
        )
        .unwrap();
        assert_eq!(req.to_email, "me@example.com");
        assert_eq!(req.settings.host, "smtp.example.com");
        assert_eq!(req.settings.port, 2525);
    }
}
