//! Outbound mail: message templates and the delivery seam.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use diaryshare_core::{EmailLanguage, SmtpSettings};
use thiserror::Error;

/// Mail delivery error.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP is not configured")]
    NotConfigured,

    #[error("failed to send email: {0}")]
    SendFailed(String),
}

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Verification code message in the viewer's language.
    pub fn verification_code(
        to: impl Into<String>,
        code: &str,
        ttl_minutes: u32,
        language: EmailLanguage,
    ) -> Self {
        let (subject, body) = match language {
            EmailLanguage::Nl => (
                "DailyTxT verificatiecode voor gedeelde toegang",
                format!(
                    "Je verificatiecode is: {code}\r\n\r\nDeze code verloopt over {ttl_minutes} minuten."
                ),
            ),
            EmailLanguage::En => (
                "DailyTxT share verification code",
                format!(
                    "Your verification code is: {code}\r\n\r\nThis code expires in {ttl_minutes} minutes."
                ),
            ),
        };
        Self {
            to: to.into(),
            subject: subject.to_string(),
            body,
        }
    }

    /// Message sent when the owner tests their SMTP settings.
    pub fn smtp_test(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: "DailyTxT SMTP test email".to_string(),
            body: "This is a test email from DailyTxT share verification settings.".to_string(),
        }
    }
}

/// Delivers mail through an SMTP server described by [`SmtpSettings`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, settings: &SmtpSettings, message: &MailMessage) -> Result<(), MailError>;
}

/// Mailer that records messages instead of sending them.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(SmtpSettings, MailMessage)>>,
    fail: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every message sent so far, with the settings it was sent through.
    pub fn sent(&self) -> Vec<(SmtpSettings, MailMessage)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<MailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, message)| message.clone())
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, settings: &SmtpSettings, message: &MailMessage) -> Result<(), MailError> {
        if !settings.is_configured() {
            return Err(MailError::NotConfigured);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::SendFailed("connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((settings.clone(), message.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_template() {
        let m = MailMessage::verification_code("a@b.c", "042917", 10, EmailLanguage::En);
        assert_eq!(m.subject, "DailyTxT share verification code");
        assert_eq!(
            m.body,
            "Your verification code is: 042917\r\n\r\nThis code expires in 10 minutes."
        );
    }

    #[test]
    fn test_dutch_template() {
        let m = MailMessage::verification_code("a@b.c", "123456", 15, EmailLanguage::Nl);
        assert_eq!(m.subject, "DailyTxT verificatiecode voor gedeelde toegang");
        assert!(m.body.contains("123456"));
        assert!(m.body.contains("15 minuten"));
    }

    #[tokio::test]
    async fn test_memory_mailer() {
        let mailer = MemoryMailer::new();
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            from: "noreply@example.com".into(),
            ..Default::default()
        };

        mailer
            .send(&settings, &MailMessage::smtp_test("x@example.com"))
            .await
            .unwrap();
        assert_eq!(mailer.sent().len(), 1);

        mailer.set_failing(true);
        assert!(matches!(
            mailer
                .send(&settings, &MailMessage::smtp_test("x@example.com"))
                .await,
            Err(MailError::SendFailed(_))
        ));

        assert!(matches!(
            mailer
                .send(&SmtpSettings::default(), &MailMessage::smtp_test("x@example.com"))
                .await,
            Err(MailError::NotConfigured)
        ));
        assert_eq!(mailer.sent().len(), 1);
    }
}
