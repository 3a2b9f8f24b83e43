//! Error types for the share service.

use diaryshare_core::CoreError;
use diaryshare_perms::PermsError;
use diaryshare_search::{CipherError, SearchError};
use diaryshare_store::StoreError;
use thiserror::Error;

use crate::mail::MailError;

/// How an error should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The share token is missing, malformed, unknown or does not open.
    Unauthorized,
    /// The token is valid but this viewer may not proceed.
    Forbidden,
    BadRequest,
    /// Mail delivery is not set up.
    Configuration,
    /// Mail delivery was attempted and failed.
    Delivery,
    Internal,
}

/// Errors that can occur during share operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Token resolution failed. Deliberately says nothing about why.
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("delivery failed: {0}")]
    Delivery(#[source] MailError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("permission error: {0}")]
    Perms(#[from] PermsError),

    #[error("archive error: {0}")]
    Search(#[from] SearchError),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("{0}")]
    Core(#[from] CoreError),
}

impl ShareError {
    pub(crate) fn forbidden(reason: &str) -> Self {
        Self::Forbidden(reason.to_string())
    }

    pub(crate) fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }

    /// Classify the error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Delivery(MailError::NotConfigured) => ErrorKind::Configuration,
            Self::Delivery(_) => ErrorKind::Delivery,
            Self::Search(SearchError::EmptyQuery | SearchError::InvalidIdentifier(_)) => {
                ErrorKind::BadRequest
            }
            Self::Core(CoreError::InvalidEmail(_) | CoreError::InvalidSettings(_)) => {
                ErrorKind::BadRequest
            }
            Self::Store(_) | Self::Perms(_) | Self::Search(_) | Self::Cipher(_) | Self::Core(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for share operations.
pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ShareError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(ShareError::forbidden("x").kind(), ErrorKind::Forbidden);
        assert_eq!(
            ShareError::from(SearchError::EmptyQuery).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ShareError::from(SearchError::FileNotFound("a".into())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            ShareError::from(CoreError::InvalidEmail("a".into())).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ShareError::Delivery(MailError::NotConfigured).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ShareError::Delivery(MailError::SendFailed("refused".into())).kind(),
            ErrorKind::Delivery
        );
    }

    #[test]
    fn test_unauthorized_message_is_opaque() {
        assert_eq!(ShareError::Unauthorized.to_string(), "unauthorized");
    }
}
