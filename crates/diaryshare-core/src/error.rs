//! Error types for the diaryshare core primitives.

use thiserror::Error;

/// Errors raised while parsing or validating core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The token is not URL-safe base64 or does not decode to 32 bytes.
    #[error("malformed share token")]
    MalformedToken,

    /// The token hash is not a valid encoded SHA-256 digest.
    #[error("malformed token hash: {0}")]
    MalformedTokenHash(String),

    /// The email address failed syntactic validation.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A settings record failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The HMAC key could not be initialized.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
