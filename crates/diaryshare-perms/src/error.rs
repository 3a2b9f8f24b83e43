//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur while issuing or opening share capabilities.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The wrapped key did not authenticate under the presented token.
    #[error("key unwrap failed")]
    KeyUnwrapFailed,

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] diaryshare_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
