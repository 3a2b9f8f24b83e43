//! Error types for archive reading and search.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`DiaryCipher`](crate::DiaryCipher) implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CipherError(pub String);

/// Errors that can occur while reading or searching an archive.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query is empty or only whitespace.
    #[error("search query is empty")]
    EmptyQuery,

    /// A month document did not match the expected schema.
    #[error("malformed month document {year:04}-{month:02}: {reason}")]
    MalformedDocument { year: i32, month: u32, reason: String },

    /// Reading from the archive failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The attachment does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// An identifier would escape the owner's directory.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Content key derivation or decryption failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
}

impl SearchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for archive and search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
