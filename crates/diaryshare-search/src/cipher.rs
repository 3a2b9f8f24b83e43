//! The content cipher collaborator.
//!
//! Diary content is encrypted by the host application. This crate only needs
//! to turn an owner's derived key into a content key and decrypt text and
//! attachment blobs with it.

use std::fmt;

use async_trait::async_trait;
use diaryshare_core::{DerivedKey, OwnerId};

use crate::error::CipherError;

/// Key that decrypts an owner's diary content.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey(Vec<u8>);

impl ContentKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey(<{} bytes>)", self.0.len())
    }
}

/// Decrypts diary content on behalf of a share viewer.
#[async_trait]
pub trait DiaryCipher: Send + Sync {
    /// Derive the owner's content key from their derived key.
    async fn content_key(
        &self,
        owner: OwnerId,
        derived: &DerivedKey,
    ) -> Result<ContentKey, CipherError>;

    /// Decrypt an encrypted text field (entry text, date, filename).
    fn decrypt_text(&self, ciphertext: &str, key: &ContentKey) -> Result<String, CipherError>;

    /// Decrypt an attachment blob.
    fn decrypt_file(&self, data: &[u8], key: &ContentKey) -> Result<Vec<u8>, CipherError>;
}
