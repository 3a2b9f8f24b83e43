//! Wrapped-key envelope.
//!
//! The owner's derived key is sealed under the raw share token and stored as
//! a small CBOR envelope next to the token hash.

use diaryshare_core::{DerivedKey, RawToken};
use serde::{Deserialize, Serialize};

use crate::crypto::{SealNonce, Sealed, SealingKey};
use crate::error::{PermsError, Result};

/// Format identifier for wrapped keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum WrapFormat {
    /// ChaCha20-Poly1305 keyed by the raw token bytes.
    ChaCha20Poly1305 = 1,
}

/// A derived key sealed under a share token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    pub format: WrapFormat,
    pub nonce: SealNonce,
    /// Sealed key bytes including the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl WrappedKey {
    /// Seal `derived` under `token`.
    pub fn seal(derived: &DerivedKey, token: &RawToken) -> Result<Self> {
        let Sealed { nonce, ciphertext } = SealingKey::from_token(token).seal(derived.as_bytes())?;

        Ok(Self {
            format: WrapFormat::ChaCha20Poly1305,
            nonce,
            ciphertext,
        })
    }

    /// Recover the derived key. Any authentication failure is
    /// [`PermsError::KeyUnwrapFailed`].
    pub fn open(&self, token: &RawToken) -> Result<DerivedKey> {
        match self.format {
            WrapFormat::ChaCha20Poly1305 => SealingKey::from_token(token)
                .open(&Sealed {
                    nonce: self.nonce,
                    ciphertext: self.ciphertext.clone(),
                })
                .map(DerivedKey::from_bytes)
                .map_err(|_| PermsError::KeyUnwrapFailed),
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PermsError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
    }
}
