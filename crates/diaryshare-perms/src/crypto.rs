//! Authenticated encryption for wrapped keys.
//!
//! ChaCha20-Poly1305 with a fresh random nonce per message. The wrapping key
//! of a share capability is the 32 raw token bytes.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use diaryshare_core::RawToken;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{PermsError, Result};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit ChaCha20-Poly1305 key.
#[derive(Clone)]
pub struct SealingKey([u8; 32]);

impl SealingKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The key that wraps a capability is the token itself.
    pub fn from_token(token: &RawToken) -> Self {
        Self(*token.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Seal under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed> {
        self.seal_with(plaintext, SealNonce::generate())
    }

    /// Seal under a caller-chosen nonce. Never reuse a nonce with one key.
    pub fn seal_with(&self, plaintext: &[u8], nonce: SealNonce) -> Result<Sealed> {
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))?;
        Ok(Sealed { nonce, ciphertext })
    }

    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(&sealed.nonce.0), sealed.ciphertext.as_slice())
            .map_err(|e| PermsError::DecryptionError(e.to_string()))
    }
}

impl fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealingKey(<redacted>)")
    }
}

/// A 96-bit ChaCha20-Poly1305 nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealNonce(pub [u8; NONCE_LEN]);

impl SealNonce {
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Ciphertext (tag included) and the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: SealNonce,
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// `nonce || ciphertext`, the layout used for blobs stored whole.
    pub fn to_framed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce.0);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a framed blob. Anything shorter than a nonce plus a tag cannot
    /// have come from [`Sealed::to_framed`].
    pub fn from_framed(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(PermsError::DecryptionError(format!(
                "sealed blob too short: {} bytes",
                bytes.len()
            )));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut arr = [0u8; NONCE_LEN];
        arr.copy_from_slice(nonce);
        Ok(Self {
            nonce: SealNonce(arr),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let key = SealingKey::generate();
        let plaintext = b"derived key material";

        let sealed = key.seal(plaintext).unwrap();
        assert_ne!(sealed.ciphertext, plaintext);
        assert_eq!(sealed.ciphertext.len(), plaintext.len() + TAG_LEN);
        assert_eq!(key.open(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let sealed = SealingKey::generate().seal(b"secret").unwrap();
        assert!(SealingKey::generate().open(&sealed).is_err());
    }

    #[test]
    fn test_tampering_detected() {
        let key = SealingKey::generate();
        let mut sealed = key.seal_with(b"secret", SealNonce::from_bytes([1; 12])).unwrap();

        sealed.nonce = SealNonce::from_bytes([2; 12]);
        assert!(key.open(&sealed).is_err());

        sealed.nonce = SealNonce::from_bytes([1; 12]);
        sealed.ciphertext[0] ^= 0x01;
        assert!(key.open(&sealed).is_err());
    }

    #[test]
    fn test_framing() {
        let key = SealingKey::from_bytes([5; 32]);
        let sealed = key.seal(b"attachment").unwrap();

        let framed = sealed.to_framed();
        assert_eq!(&framed[..NONCE_LEN], sealed.nonce.as_bytes());
        assert_eq!(Sealed::from_framed(&framed).unwrap(), sealed);

        assert!(Sealed::from_framed(&framed[..NONCE_LEN + TAG_LEN - 1]).is_err());
    }

    #[test]
    fn test_key_from_token() {
        let token = RawToken::from_bytes([9; 32]);
        assert_eq!(SealingKey::from_token(&token).as_bytes(), &[9; 32]);
        assert_eq!(format!("{:?}", SealingKey::from_token(&token)), "SealingKey(<redacted>)");
    }
}
