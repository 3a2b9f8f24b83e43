//! Strong type definitions for diary sharing.
//!
//! Identifiers and secrets are newtypes so a token hash can never be passed
//! where a raw token is expected, and so secrets never end up in logs through
//! `Debug`.

use std::fmt;

use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::encoding::TOKEN_ENGINE;
use crate::error::{CoreError, Result};

/// Identifier of a diary owner (the account that minted a share link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl OwnerId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OwnerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The bearer secret handed to a viewer inside a share link.
///
/// 32 random bytes, transported as URL-safe base64 with padding. The raw
/// token is never persisted: only its [`TokenHash`] is stored, and the bytes
/// themselves serve as the key that wraps the owner's derived key.
#[derive(Clone, PartialEq, Eq)]
pub struct RawToken([u8; 32]);

impl RawToken {
    /// Length of a decoded token in bytes.
    pub const LEN: usize = 32;

    /// Generate a new random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode a token received from a share link.
    ///
    /// Accepts the padded and unpadded URL-safe alphabet. Anything that does
    /// not decode to exactly 32 bytes is [`CoreError::MalformedToken`].
    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = TOKEN_ENGINE
            .decode(encoded)
            .map_err(|_| CoreError::MalformedToken)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::MalformedToken)?;
        Ok(Self(arr))
    }

    /// Encode for inclusion in a share link.
    pub fn encode(&self) -> String {
        TOKEN_ENGINE.encode(self.0)
    }

    /// Compute the lookup hash for this token.
    pub fn hash(&self) -> TokenHash {
        TokenHash::of(&self.0)
    }
}

impl fmt::Debug for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawToken(<redacted>)")
    }
}

/// SHA-256 of a raw token: the only token-derived value that is persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenHash(pub [u8; 32]);

impl TokenHash {
    /// Hash raw token bytes.
    pub fn of(token_bytes: &[u8]) -> Self {
        Self(Sha256::digest(token_bytes).into())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// URL-safe base64 with padding, the form embedded in session credentials.
    pub fn encode(&self) -> String {
        TOKEN_ENGINE.encode(self.0)
    }

    /// Parse the form produced by [`TokenHash::encode`].
    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = TOKEN_ENGINE
            .decode(encoded)
            .map_err(|e| CoreError::MalformedTokenHash(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::MalformedTokenHash("expected 32 bytes".into()))?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for TokenHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TokenHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        TokenHash::parse(&encoded).map_err(serde::de::Error::custom)
    }
}

/// The owner's login-derived key that unlocks their diary content.
///
/// Opaque to this crate; it is handed to the content cipher as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey(<{} bytes>)", self.0.len())
    }
}
