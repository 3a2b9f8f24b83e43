//! HMAC-SHA256 signing for session credentials.

use std::fmt;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::encoding::CREDENTIAL_ENGINE;
use crate::error::{CoreError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies credential payloads under the server secret.
///
/// Signatures are URL-safe base64 without padding. Verification runs in
/// constant time over the decoded tag.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
}

impl SessionSigner {
    /// Key the signer. An empty secret is refused.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CoreError::InvalidSigningKey("server secret is empty".into()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| CoreError::InvalidSigningKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Sign `message`, returning the encoded tag.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        CREDENTIAL_ENGINE.encode(mac.finalize().into_bytes())
    }

    /// Check an encoded tag against `message`.
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        let Ok(tag) = CREDENTIAL_ENGINE.decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        mac.verify_slice(&tag).is_ok()
    }
}

impl fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSigner(<redacted>)")
    }
}
