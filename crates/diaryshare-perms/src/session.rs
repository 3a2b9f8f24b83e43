//! Stateless session credentials for verified viewers.
//!
//! A credential proves that a viewer verified a given email for a given
//! share link. It is a cookie value of the form
//! `base64url(json payload) "." base64url(hmac-sha256(secret, encoded payload))`
//! and is never stored server-side.

use std::fmt;

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use diaryshare_core::encoding::CREDENTIAL_ENGINE;
use diaryshare_core::{EmailAddress, SessionSigner, TokenHash};
use serde::{Deserialize, Serialize};

use crate::error::{PermsError, Result};

/// Name of the cookie carrying the credential.
pub const COOKIE_NAME: &str = "share_verification";

/// Signed payload of a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token_hash: TokenHash,
    pub email: EmailAddress,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Revocation generation at issuance. Absent or non-positive means 1.
    #[serde(default, skip_serializing_if = "is_unset")]
    pub version: i64,
}

fn is_unset(version: &i64) -> bool {
    *version <= 0
}

impl SessionCredential {
    /// Version with the legacy "unset" encoding resolved.
    pub fn effective_version(&self) -> u64 {
        if self.version <= 0 {
            1
        } else {
            self.version as u64
        }
    }
}

/// Why a presented credential was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialRejection {
    /// Not two segments, bad base64 or bad JSON.
    Malformed,
    BadSignature,
    /// Issued for a different share link.
    TokenMismatch,
    /// Issued before the owner's last mass invalidation.
    StaleVersion { presented: u64, current: u64 },
    Expired,
}

impl fmt::Display for CredentialRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => f.write_str("malformed"),
            Self::BadSignature => f.write_str("bad signature"),
            Self::TokenMismatch => f.write_str("token mismatch"),
            Self::StaleVersion { presented, current } => {
                write!(f, "stale version {} (current {})", presented, current)
            }
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// Builds and checks credential cookie values.
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    signer: SessionSigner,
}

impl CredentialCodec {
    pub fn new(signer: SessionSigner) -> Self {
        Self { signer }
    }

    /// Produce a cookie value binding `email` to `token_hash` until `expires_at`.
    pub fn build(
        &self,
        token_hash: TokenHash,
        email: &EmailAddress,
        expires_at: DateTime<Utc>,
        version: u64,
    ) -> Result<String> {
        let payload = SessionCredential {
            token_hash,
            email: email.clone(),
            exp: expires_at.timestamp(),
            version: i64::try_from(version).unwrap_or(i64::MAX),
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|e| PermsError::SerializationError(e.to_string()))?;
        let encoded = CREDENTIAL_ENGINE.encode(json);
        let signature = self.signer.sign(&encoded);
        Ok(format!("{}.{}", encoded, signature))
    }

    /// Check a cookie value for `token_hash` against the owner's current
    /// version as of `now`. A credential is still valid during its expiry second.
    pub fn parse(
        &self,
        value: &str,
        token_hash: &TokenHash,
        current_version: u64,
        now: DateTime<Utc>,
    ) -> std::result::Result<SessionCredential, CredentialRejection> {
        let mut parts = value.split('.');
        let (Some(encoded), Some(signature), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialRejection::Malformed);
        };

        if !self.signer.verify(encoded, signature) {
            return Err(CredentialRejection::BadSignature);
        }

        let json = CREDENTIAL_ENGINE
            .decode(encoded)
            .map_err(|_| CredentialRejection::Malformed)?;
        let credential: SessionCredential =
            serde_json::from_slice(&json).map_err(|_| CredentialRejection::Malformed)?;

        if credential.token_hash != *token_hash {
            return Err(CredentialRejection::TokenMismatch);
        }

        let presented = credential.effective_version();
        if presented != current_version {
            return Err(CredentialRejection::StaleVersion {
                presented,
                current: current_version,
            });
        }

        if now.timestamp() > credential.exp {
            return Err(CredentialRejection::Expired);
        }

        Ok(credential)
    }
}

/// A credential ready to be set on the viewer's browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub value: String,
    pub expires: DateTime<Utc>,
}

impl SessionCookie {
    pub fn new(value: String, expires: DateTime<Utc>) -> Self {
        // Cookie expiry has second resolution.
        let expires = Utc
            .timestamp_opt(expires.timestamp(), 0)
            .single()
            .unwrap_or(expires);
        Self { value, expires }
    }

    pub fn name(&self) -> &'static str {
        COOKIE_NAME
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        format!(
            "{}={}; Path=/; Expires={}; HttpOnly; SameSite=Lax",
            COOKIE_NAME,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT")
        )
    }
}
