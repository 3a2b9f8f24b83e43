//! One-time email verification codes.
//!
//! Codes live only in process memory, keyed by `(token hash, email)`. Issuing
//! a new code for the same key replaces the previous one. A stored code is
//! consumed by the first verification attempt, whether or not it matches.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use diaryshare_core::{EmailAddress, TokenHash};
use rand::Rng;

/// Number of digits in a verification code.
pub const CODE_DIGITS: usize = 6;

/// Generate a uniformly distributed 6-digit code, zero padded.
pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Outcome of checking a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Accepted,
    Mismatch,
    Expired,
    Missing,
}

impl CodeCheck {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    expires_at: DateTime<Utc>,
}

type CodeKey = (TokenHash, EmailAddress);

/// In-memory store of outstanding verification codes.
#[derive(Default)]
pub struct VerificationCodes {
    entries: RwLock<HashMap<CodeKey, CodeEntry>>,
}

impl VerificationCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `code` for `(token_hash, email)`, replacing any earlier one.
    pub fn store(
        &self,
        token_hash: TokenHash,
        email: &EmailAddress,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) {
        let entry = CodeEntry {
            code: code.into(),
            expires_at,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((token_hash, email.clone()), entry);
    }

    /// Generate and store a fresh code valid for `ttl`.
    pub fn issue(&self, token_hash: TokenHash, email: &EmailAddress, ttl: Duration) -> String {
        let code = generate_code();
        self.store(token_hash, email, code.clone(), Utc::now() + ttl);
        code
    }

    /// Check `submitted` against the stored code as of `now`.
    ///
    /// The entry is removed on every outcome except [`CodeCheck::Missing`].
    /// A code is still valid at exactly its expiry instant.
    pub fn check_at(
        &self,
        token_hash: TokenHash,
        email: &EmailAddress,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> CodeCheck {
        let key = (token_hash, email.clone());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = entries.remove(&key) else {
            return CodeCheck::Missing;
        };

        if now > entry.expires_at {
            return CodeCheck::Expired;
        }

        if entry.code == submitted.trim() {
            CodeCheck::Accepted
        } else {
            CodeCheck::Mismatch
        }
    }

    /// Check `submitted` against the stored code as of now.
    pub fn verify(&self, token_hash: TokenHash, email: &EmailAddress, submitted: &str) -> bool {
        self.check_at(token_hash, email, submitted, Utc::now())
            .is_accepted()
    }

    /// Drop every entry that expired before `now`. Returns how many were dropped.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    /// Number of outstanding codes.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
