//! # Diaryshare Core
//!
//! Pure primitives for diary share links: tokens, token hashes, email
//! addresses, settings records and credential signing.
//!
//! This crate contains no I/O and no storage. Everything here is plain data
//! and computation over it.
//!
//! ## Key Types
//!
//! - [`RawToken`] - The 32-byte bearer secret embedded in a share link
//! - [`TokenHash`] - SHA-256 of a raw token, the only persisted form
//! - [`DerivedKey`] - The owner's content-unlocking key, opaque here
//! - [`EmailAddress`] / [`EmailAllowlist`] - Normalized viewer addresses
//! - [`SmtpSettings`] / [`SessionSettings`] - Per-owner settings records
//! - [`SessionSigner`] - HMAC-SHA256 over credential payloads
//!
//! ## Encoding
//!
//! Tokens and token hashes use URL-safe base64 with padding; credential
//! segments use URL-safe base64 without padding. See [`encoding`].

pub mod crypto;
pub mod email;
pub mod encoding;
pub mod error;
pub mod language;
pub mod record;
pub mod settings;
pub mod types;

pub use crypto::SessionSigner;
pub use email::{is_valid_email, normalize_email, EmailAddress, EmailAllowlist};
pub use error::{CoreError, Result};
pub use language::EmailLanguage;
pub use record::{AccessEvent, AccessEventKind, ShareCapability};
pub use settings::{
    validate_cookie_days, SessionSettings, SmtpSettings, DEFAULT_COOKIE_DAYS, DEFAULT_SMTP_PORT,
    MAX_COOKIE_DAYS, MIN_COOKIE_DAYS,
};
pub use types::{DerivedKey, OwnerId, RawToken, TokenHash};
