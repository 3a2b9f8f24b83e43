//! # Diaryshare Permissions
//!
//! Share capabilities, email verification codes and session credentials.
//!
//! ## Overview
//!
//! A share link grants read access to an owner's encrypted diary without the
//! owner's password. Access can optionally be gated behind email
//! verification, after which the viewer holds a signed session credential.
//!
//! ## Key Concepts
//!
//! - **Capability**: The owner's derived key sealed under a random token.
//!   Only the token's SHA-256 is stored; the token itself is the unwrap key.
//! - **Verification code**: A single-use 6-digit code mailed to an
//!   allow-listed address, held in memory with a short TTL.
//! - **Session credential**: An HMAC-signed cookie value binding a verified
//!   email to one token hash, with an expiry and a revocation version.
//!
//! ## Encryption Model
//!
//! 1. **Derived key**: The owner's login-derived key, opaque to this crate
//! 2. **Wrapped key**: ChaCha20-Poly1305 of the derived key, keyed by the
//!    32 raw token bytes
//!
//! Revoking a link deletes the wrapped key; a leaked database alone cannot
//! open any capability because it never contains the token.
//!
//! ## Usage
//!
//! ```rust
//! use diaryshare_core::{DerivedKey, OwnerId};
//! use diaryshare_perms::{issue_capability, open_capability};
//!
//! let derived = DerivedKey::from_bytes(vec![7u8; 32]);
//! let issued = issue_capability(OwnerId(1), &derived).unwrap();
//!
//! // `issued.token.encode()` goes into the share link.
//! let opened = open_capability(&issued.capability, &issued.token).unwrap();
//! assert_eq!(opened, derived);
//! ```

pub mod capability;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod session;
pub mod verification;

pub use capability::{issue_capability, open_capability, IssuedCapability};
pub use crypto::{SealNonce, Sealed, SealingKey, NONCE_LEN, TAG_LEN};
pub use envelope::{WrapFormat, WrappedKey};
pub use error::{PermsError, Result};
pub use session::{
    CredentialCodec, CredentialRejection, SessionCookie, SessionCredential, COOKIE_NAME,
};
pub use verification::{generate_code, CodeCheck, VerificationCodes, CODE_DIGITS};
