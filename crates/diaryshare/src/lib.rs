//! # Diaryshare
//!
//! Read-only share links for an encrypted diary.
//!
//! ## Overview
//!
//! An owner mints a share token. Anyone holding the token can read the
//! owner's diary; the token itself is the key that unwraps the owner's
//! content key, so the server never stores anything that opens the diary on
//! its own.
//!
//! Access can additionally be gated on email verification:
//!
//! 1. The owner saves an allow-list and has working SMTP settings
//! 2. A viewer asks for a code, which is mailed to an allow-listed address
//! 3. The viewer submits the code and receives a signed session cookie
//! 4. Reads check the cookie against the owner's current cookie version
//!
//! Bumping the cookie version logs out every viewer at once.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use diaryshare::{MemoryMailer, RequestContext, ShareConfig, ShareService};
//! use diaryshare::core::{DerivedKey, OwnerId};
//! use diaryshare::search::{DiaryCipher, FsArchive};
//! use diaryshare::store::SqliteStore;
//!
//! async fn example(cipher: Arc<dyn DiaryCipher>) {
//!     let service = ShareService::new(
//!         SqliteStore::open("share.db").unwrap(),
//!         ShareConfig::with_secret("server secret"),
//!         Arc::new(FsArchive::new("/var/lib/diary")),
//!         cipher,
//!         Arc::new(MemoryMailer::new()),
//!     )
//!     .unwrap();
//!
//!     let owner = OwnerId(1);
//!     let token = service
//!         .issue_token(owner, &DerivedKey::from_bytes(vec![0u8; 32]))
//!         .await
//!         .unwrap();
//!
//!     let ctx = RequestContext::new("203.0.113.7", "/share/search");
//!     let hits = service.search(&token, None, "holiday", &ctx).await.unwrap();
//!     println!("{} matching days", hits.len());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `diaryshare::core` - Tokens, emails, settings records
//! - `diaryshare::perms` - Capabilities, verification codes, credentials
//! - `diaryshare::store` - Storage abstraction and SQLite
//! - `diaryshare::search` - Archive readers and the search engine

pub mod access;
pub mod config;
pub mod error;
pub mod mail;
pub mod service;
pub mod types;

// Re-export component crates
pub use diaryshare_core as core;
pub use diaryshare_perms as perms;
pub use diaryshare_search as search;
pub use diaryshare_store as store;

pub use access::{client_ip, RequestContext};
pub use config::{ShareConfig, DEFAULT_CODE_TTL_MINUTES};
pub use error::{ErrorKind, Result, ShareError};
pub use mail::{MailError, MailMessage, Mailer, MemoryMailer};
pub use service::ShareService;
pub use types::{
    CodeRequest, CodeSubmission, ResolvedShare, SmtpSettingsView, TestEmailRequest,
    VerificationSettingsView, VerificationStatus,
};

pub use diaryshare_perms::{SessionCookie, COOKIE_NAME};
