//! # Diaryshare Testkit
//!
//! Testing utilities for diary share links.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed token hashes and session cookie values that any
//!   compatible implementation must reproduce byte for byte
//! - **Generators**: Proptest strategies for tokens, keys and addresses
//! - **Fixtures**: A wired-up share service over a temporary encrypted diary
//!
//! ## Golden Vectors
//!
//! ```rust
//! use diaryshare_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, got) in verify_all_vectors() {
//!     assert!(ok, "{name}: {got}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use diaryshare_testkit::generators::raw_token;
//!
//! proptest! {
//!     #[test]
//!     fn token_roundtrips(token in raw_token()) {
//!         let parsed = RawToken::parse(&token.encode()).unwrap();
//!         prop_assert_eq!(parsed.hash(), token.hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use diaryshare_testkit::fixtures::ShareFixture;
//!
//! let fx = ShareFixture::new();
//! fx.diary.write_month(2024, 5, vec![fx.diary.entry(3, "apple pie")]);
//! let token = fx.issue().await;
//! let hits = fx.service.search(&token, None, "apple", &ShareFixture::ctx("/search")).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{DiaryFixture, ShareFixture, TestCipher};
pub use vectors::{
    all_cookie_vectors, all_token_vectors, verify_all_vectors, CookieVector, TokenVector,
};
