//! # Diaryshare Store
//!
//! Storage abstraction for share state. Provides a trait-based interface with
//! SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait covers everything the share subsystem persists:
//! capabilities (token hash plus wrapped key), email allow-lists, SMTP
//! overrides, session cookie settings and the access log. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`StoreExt`] - Convenience helpers built on top of [`Store`]
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use diaryshare_core::{EmailAllowlist, OwnerId};
//! use diaryshare_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("share.db").unwrap();
//!
//!     let list = EmailAllowlist::from_input(["friend@example.com"]).unwrap();
//!     store.put_allowlist(OwnerId(1), &list).await.unwrap();
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
