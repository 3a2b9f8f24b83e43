//! # Diaryshare Search
//!
//! Read access to an owner's encrypted monthly diary archive on behalf of a
//! share viewer.
//!
//! ## Overview
//!
//! Month documents are typed ([`MonthDocument`]) and decoding fails loudly on
//! shape mismatches. The storage location sits behind [`Archive`] and the
//! content encryption behind [`DiaryCipher`], both supplied by the host.
//!
//! - [`SearchEngine`] scans every month linearly and returns hits sorted by
//!   date.
//! - [`DiaryReader`] serves single months, calendar markers and attachments.
//!
//! ## Query syntax
//!
//! | Query | Meaning |
//! |---|---|
//! | `"apple pie"` | exact phrase, case-sensitive |
//! | `apple\|pear` | any alternative, case-insensitive |
//! | `apple pie` | every term, case-insensitive |
//! | `apple` | substring, case-insensitive |
//!
//! Attachment names are matched against the raw query in every mode.

pub mod archive;
pub mod cipher;
pub mod document;
pub mod engine;
pub mod error;
pub mod query;
pub mod reader;
pub mod snippet;

pub use archive::{Archive, FsArchive};
pub use cipher::{ContentKey, DiaryCipher};
pub use document::{DayEntry, FileEntry, MonthDocument};
pub use engine::{SearchEngine, SearchHit};
pub use error::{CipherError, Result, SearchError};
pub use query::{MatchMode, SearchQuery, TextMatch};
pub use reader::{DecryptedDay, DecryptedFile, DiaryReader, MarkedDays};
pub use snippet::{context_snippet, find_case_insensitive, ATTACHMENT_MARKER, CONTEXT_CHARS};
