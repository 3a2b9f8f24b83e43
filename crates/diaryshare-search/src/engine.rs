//! Full-text search over an owner's encrypted archive.
//!
//! There is no index. Every month document is loaded, every entry decrypted
//! and matched. Hits are collected across all months and sorted
//! chronologically at the end, so directory order never leaks into results.

use std::sync::Arc;

use diaryshare_core::OwnerId;
use serde::{Deserialize, Serialize};

use crate::archive::Archive;
use crate::cipher::{ContentKey, DiaryCipher};
use crate::document::DayEntry;
use crate::error::Result;
use crate::query::SearchQuery;
use crate::snippet::{attachment_snippet, context_snippet};

/// One matching day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Context around the match, or the attachment marker and file name.
    pub snippet: String,
}

/// Executes queries against an [`Archive`].
#[derive(Clone)]
pub struct SearchEngine {
    archive: Arc<dyn Archive>,
    cipher: Arc<dyn DiaryCipher>,
}

impl SearchEngine {
    pub fn new(archive: Arc<dyn Archive>, cipher: Arc<dyn DiaryCipher>) -> Self {
        Self { archive, cipher }
    }

    /// Run a query over every month of the owner's archive.
    ///
    /// Entries whose text or attachment name cannot be decrypted are skipped.
    /// A month document that does not decode fails the whole search.
    pub async fn search(
        &self,
        owner: OwnerId,
        key: &ContentKey,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::new();

        for year in self.archive.years(owner).await? {
            for month in self.archive.months(owner, year).await? {
                let Some(doc) = self.archive.month(owner, year, month).await? else {
                    continue;
                };

                for entry in &doc.days {
                    self.match_entry(entry, key, query, |day, snippet| {
                        hits.push(SearchHit {
                            year,
                            month,
                            day,
                            snippet,
                        })
                    });
                }
            }
        }

        // stable: a text hit stays ahead of its day's attachment hit
        hits.sort_by_key(|h| (h.year, h.month, h.day));

        tracing::debug!(owner = %owner, hits = hits.len(), "search finished");
        Ok(hits)
    }

    fn match_entry(
        &self,
        entry: &DayEntry,
        key: &ContentKey,
        query: &SearchQuery,
        mut emit: impl FnMut(u32, String),
    ) {
        if let Some(ciphertext) = entry.encrypted_text() {
            match self.cipher.decrypt_text(ciphertext, key) {
                Ok(text) => {
                    if let Some(m) = query.match_text(&text) {
                        emit(entry.day, context_snippet(&text, m));
                    }
                }
                Err(e) => {
                    tracing::warn!(day = entry.day, error = %e, "skipping undecryptable entry");
                }
            }
        }

        for file in &entry.files {
            let name = match self.cipher.decrypt_text(&file.enc_filename, key) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(day = entry.day, error = %e, "skipping undecryptable file name");
                    continue;
                }
            };

            if query.match_filename(&name) {
                emit(entry.day, attachment_snippet(&name));
                break;
            }
        }
    }
}
