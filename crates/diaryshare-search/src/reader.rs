//! Single-month and attachment reads for share viewers.

use std::sync::Arc;

use diaryshare_core::OwnerId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::archive::Archive;
use crate::cipher::{ContentKey, DiaryCipher};
use crate::document::{DayEntry, FileEntry};
use crate::error::Result;

/// Days of a month that carry something worth marking in a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedDays {
    pub days_with_logs: Vec<u32>,
    pub days_with_files: Vec<u32>,
    pub days_bookmarked: Vec<u32>,
}

/// A day entry with its encrypted fields opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptedDay {
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_written: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<DecryptedFile>,
}

/// An attachment reference with its name decrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptedFile {
    pub uuid_filename: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads individual months and attachments.
#[derive(Clone)]
pub struct DiaryReader {
    archive: Arc<dyn Archive>,
    cipher: Arc<dyn DiaryCipher>,
}

impl DiaryReader {
    pub fn new(archive: Arc<dyn Archive>, cipher: Arc<dyn DiaryCipher>) -> Self {
        Self { archive, cipher }
    }

    /// Which days of a month have text, attachments or a bookmark.
    ///
    /// Needs no key: only plaintext fields are inspected.
    pub async fn marked_days(&self, owner: OwnerId, year: i32, month: u32) -> Result<MarkedDays> {
        let mut marked = MarkedDays::default();
        let Some(doc) = self.archive.month(owner, year, month).await? else {
            return Ok(marked);
        };

        for entry in &doc.days {
            if entry.text.is_some() {
                marked.days_with_logs.push(entry.day);
            }
            if !entry.files.is_empty() {
                marked.days_with_files.push(entry.day);
            }
            if entry.is_bookmarked {
                marked.days_bookmarked.push(entry.day);
            }
        }
        Ok(marked)
    }

    /// Decrypt every entry of a month.
    ///
    /// Days with no text, files or tags are left out. Any decryption failure
    /// fails the read.
    pub async fn read_month(
        &self,
        owner: OwnerId,
        key: &ContentKey,
        year: i32,
        month: u32,
    ) -> Result<Vec<DecryptedDay>> {
        let Some(doc) = self.archive.month(owner, year, month).await? else {
            return Ok(Vec::new());
        };

        let mut days = Vec::with_capacity(doc.days.len());
        for entry in &doc.days {
            let day = self.decrypt_day(entry, key)?;
            if day.text.is_some() || !day.files.is_empty() || !day.tags.is_empty() {
                days.push(day);
            }
        }
        Ok(days)
    }

    fn decrypt_day(&self, entry: &DayEntry, key: &ContentKey) -> Result<DecryptedDay> {
        let mut text = None;
        let mut date_written = None;

        if let Some(ciphertext) = entry.encrypted_text() {
            text = Some(self.cipher.decrypt_text(ciphertext, key)?);

            if let Some(date) = entry.date_written.as_deref().filter(|d| !d.is_empty()) {
                date_written = Some(self.cipher.decrypt_text(date, key)?);
            }
        }

        let files = entry
            .files
            .iter()
            .map(|file| self.decrypt_file_entry(file, key))
            .collect::<Result<Vec<_>>>()?;

        Ok(DecryptedDay {
            day: entry.day,
            text,
            date_written,
            tags: entry.tags.clone(),
            files,
        })
    }

    fn decrypt_file_entry(&self, file: &FileEntry, key: &ContentKey) -> Result<DecryptedFile> {
        Ok(DecryptedFile {
            uuid_filename: file.uuid_filename.clone(),
            filename: self.cipher.decrypt_text(&file.enc_filename, key)?,
            size: file.size,
            extra: file.extra.clone(),
        })
    }

    /// Load and decrypt an attachment.
    pub async fn download_file(
        &self,
        owner: OwnerId,
        key: &ContentKey,
        uuid: &str,
    ) -> Result<Vec<u8>> {
        let encrypted = self.archive.file(owner, uuid).await?;
        Ok(self.cipher.decrypt_file(&encrypted, key)?)
    }
}
