//! Typed schema of a monthly diary document.
//!
//! One JSON document per owner per month. Entry text, the written-on date and
//! attachment names are ciphertext; day numbers, tags and flags are plain.
//! Decoding is strict about the shape of known fields and ignores unknown
//! ones.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// All entries of one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthDocument {
    #[serde(default)]
    pub days: Vec<DayEntry>,
}

impl MonthDocument {
    /// Decode a month document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// One day's entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: u32,

    /// Encrypted entry text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Encrypted timestamp of when the entry was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_written: Option<String>,

    /// Tag identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,

    #[serde(default, rename = "isBookmarked")]
    pub is_bookmarked: bool,
}

impl DayEntry {
    /// Encrypted text, if present and non-empty.
    pub fn encrypted_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// An attachment reference inside a day entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Name of the encrypted blob in the owner's files directory.
    pub uuid_filename: String,

    /// Encrypted original filename.
    pub enc_filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Fields this schema does not model, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_document() {
        let json = br#"{
            "days": [
                {
                    "day": 3,
                    "text": "ct-text",
                    "date_written": "ct-date",
                    "tags": [1, 4],
                    "files": [
                        {"uuid_filename": "u-1", "enc_filename": "ct-name", "size": 120, "mime": "image/png"}
                    ],
                    "isBookmarked": true
                },
                {"day": 4}
            ]
        }"#;

        let doc = MonthDocument::from_slice(json).unwrap();
        assert_eq!(doc.days.len(), 2);

        let first = &doc.days[0];
        assert_eq!(first.day, 3);
        assert_eq!(first.encrypted_text(), Some("ct-text"));
        assert_eq!(first.tags, vec![1, 4]);
        assert!(first.is_bookmarked);
        assert_eq!(first.files[0].size, Some(120));
        assert_eq!(first.files[0].extra["mime"], "image/png");

        let second = &doc.days[1];
        assert!(second.encrypted_text().is_none());
        assert!(second.files.is_empty());
        assert!(!second.is_bookmarked);
    }

    #[test]
    fn test_empty_text_is_absent() {
        let doc = MonthDocument::from_slice(br#"{"days":[{"day":1,"text":""}]}"#).unwrap();
        assert!(doc.days[0].encrypted_text().is_none());
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        assert!(MonthDocument::from_slice(br#"{"days":{"day":1}}"#).is_err());
        assert!(MonthDocument::from_slice(br#"{"days":[{"day":"one"}]}"#).is_err());
        assert!(MonthDocument::from_slice(br#"{"days":[{"day":1,"text":5}]}"#).is_err());
        assert!(
            MonthDocument::from_slice(br#"{"days":[{"day":1,"files":[{"uuid_filename":"u"}]}]}"#)
                .is_err()
        );
    }

    #[test]
    fn test_missing_days_is_empty_month() {
        let doc = MonthDocument::from_slice(b"{}").unwrap();
        assert!(doc.days.is_empty());
    }
}
