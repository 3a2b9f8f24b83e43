//! Access to an owner's monthly archive.
//!
//! [`Archive`] is the seam between the engine and wherever month documents
//! live. [`FsArchive`] reads the on-disk layout:
//!
//! ```text
//! <root>/<owner>/<yyyy>/<mm>.json
//! <root>/<owner>/files/<uuid>
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diaryshare_core::OwnerId;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;

use crate::document::MonthDocument;
use crate::error::{Result, SearchError};

static YEAR_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());
static MONTH_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{2})\.json$").unwrap());
static FILE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// Read-only view of owners' diary archives.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Years with a directory for this owner, in no particular order.
    ///
    /// An owner with no archive has no years.
    async fn years(&self, owner: OwnerId) -> Result<Vec<i32>>;

    /// Months with a document in the given year, in no particular order.
    async fn months(&self, owner: OwnerId, year: i32) -> Result<Vec<u32>>;

    /// Load a month document. `None` if the month has no document.
    async fn month(&self, owner: OwnerId, year: i32, month: u32) -> Result<Option<MonthDocument>>;

    /// Load an encrypted attachment blob.
    async fn file(&self, owner: OwnerId, uuid: &str) -> Result<Vec<u8>>;
}

/// Filesystem-backed archive.
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner: OwnerId) -> PathBuf {
        self.root.join(owner.to_string())
    }

    fn month_path(&self, owner: OwnerId, year: i32, month: u32) -> PathBuf {
        self.owner_dir(owner)
            .join(format!("{year:04}"))
            .join(format!("{month:02}.json"))
    }

    fn check_file_id(&self, uuid: &str) -> Result<()> {
        if uuid == "." || uuid == ".." || !FILE_ID.is_match(uuid) {
            return Err(SearchError::InvalidIdentifier(uuid.to_string()));
        }
        Ok(())
    }

    /// Names of the entries in `dir`, or `None` if it does not exist.
    async fn entry_names(dir: &Path) -> Result<Option<Vec<(String, bool)>>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SearchError::io(dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SearchError::io(dir, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| SearchError::io(entry.path(), e))?
                .is_dir();
            if let Some(name) = entry.file_name().to_str() {
                names.push((name.to_string(), is_dir));
            }
        }
        Ok(Some(names))
    }
}

#[async_trait]
impl Archive for FsArchive {
    async fn years(&self, owner: OwnerId) -> Result<Vec<i32>> {
        let Some(names) = Self::entry_names(&self.owner_dir(owner)).await? else {
            return Ok(Vec::new());
        };

        Ok(names
            .into_iter()
            .filter(|(name, is_dir)| *is_dir && YEAR_DIR.is_match(name))
            .filter_map(|(name, _)| name.parse().ok())
            .collect())
    }

    async fn months(&self, owner: OwnerId, year: i32) -> Result<Vec<u32>> {
        let dir = self.owner_dir(owner).join(format!("{year:04}"));
        let Some(names) = Self::entry_names(&dir).await? else {
            return Ok(Vec::new());
        };

        Ok(names
            .into_iter()
            .filter(|(_, is_dir)| !is_dir)
            .filter_map(|(name, _)| {
                MONTH_FILE
                    .captures(&name)
                    .and_then(|caps| caps[1].parse().ok())
            })
            .collect())
    }

    async fn month(&self, owner: OwnerId, year: i32, month: u32) -> Result<Option<MonthDocument>> {
        let path = self.month_path(owner, year, month);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SearchError::io(path, e)),
        };

        MonthDocument::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SearchError::MalformedDocument {
                year,
                month,
                reason: e.to_string(),
            })
    }

    async fn file(&self, owner: OwnerId, uuid: &str) -> Result<Vec<u8>> {
        self.check_file_id(uuid)?;
        let path = self.owner_dir(owner).join("files").join(uuid);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SearchError::FileNotFound(uuid.to_string()))
            }
            Err(e) => Err(SearchError::io(path, e)),
        }
    }
}
