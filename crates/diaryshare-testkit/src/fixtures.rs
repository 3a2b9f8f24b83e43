//! Test fixtures for common share scenarios.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use diaryshare::{MemoryMailer, RequestContext, ShareConfig, ShareService};
use diaryshare_core::{DerivedKey, OwnerId, SmtpSettings};
use diaryshare_perms::{Sealed, SealingKey};
use diaryshare_search::{CipherError, ContentKey, DayEntry, DiaryCipher, FileEntry, FsArchive};
use diaryshare_store::MemoryStore;
use rand::RngCore;
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// ChaCha20-Poly1305 diary cipher keyed by SHA-256 of the derived key.
///
/// Text ciphertext is standard base64 of `nonce || sealed`; attachment
/// ciphertext is the same layout without the base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCipher;

impl TestCipher {
    /// The content key a given derived key unlocks.
    pub fn content_key_for(derived: &DerivedKey) -> ContentKey {
        let mut hasher = Sha256::new();
        hasher.update(b"diaryshare-testkit content key");
        hasher.update(derived.as_bytes());
        ContentKey::from_bytes(hasher.finalize().to_vec())
    }

    pub fn encrypt_text(plaintext: &str, key: &ContentKey) -> String {
        STANDARD.encode(Self::encrypt_file(plaintext.as_bytes(), key))
    }

    pub fn encrypt_file(data: &[u8], key: &ContentKey) -> Vec<u8> {
        sealing_key(key)
            .and_then(|k| k.seal(data).map_err(|e| CipherError(e.to_string())))
            .expect("test content keys are 32 bytes")
            .to_framed()
    }
}

fn sealing_key(key: &ContentKey) -> Result<SealingKey, CipherError> {
    let bytes: [u8; 32] = key
        .as_bytes()
        .try_into()
        .map_err(|_| CipherError("content key must be 32 bytes".into()))?;
    Ok(SealingKey::from_bytes(bytes))
}

fn open(data: &[u8], key: &ContentKey) -> Result<Vec<u8>, CipherError> {
    let sealed = Sealed::from_framed(data).map_err(|e| CipherError(e.to_string()))?;
    sealing_key(key)?
        .open(&sealed)
        .map_err(|e| CipherError(e.to_string()))
}

#[async_trait]
impl DiaryCipher for TestCipher {
    async fn content_key(
        &self,
        _owner: OwnerId,
        derived: &DerivedKey,
    ) -> Result<ContentKey, CipherError> {
        Ok(Self::content_key_for(derived))
    }

    fn decrypt_text(&self, ciphertext: &str, key: &ContentKey) -> Result<String, CipherError> {
        let data = STANDARD
            .decode(ciphertext)
            .map_err(|e| CipherError(e.to_string()))?;
        String::from_utf8(open(&data, key)?).map_err(|e| CipherError(e.to_string()))
    }

    fn decrypt_file(&self, ciphertext: &[u8], key: &ContentKey) -> Result<Vec<u8>, CipherError> {
        open(ciphertext, key)
    }
}

/// An encrypted diary laid out on disk in a temporary directory.
pub struct DiaryFixture {
    dir: TempDir,
    owner: OwnerId,
    key: ContentKey,
}

impl DiaryFixture {
    pub fn new(owner: OwnerId, derived: &DerivedKey) -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            owner,
            key: TestCipher::content_key_for(derived),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn archive(&self) -> Arc<FsArchive> {
        Arc::new(FsArchive::new(self.root()))
    }

    pub fn content_key(&self) -> &ContentKey {
        &self.key
    }

    /// A day entry with encrypted text.
    pub fn entry(&self, day: u32, text: &str) -> DayEntry {
        DayEntry {
            day,
            text: Some(TestCipher::encrypt_text(text, &self.key)),
            date_written: Some(TestCipher::encrypt_text("2024-01-01 12:00", &self.key)),
            ..Default::default()
        }
    }

    /// Write an encrypted attachment blob and return its entry reference.
    pub fn attachment(&self, uuid: &str, filename: &str, contents: &[u8]) -> FileEntry {
        let dir = self.root().join(self.owner.to_string()).join("files");
        fs::create_dir_all(&dir).expect("failed to create files dir");
        fs::write(dir.join(uuid), TestCipher::encrypt_file(contents, &self.key))
            .expect("failed to write attachment");

        FileEntry {
            uuid_filename: uuid.to_string(),
            enc_filename: TestCipher::encrypt_text(filename, &self.key),
            size: Some(contents.len() as u64),
            extra: Default::default(),
        }
    }

    pub fn write_month(&self, year: i32, month: u32, days: Vec<DayEntry>) {
        let doc = json!({ "days": days });
        self.write_raw_month(year, month, &doc.to_string());
    }

    /// Write a month document verbatim, for malformed-input tests.
    pub fn write_raw_month(&self, year: i32, month: u32, contents: &str) {
        let dir = self
            .root()
            .join(self.owner.to_string())
            .join(format!("{year:04}"));
        fs::create_dir_all(&dir).expect("failed to create year dir");
        fs::write(dir.join(format!("{month:02}.json")), contents)
            .expect("failed to write month document");
    }
}

/// A share service over an in-memory store and a temporary diary.
pub struct ShareFixture {
    pub service: ShareService<MemoryStore>,
    pub mailer: Arc<MemoryMailer>,
    pub diary: DiaryFixture,
    pub owner: OwnerId,
    pub derived_key: DerivedKey,
}

impl ShareFixture {
    pub const SECRET: &'static str = "testkit-server-secret";

    pub fn new() -> Self {
        Self::with_config(ShareConfig::with_secret(Self::SECRET))
    }

    pub fn with_config(config: ShareConfig) -> Self {
        let owner = OwnerId::new(1);
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        let derived_key = DerivedKey::from_bytes(key.to_vec());

        let diary = DiaryFixture::new(owner, &derived_key);
        let mailer = Arc::new(MemoryMailer::new());
        let service = ShareService::new(
            MemoryStore::new(),
            config,
            diary.archive(),
            Arc::new(TestCipher),
            mailer.clone(),
        )
        .expect("valid fixture config");

        Self {
            service,
            mailer,
            diary,
            owner,
            derived_key,
        }
    }

    /// Mint a share token for the fixture owner.
    pub async fn issue(&self) -> String {
        self.service
            .issue_token(self.owner, &self.derived_key)
            .await
            .expect("failed to issue token")
    }

    pub fn smtp() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".into(),
            port: 2525,
            username: "mailer".into(),
            password: "hunter2".into(),
            from: "diary@example.com".into(),
        }
    }

    /// Configure SMTP and an allow-list so viewers must verify.
    pub async fn enable_verification(&self, emails: &[&str]) {
        self.service
            .save_smtp_settings(self.owner, Self::smtp())
            .await
            .expect("failed to save SMTP settings");
        self.service
            .save_allowlist(self.owner, emails)
            .await
            .expect("failed to save allow-list");
    }

    /// The six-digit code in the most recent mail.
    pub fn last_code(&self) -> Option<String> {
        let message = self.mailer.last()?;
        let re = Regex::new(r"\b(\d{6})\b").ok()?;
        re.captures(&message.body)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn ctx(path: &str) -> RequestContext {
        RequestContext::new("198.51.100.4", path)
    }
}

impl Default for ShareFixture {
    fn default() -> Self {
        Self::new()
    }
}
