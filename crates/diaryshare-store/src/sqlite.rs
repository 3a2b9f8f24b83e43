//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use diaryshare_core::{
    AccessEvent, AccessEventKind, EmailAddress, EmailAllowlist, OwnerId, SessionSettings,
    ShareCapability, SmtpSettings, TokenHash,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn poisoned(e: impl Display) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(format!("mutex poisoned: {}", e)),
    ))
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

// Helper to convert a row to ShareCapability
fn row_to_capability(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareCapability> {
    let token_hash_bytes: Vec<u8> = row.get("token_hash")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(ShareCapability {
        owner: OwnerId(row.get("owner_id")?),
        token_hash: TokenHash::from_bytes(
            token_hash_bytes
                .try_into()
                .map_err(|_| rusqlite::Error::InvalidColumnType(1, "token_hash".into(), Type::Blob))?,
        ),
        wrapped_key: row.get("wrapped_key")?,
        created_at: millis_to_datetime(3, created_at)?,
    })
}

// Helper to convert a row to AccessEvent. The event name is parsed by the caller.
fn row_to_access_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<(AccessEvent, String)> {
    let timestamp: i64 = row.get("timestamp")?;
    let event_name: String = row.get("event")?;

    let event = AccessEvent {
        owner: OwnerId(row.get("owner_id")?),
        email: row.get("email")?,
        client_ip: row.get("client_ip")?,
        event: AccessEventKind::Access,
        path: row.get("path")?,
        timestamp: millis_to_datetime(5, timestamp)?,
    };
    Ok((event, event_name))
}

#[async_trait]
impl Store for SqliteStore {
    async fn put_capability(&self, capability: &ShareCapability) -> Result<()> {
        let capability = capability.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM share_capabilities WHERE owner_id = ?1",
                params![capability.owner.get()],
            )?;
            tx.execute(
                "INSERT INTO share_capabilities (owner_id, token_hash, wrapped_key, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    capability.owner.get(),
                    capability.token_hash.as_bytes().as_slice(),
                    &capability.wrapped_key,
                    capability.created_at.timestamp_millis(),
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_capability(&self, owner: OwnerId) -> Result<Option<ShareCapability>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT owner_id, token_hash, wrapped_key, created_at
                 FROM share_capabilities WHERE owner_id = ?1",
                params![owner.get()],
                row_to_capability,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_capability_by_hash(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<ShareCapability>> {
        let token_hash = *token_hash;

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT owner_id, token_hash, wrapped_key, created_at
                 FROM share_capabilities WHERE token_hash = ?1",
                params![token_hash.as_bytes().as_slice()],
                row_to_capability,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete_capability(&self, owner: OwnerId) -> Result<bool> {
        self.blocking(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM share_capabilities WHERE owner_id = ?1",
                params![owner.get()],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn get_allowlist(&self, owner: OwnerId) -> Result<EmailAllowlist> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT email FROM share_allowlist WHERE owner_id = ?1 ORDER BY position",
            )?;
            let emails = stmt
                .query_map(params![owner.get()], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            emails
                .iter()
                .map(|email| {
                    EmailAddress::parse(email)
                        .map_err(|e| StoreError::InvalidData(e.to_string()))
                })
                .collect()
        })
        .await
    }

    async fn put_allowlist(&self, owner: OwnerId, allowlist: &EmailAllowlist) -> Result<()> {
        let emails = allowlist.to_strings();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM share_allowlist WHERE owner_id = ?1",
                params![owner.get()],
            )?;
            for (position, email) in emails.iter().enumerate() {
                tx.execute(
                    "INSERT INTO share_allowlist (owner_id, position, email) VALUES (?1, ?2, ?3)",
                    params![owner.get(), position as i64, email],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_smtp_settings(&self, owner: OwnerId) -> Result<Option<SmtpSettings>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT host, port, username, password, from_address
                 FROM share_smtp_settings WHERE owner_id = ?1",
                params![owner.get()],
                |row| {
                    let port: i64 = row.get("port")?;
                    Ok(SmtpSettings {
                        host: row.get("host")?,
                        port: u16::try_from(port)
                            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(1, port))?,
                        username: row.get("username")?,
                        password: row.get("password")?,
                        from: row.get("from_address")?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn put_smtp_settings(&self, owner: OwnerId, settings: &SmtpSettings) -> Result<()> {
        let settings = settings.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO share_smtp_settings (
                    owner_id, host, port, username, password, from_address, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(owner_id) DO UPDATE SET
                    host = excluded.host,
                    port = excluded.port,
                    username = excluded.username,
                    password = excluded.password,
                    from_address = excluded.from_address,
                    updated_at = excluded.updated_at",
                params![
                    owner.get(),
                    &settings.host,
                    i64::from(settings.port),
                    &settings.username,
                    &settings.password,
                    &settings.from,
                    Utc::now().timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_session_settings(&self, owner: OwnerId) -> Result<Option<SessionSettings>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT cookie_days, cookie_version
                 FROM share_session_settings WHERE owner_id = ?1",
                params![owner.get()],
                |row| {
                    let days: i64 = row.get("cookie_days")?;
                    let version: i64 = row.get("cookie_version")?;
                    Ok((days, version))
                },
            )
            .optional()?
            .map(|(days, version)| -> Result<SessionSettings> {
                Ok(SessionSettings {
                    cookie_days: u32::try_from(days).map_err(|_| {
                        StoreError::InvalidData(format!("cookie_days out of range: {days}"))
                    })?,
                    cookie_version: u64::try_from(version).map_err(|_| {
                        StoreError::InvalidData(format!("cookie_version out of range: {version}"))
                    })?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn put_session_settings(
        &self,
        owner: OwnerId,
        settings: &SessionSettings,
    ) -> Result<()> {
        let settings = *settings;
        let version = i64::try_from(settings.cookie_version).map_err(|_| {
            StoreError::InvalidData(format!(
                "cookie_version out of range: {}",
                settings.cookie_version
            ))
        })?;

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO share_session_settings (
                    owner_id, cookie_days, cookie_version, updated_at
                ) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(owner_id) DO UPDATE SET
                    cookie_days = excluded.cookie_days,
                    cookie_version = excluded.cookie_version,
                    updated_at = excluded.updated_at",
                params![
                    owner.get(),
                    i64::from(settings.cookie_days),
                    version,
                    Utc::now().timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn append_access_event(&self, event: &AccessEvent) -> Result<()> {
        let event = event.clone();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO share_access_log (
                    owner_id, email, client_ip, event, path, timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.owner.get(),
                    &event.email,
                    &event.client_ip,
                    event.event.as_str(),
                    &event.path,
                    event.timestamp.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_access_events(&self, owner: OwnerId) -> Result<Vec<AccessEvent>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT owner_id, email, client_ip, event, path, timestamp
                 FROM share_access_log WHERE owner_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![owner.get()], row_to_access_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(mut event, name)| {
                    event.event = name
                        .parse()
                        .map_err(|e: diaryshare_core::CoreError| {
                            StoreError::InvalidData(e.to_string())
                        })?;
                    Ok(event)
                })
                .collect()
        })
        .await
    }

    async fn clear_access_events(&self, owner: OwnerId) -> Result<usize> {
        self.blocking(move |conn| {
            let removed = conn.execute(
                "DELETE FROM share_access_log WHERE owner_id = ?1",
                params![owner.get()],
            )?;
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use diaryshare_core::RawToken;

    fn capability(owner: i64, token: &RawToken) -> ShareCapability {
        ShareCapability {
            owner: OwnerId(owner),
            token_hash: token.hash(),
            wrapped_key: vec![0xa3, 0x01, 0x02],
            created_at: Utc.timestamp_millis_opt(1_760_000_000_123).single().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_capability() {
        let store = SqliteStore::open_memory().unwrap();
        let token = RawToken::generate();
        let cap = capability(7, &token);

        store.put_capability(&cap).await.unwrap();

        let by_hash = store
            .get_capability_by_hash(&token.hash())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_hash, cap);

        let by_owner = store.get_capability(OwnerId(7)).await.unwrap().unwrap();
        assert_eq!(by_owner, cap);
    }

    #[tokio::test]
    async fn test_reissue_replaces_capability() {
        let store = SqliteStore::open_memory().unwrap();
        let old = RawToken::generate();
        let new = RawToken::generate();

        store.put_capability(&capability(7, &old)).await.unwrap();
        store.put_capability(&capability(7, &new)).await.unwrap();

        assert!(store
            .get_capability_by_hash(&old.hash())
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.get_capability(OwnerId(7)).await.unwrap().unwrap().token_hash,
            new.hash()
        );
    }

    #[tokio::test]
    async fn test_delete_capability() {
        let store = SqliteStore::open_memory().unwrap();
        let token = RawToken::generate();
        store.put_capability(&capability(7, &token)).await.unwrap();

        assert!(store.delete_capability(OwnerId(7)).await.unwrap());
        assert!(!store.has_capability(OwnerId(7)).await.unwrap());
        assert!(!store.delete_capability(OwnerId(7)).await.unwrap());
    }

    #[tokio::test]
    async fn test_allowlist_order_preserved() {
        let store = SqliteStore::open_memory().unwrap();
        let list = EmailAllowlist::from_input(["z@x.org", "a@x.org", "m@x.org"]).unwrap();

        store.put_allowlist(OwnerId(1), &list).await.unwrap();
        assert_eq!(store.get_allowlist(OwnerId(1)).await.unwrap(), list);

        store
            .put_allowlist(OwnerId(1), &EmailAllowlist::new())
            .await
            .unwrap();
        assert!(store.get_allowlist(OwnerId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_smtp_settings_upsert() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.get_smtp_settings(OwnerId(1)).await.unwrap().is_none());

        let mut settings = SmtpSettings {
            host: "mail.example.com".into(),
            port: 465,
            username: "u".into(),
            password: "p".into(),
            from: "diary@example.com".into(),
        };
        store.put_smtp_settings(OwnerId(1), &settings).await.unwrap();
        settings.port = 2525;
        store.put_smtp_settings(OwnerId(1), &settings).await.unwrap();

        assert_eq!(
            store.get_smtp_settings(OwnerId(1)).await.unwrap(),
            Some(settings)
        );
    }

    #[tokio::test]
    async fn test_session_settings_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let settings = SessionSettings {
            cookie_days: 90,
            cookie_version: 4,
        };
        store
            .put_session_settings(OwnerId(3), &settings)
            .await
            .unwrap();
        assert_eq!(
            store.get_session_settings(OwnerId(3)).await.unwrap(),
            Some(settings)
        );
        assert!(store.get_session_settings(OwnerId(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_settings_out_of_range() {
        let store = SqliteStore::open_memory().unwrap();

        let err = store
            .put_session_settings(
                OwnerId(3),
                &SessionSettings {
                    cookie_days: 30,
                    cookie_version: u64::MAX,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert!(store.get_session_settings(OwnerId(3)).await.unwrap().is_none());

        for (days, version) in [(-1i64, 1i64), (i64::from(u32::MAX) + 1, 1), (30, -2)] {
            store
                .blocking(move |conn| {
                    conn.execute(
                        "INSERT OR REPLACE INTO share_session_settings (
                            owner_id, cookie_days, cookie_version, updated_at
                        ) VALUES (5, ?1, ?2, 0)",
                        params![days, version],
                    )?;
                    Ok(())
                })
                .await
                .unwrap();

            let err = store.get_session_settings(OwnerId(5)).await.unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidData(_)),
                "({days}, {version}) accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_access_log() {
        let store = SqliteStore::open_memory().unwrap();
        let kinds = [
            AccessEventKind::CodeRequested,
            AccessEventKind::Verified,
            AccessEventKind::Access,
        ];
        for kind in kinds {
            let event = AccessEvent::new(OwnerId(1), kind, "v@x.org", "10.0.0.1", "/share");
            store.append_access_event(&event).await.unwrap();
        }

        let events = store.list_access_events(OwnerId(1)).await.unwrap();
        let listed: Vec<_> = events.iter().map(|e| e.event).collect();
        assert_eq!(listed, kinds);
        assert_eq!(events[0].client_ip, "10.0.0.1");

        assert_eq!(store.clear_access_events(OwnerId(1)).await.unwrap(), 3);
        assert!(store.list_access_events(OwnerId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("share.db");
        let token = RawToken::generate();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put_capability(&capability(2, &token)).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store
            .get_capability_by_hash(&token.hash())
            .await
            .unwrap()
            .is_some());
    }
}
