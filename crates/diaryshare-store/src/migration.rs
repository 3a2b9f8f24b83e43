//! Database schema migrations for SQLite.
//!
//! Versions are recorded in `schema_migrations`; a database written by a
//! newer release is refused rather than downgraded.

use chrono::Utc;
use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Schema steps, in order. Step `i` upgrades version `i` to `i + 1`.
const MIGRATIONS: &[&str] = &[V1_SHARE_TABLES];

/// Current schema version.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to run on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {applied} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    let pending = &MIGRATIONS[applied as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (offset, sql) in pending.iter().enumerate() {
        let version = applied + offset as u32 + 1;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, Utc::now().timestamp_millis()],
        )?;
        tracing::debug!(version, "applied share schema migration");
    }
    tx.commit()?;

    Ok(())
}

const V1_SHARE_TABLES: &str = r#"
    -- One share link per owner; the raw token is never stored
    CREATE TABLE share_capabilities (
        owner_id INTEGER PRIMARY KEY,
        token_hash BLOB NOT NULL UNIQUE,   -- 32 bytes, SHA-256 of raw token
        wrapped_key BLOB NOT NULL,         -- CBOR envelope, sealed under raw token
        created_at INTEGER NOT NULL        -- Unix ms
    );

    -- Addresses allowed to request verification codes
    CREATE TABLE share_allowlist (
        owner_id INTEGER NOT NULL,
        position INTEGER NOT NULL,         -- owner's listing order
        email TEXT NOT NULL,               -- normalized
        PRIMARY KEY (owner_id, position),
        UNIQUE (owner_id, email)
    );

    -- Per-owner SMTP override
    CREATE TABLE share_smtp_settings (
        owner_id INTEGER PRIMARY KEY,
        host TEXT NOT NULL,
        port INTEGER NOT NULL,
        username TEXT NOT NULL,
        password TEXT NOT NULL,
        from_address TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    -- Per-owner cookie lifetime and revocation generation
    CREATE TABLE share_session_settings (
        owner_id INTEGER PRIMARY KEY,
        cookie_days INTEGER NOT NULL,
        cookie_version INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    -- Append-only access log
    CREATE TABLE share_access_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        email TEXT NOT NULL,
        client_ip TEXT NOT NULL,
        event TEXT NOT NULL,               -- code_requested | verified | access
        path TEXT NOT NULL,
        timestamp INTEGER NOT NULL         -- Unix ms
    );

    CREATE INDEX idx_access_log_owner ON share_access_log(owner_id, id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "share_capabilities",
            "share_allowlist",
            "share_smtp_settings",
            "share_session_settings",
            "share_access_log",
            "schema_migrations",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migration_refuses_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
