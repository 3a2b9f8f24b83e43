//! Store trait: the abstract interface for share state persistence.
//!
//! Implementations include SQLite (primary) and in-memory (for tests). The
//! service layer owns a store instance; there is no process-wide state.

use std::future::Future;

use async_trait::async_trait;
use diaryshare_core::{
    AccessEvent, EmailAllowlist, OwnerId, SessionSettings, ShareCapability, SmtpSettings,
    TokenHash,
};

use crate::error::Result;

/// The Store trait: async interface for share state persistence.
///
/// Every write is durable by the time the returned future resolves.
///
/// # Design Notes
///
/// - **One capability per owner**: `put_capability` replaces whatever the
///   owner had, so the previous token stops resolving immediately.
/// - **Token hashes are unique**: `get_capability_by_hash` returns at most
///   one capability.
/// - **Access log is append-only** apart from an owner-initiated clear.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Capability Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store `capability`, replacing any previous one for the same owner.
    async fn put_capability(&self, capability: &ShareCapability) -> Result<()>;

    /// Get the owner's current capability.
    async fn get_capability(&self, owner: OwnerId) -> Result<Option<ShareCapability>>;

    /// Look up a capability by the hash of its token.
    async fn get_capability_by_hash(&self, token_hash: &TokenHash)
        -> Result<Option<ShareCapability>>;

    /// Delete the owner's capability. Returns whether one existed.
    async fn delete_capability(&self, owner: OwnerId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Allow-list Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the owner's allow-list (empty if never saved).
    async fn get_allowlist(&self, owner: OwnerId) -> Result<EmailAllowlist>;

    /// Replace the owner's allow-list.
    async fn put_allowlist(&self, owner: OwnerId, allowlist: &EmailAllowlist) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Settings Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the owner's SMTP override, if one was ever saved.
    async fn get_smtp_settings(&self, owner: OwnerId) -> Result<Option<SmtpSettings>>;

    /// Replace the owner's SMTP override.
    async fn put_smtp_settings(&self, owner: OwnerId, settings: &SmtpSettings) -> Result<()>;

    /// Get the owner's session settings, if ever saved.
    async fn get_session_settings(&self, owner: OwnerId) -> Result<Option<SessionSettings>>;

    /// Replace the owner's session settings.
    async fn put_session_settings(
        &self,
        owner: OwnerId,
        settings: &SessionSettings,
    ) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Access Log Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an event to the owner's access log.
    async fn append_access_event(&self, event: &AccessEvent) -> Result<()>;

    /// All events for an owner, oldest first.
    async fn list_access_events(&self, owner: OwnerId) -> Result<Vec<AccessEvent>>;

    /// Remove all events for an owner. Returns how many were removed.
    async fn clear_access_events(&self, owner: OwnerId) -> Result<usize>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Whether the owner currently has a share link.
    fn has_capability(&self, owner: OwnerId) -> impl Future<Output = Result<bool>> + Send;

    /// The owner's session settings, filled with defaults when never saved.
    fn session_settings_or_default(
        &self,
        owner: OwnerId,
        default_days: u32,
    ) -> impl Future<Output = Result<SessionSettings>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn has_capability(&self, owner: OwnerId) -> Result<bool> {
        Ok(self.get_capability(owner).await?.is_some())
    }

    async fn session_settings_or_default(
        &self,
        owner: OwnerId,
        default_days: u32,
    ) -> Result<SessionSettings> {
        let stored = self.get_session_settings(owner).await?;
        let base = stored.unwrap_or(SessionSettings {
            cookie_days: 0,
            cookie_version: 0,
        });
        Ok(base.normalized(default_days))
    }
}
