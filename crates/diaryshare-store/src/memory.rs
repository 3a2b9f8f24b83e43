//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use diaryshare_core::{
    AccessEvent, EmailAllowlist, OwnerId, SessionSettings, ShareCapability, SmtpSettings,
    TokenHash,
};

use crate::error::Result;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Capabilities indexed by owner.
    capabilities: HashMap<OwnerId, ShareCapability>,

    /// Hash index: token_hash -> owner.
    by_hash: HashMap<TokenHash, OwnerId>,

    allowlists: HashMap<OwnerId, EmailAllowlist>,

    smtp: HashMap<OwnerId, SmtpSettings>,

    sessions: HashMap<OwnerId, SessionSettings>,

    /// Access log per owner, oldest first.
    access_log: HashMap<OwnerId, Vec<AccessEvent>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_capability(&self, capability: &ShareCapability) -> Result<()> {
        let mut inner = self.write();

        if let Some(previous) = inner.capabilities.remove(&capability.owner) {
            inner.by_hash.remove(&previous.token_hash);
        }
        inner
            .by_hash
            .insert(capability.token_hash, capability.owner);
        inner
            .capabilities
            .insert(capability.owner, capability.clone());
        Ok(())
    }

    async fn get_capability(&self, owner: OwnerId) -> Result<Option<ShareCapability>> {
        Ok(self.read().capabilities.get(&owner).cloned())
    }

    async fn get_capability_by_hash(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<ShareCapability>> {
        let inner = self.read();
        Ok(inner
            .by_hash
            .get(token_hash)
            .and_then(|owner| inner.capabilities.get(owner))
            .cloned())
    }

    async fn delete_capability(&self, owner: OwnerId) -> Result<bool> {
        let mut inner = self.write();
        match inner.capabilities.remove(&owner) {
            Some(previous) => {
                inner.by_hash.remove(&previous.token_hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_allowlist(&self, owner: OwnerId) -> Result<EmailAllowlist> {
        Ok(self
            .read()
            .allowlists
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_allowlist(&self, owner: OwnerId, allowlist: &EmailAllowlist) -> Result<()> {
        self.write().allowlists.insert(owner, allowlist.clone());
        Ok(())
    }

    async fn get_smtp_settings(&self, owner: OwnerId) -> Result<Option<SmtpSettings>> {
        Ok(self.read().smtp.get(&owner).cloned())
    }

    async fn put_smtp_settings(&self, owner: OwnerId, settings: &SmtpSettings) -> Result<()> {
        self.write().smtp.insert(owner, settings.clone());
        Ok(())
    }

    async fn get_session_settings(&self, owner: OwnerId) -> Result<Option<SessionSettings>> {
        Ok(self.read().sessions.get(&owner).copied())
    }

    async fn put_session_settings(
        &self,
        owner: OwnerId,
        settings: &SessionSettings,
    ) -> Result<()> {
        self.write().sessions.insert(owner, *settings);
        Ok(())
    }

    async fn append_access_event(&self, event: &AccessEvent) -> Result<()> {
        self.write()
            .access_log
            .entry(event.owner)
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn list_access_events(&self, owner: OwnerId) -> Result<Vec<AccessEvent>> {
        Ok(self
            .read()
            .access_log
            .get(&owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_access_events(&self, owner: OwnerId) -> Result<usize> {
        Ok(self
            .write()
            .access_log
            .remove(&owner)
            .map(|events| events.len())
            .unwrap_or(0))
    }
}
