//! The share service: unified API for diary share links.
//!
//! Brings together capability storage, email verification, session
//! credentials and the archive readers behind owner-side and viewer-side
//! operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use diaryshare_core::{
    validate_cookie_days, AccessEvent, AccessEventKind, DerivedKey, EmailAddress, EmailAllowlist,
    EmailLanguage, OwnerId, RawToken, SessionSettings, SessionSigner, SmtpSettings,
};
use diaryshare_perms::{
    issue_capability, open_capability, CredentialCodec, SessionCookie, VerificationCodes,
};
use diaryshare_search::{
    Archive, ContentKey, DecryptedDay, DiaryCipher, DiaryReader, MarkedDays, SearchEngine,
    SearchError, SearchHit, SearchQuery,
};
use diaryshare_store::{Store, StoreExt};
use tokio::sync::RwLock;

use crate::access::RequestContext;
use crate::config::ShareConfig;
use crate::error::{Result, ShareError};
use crate::mail::{MailMessage, Mailer};
use crate::types::{
    CodeRequest, CodeSubmission, ResolvedShare, SmtpSettingsView, TestEmailRequest,
    VerificationSettingsView, VerificationStatus,
};

/// The share service.
///
/// Owns every piece of share state: the store, the in-memory verification
/// codes and the session settings cache. Nothing is process-global; drop the
/// service and its state goes with it.
pub struct ShareService<S: Store> {
    store: Arc<S>,
    config: ShareConfig,
    codec: CredentialCodec,
    codes: VerificationCodes,
    /// Session settings, loaded from the store once per owner.
    sessions: RwLock<HashMap<OwnerId, SessionSettings>>,
    mailer: Arc<dyn Mailer>,
    cipher: Arc<dyn DiaryCipher>,
    engine: SearchEngine,
    reader: DiaryReader,
}

impl<S: Store> ShareService<S> {
    /// Create a service. Fails if the configuration is invalid.
    pub fn new(
        store: S,
        config: ShareConfig,
        archive: Arc<dyn Archive>,
        cipher: Arc<dyn DiaryCipher>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self> {
        config.validate()?;
        let signer = SessionSigner::new(config.server_secret.as_bytes())?;

        Ok(Self {
            store: Arc::new(store),
            codec: CredentialCodec::new(signer),
            codes: VerificationCodes::new(),
            sessions: RwLock::new(HashMap::new()),
            engine: SearchEngine::new(archive.clone(), cipher.clone()),
            reader: DiaryReader::new(archive, cipher.clone()),
            config,
            mailer,
            cipher,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Outstanding verification codes, for tests and hygiene sweeps.
    pub fn codes(&self) -> &VerificationCodes {
        &self.codes
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Capability Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the owner currently has a share link.
    pub async fn has_token(&self, owner: OwnerId) -> Result<bool> {
        Ok(self.store.has_capability(owner).await?)
    }

    /// Mint a new share token, replacing any previous one.
    ///
    /// The returned token is the only copy; it cannot be recovered later.
    pub async fn issue_token(&self, owner: OwnerId, derived_key: &DerivedKey) -> Result<String> {
        let issued = issue_capability(owner, derived_key)?;
        self.store.put_capability(&issued.capability).await?;

        tracing::info!(owner = %owner, token_hash = %issued.capability.token_hash, "share token issued");
        Ok(issued.token.encode())
    }

    /// Delete the owner's share link. Returns whether one existed.
    pub async fn revoke_token(&self, owner: OwnerId) -> Result<bool> {
        let existed = self.store.delete_capability(owner).await?;
        tracing::info!(owner = %owner, existed, "share token revoked");
        Ok(existed)
    }

    /// Resolve a presented token to its owner and derived key.
    ///
    /// Every failure is [`ShareError::Unauthorized`].
    pub async fn resolve(&self, token: &str) -> Result<ResolvedShare> {
        let raw = RawToken::parse(token.trim()).map_err(|_| {
            tracing::debug!("rejected malformed share token");
            ShareError::Unauthorized
        })?;
        let token_hash = raw.hash();

        let capability = self
            .store
            .get_capability_by_hash(&token_hash)
            .await?
            .ok_or_else(|| {
                tracing::debug!(token_hash = %token_hash, "rejected unknown share token");
                ShareError::Unauthorized
            })?;

        let derived_key = open_capability(&capability, &raw).map_err(|e| {
            tracing::debug!(token_hash = %token_hash, error = %e, "share token did not open capability");
            ShareError::Unauthorized
        })?;

        Ok(ResolvedShare {
            owner: capability.owner,
            derived_key,
            token_hash,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether viewers of this owner's link must verify their email.
    pub async fn is_required(&self, owner: OwnerId) -> Result<bool> {
        let (smtp, _) = self.effective_smtp(owner).await?;
        if !smtp.is_configured() {
            return Ok(false);
        }
        Ok(!self.store.get_allowlist(owner).await?.is_empty())
    }

    pub async fn verification_settings(&self, owner: OwnerId) -> Result<VerificationSettingsView> {
        let allowlist = self.store.get_allowlist(owner).await?;
        let smtp = self.store.get_smtp_settings(owner).await?.unwrap_or_default();
        Ok(VerificationSettingsView {
            emails: allowlist.to_strings(),
            smtp_configured: smtp.is_configured(),
        })
    }

    /// Replace the allow-list. Returns the list as saved.
    pub async fn save_allowlist<T: AsRef<str>>(
        &self,
        owner: OwnerId,
        emails: &[T],
    ) -> Result<EmailAllowlist> {
        let allowlist = EmailAllowlist::from_input(emails)
            .map_err(|e| ShareError::bad_request(e.to_string()))?;
        self.store.put_allowlist(owner, &allowlist).await?;

        tracing::info!(owner = %owner, count = allowlist.len(), "share allow-list saved");
        Ok(allowlist)
    }

    /// The settings mail is sent with, and whether they are the global default.
    pub async fn effective_smtp(&self, owner: OwnerId) -> Result<(SmtpSettings, bool)> {
        if let Some(mut settings) = self.store.get_smtp_settings(owner).await? {
            if settings.is_configured() {
                settings.port = settings.effective_port();
                return Ok((settings, false));
            }
        }
        Ok((self.config.global_smtp_effective(), true))
    }

    pub async fn smtp_settings(&self, owner: OwnerId) -> Result<SmtpSettingsView> {
        let settings = self.store.get_smtp_settings(owner).await?.unwrap_or_default();
        let (effective_settings, using_global_default) = self.effective_smtp(owner).await?;
        Ok(SmtpSettingsView {
            settings,
            effective_settings,
            using_global_default,
        })
    }

    /// Save the owner's SMTP override. Clearing host and from reverts to the
    /// global default.
    pub async fn save_smtp_settings(
        &self,
        owner: OwnerId,
        input: SmtpSettings,
    ) -> Result<SmtpSettings> {
        let settings = input.normalized();
        settings
            .validate()
            .map_err(|e| ShareError::bad_request(e.to_string()))?;
        self.store.put_smtp_settings(owner, &settings).await?;

        tracing::info!(owner = %owner, configured = settings.is_configured(), "share SMTP settings saved");
        Ok(settings)
    }

    /// Send a test message with the given settings, or the effective ones
    /// when the request leaves host and from blank.
    pub async fn send_test_email(&self, owner: OwnerId, request: TestEmailRequest) -> Result<()> {
        let to = EmailAddress::parse(&request.to_email)
            .map_err(|_| ShareError::bad_request("invalid test recipient email"))?;

        let mut settings = request.settings.normalized();
        if settings.is_cleared() {
            settings = self.effective_smtp(owner).await?.0;
        }
        if !settings.is_configured() {
            return Err(ShareError::Configuration("SMTP is not configured".into()));
        }

        self.mailer
            .send(&settings, &MailMessage::smtp_test(to.as_str()))
            .await
            .map_err(ShareError::Delivery)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// The owner's cookie lifetime and revocation version.
    pub async fn session_settings(&self, owner: OwnerId) -> Result<SessionSettings> {
        if let Some(settings) = self.sessions.read().await.get(&owner) {
            return Ok(*settings);
        }

        let mut cache = self.sessions.write().await;
        self.cached_or_load(&mut cache, owner).await
    }

    async fn cached_or_load(
        &self,
        cache: &mut HashMap<OwnerId, SessionSettings>,
        owner: OwnerId,
    ) -> Result<SessionSettings> {
        if let Some(settings) = cache.get(&owner) {
            return Ok(*settings);
        }
        let settings = self
            .store
            .session_settings_or_default(owner, self.config.cookie_days_fallback())
            .await?;
        cache.insert(owner, settings);
        Ok(settings)
    }

    /// Change how long new session cookies last (1 to 365 days).
    pub async fn save_cookie_days(&self, owner: OwnerId, days: i64) -> Result<SessionSettings> {
        let days = validate_cookie_days(days).map_err(|e| ShareError::bad_request(e.to_string()))?;

        let mut cache = self.sessions.write().await;
        let mut settings = self.cached_or_load(&mut cache, owner).await?;
        settings.cookie_days = days;
        self.store.put_session_settings(owner, &settings).await?;
        cache.insert(owner, settings);

        tracing::info!(owner = %owner, cookie_days = days, "share session settings saved");
        Ok(settings)
    }

    /// Invalidate every outstanding session cookie for the owner.
    pub async fn invalidate_all_sessions(&self, owner: OwnerId) -> Result<SessionSettings> {
        let mut cache = self.sessions.write().await;
        let mut settings = self.cached_or_load(&mut cache, owner).await?;
        settings.bump_version();
        self.store.put_session_settings(owner, &settings).await?;
        cache.insert(owner, settings);

        tracing::info!(owner = %owner, cookie_version = settings.cookie_version, "share sessions invalidated");
        Ok(settings)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access Log
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn access_log(&self, owner: OwnerId) -> Result<Vec<AccessEvent>> {
        Ok(self.store.list_access_events(owner).await?)
    }

    pub async fn clear_access_log(&self, owner: OwnerId) -> Result<usize> {
        let removed = self.store.clear_access_events(owner).await?;
        tracing::info!(owner = %owner, removed, "share access log cleared");
        Ok(removed)
    }

    /// Append to the access log. A failed write never fails the request.
    async fn record(
        &self,
        owner: OwnerId,
        kind: AccessEventKind,
        email: &str,
        ctx: &RequestContext,
    ) {
        let event = AccessEvent::new(owner, kind, email, ctx.client_ip.as_str(), ctx.path.as_str());
        if let Err(e) = self.store.append_access_event(&event).await {
            tracing::warn!(owner = %owner, event = %kind, error = %e, "failed to record share access");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Viewer Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// The email a cookie proves, if it is valid for this share right now.
    async fn verified_email(
        &self,
        share: &ResolvedShare,
        cookie: Option<&str>,
    ) -> Result<Option<EmailAddress>> {
        let Some(value) = cookie.filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        let settings = self.session_settings(share.owner).await?;
        match self
            .codec
            .parse(value, &share.token_hash, settings.cookie_version, Utc::now())
        {
            Ok(credential) => Ok(Some(credential.email)),
            Err(rejection) => {
                tracing::debug!(owner = %share.owner, reason = %rejection, "session credential rejected");
                Ok(None)
            }
        }
    }

    pub async fn verification_status(
        &self,
        token: &str,
        cookie: Option<&str>,
    ) -> Result<VerificationStatus> {
        let share = self.resolve(token).await?;
        let required = self.is_required(share.owner).await?;
        let verified = !required || self.verified_email(&share, cookie).await?.is_some();
        Ok(VerificationStatus { required, verified })
    }

    /// Email a one-time code to an allow-listed viewer.
    pub async fn request_code(
        &self,
        token: &str,
        request: CodeRequest,
        ctx: &RequestContext,
    ) -> Result<()> {
        let share = self.resolve(token).await?;
        if !self.is_required(share.owner).await? {
            return Err(ShareError::bad_request("share verification is not configured"));
        }

        let email = EmailAddress::parse(&request.email)
            .map_err(|_| ShareError::bad_request("invalid email address"))?;

        let allowlist = self.store.get_allowlist(share.owner).await?;
        if !allowlist.contains(&email) {
            return Err(ShareError::forbidden("email not allowed"));
        }

        let ttl_minutes = self.config.code_ttl_minutes;
        let code = self.codes.issue(
            share.token_hash,
            &email,
            Duration::minutes(i64::from(ttl_minutes)),
        );

        let language = match request.language.trim() {
            "" => ctx.accept_language.as_deref().unwrap_or_default(),
            tag => tag,
        };
        let message = MailMessage::verification_code(
            email.as_str(),
            &code,
            ttl_minutes,
            EmailLanguage::from_tag(language),
        );

        let (smtp, _) = self.effective_smtp(share.owner).await?;
        self.mailer
            .send(&smtp, &message)
            .await
            .map_err(ShareError::Delivery)?;

        self.record(share.owner, AccessEventKind::CodeRequested, email.as_str(), ctx)
            .await;
        Ok(())
    }

    /// Exchange a correct code for a session cookie.
    pub async fn verify_code(
        &self,
        token: &str,
        submission: CodeSubmission,
        ctx: &RequestContext,
    ) -> Result<SessionCookie> {
        let share = self.resolve(token).await?;
        if !self.is_required(share.owner).await? {
            return Err(ShareError::bad_request("share verification is not configured"));
        }

        let code = submission.code.trim();
        let email = match EmailAddress::parse(&submission.email) {
            Ok(email) if !code.is_empty() => email,
            _ => return Err(ShareError::bad_request("invalid email or code")),
        };

        if !self.codes.verify(share.token_hash, &email, code) {
            return Err(ShareError::forbidden("invalid or expired verification code"));
        }

        let settings = self.session_settings(share.owner).await?;
        let expires = Utc::now() + Duration::days(i64::from(settings.cookie_days));
        let value = self
            .codec
            .build(share.token_hash, &email, expires, settings.cookie_version)?;

        self.record(share.owner, AccessEventKind::Verified, email.as_str(), ctx)
            .await;
        Ok(SessionCookie::new(value, expires))
    }

    /// Drop expired verification codes. Returns how many were dropped.
    pub fn sweep_expired_codes(&self) -> usize {
        self.codes.sweep_expired(Utc::now())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the token and check the cookie when verification is required.
    ///
    /// Returns the share and the verified email (empty when not required).
    async fn authorize(&self, token: &str, cookie: Option<&str>) -> Result<(ResolvedShare, String)> {
        let share = self.resolve(token).await?;
        if !self.is_required(share.owner).await? {
            return Ok((share, String::new()));
        }

        match self.verified_email(&share, cookie).await? {
            Some(email) => Ok((share, email.into())),
            None => Err(ShareError::forbidden("verification required")),
        }
    }

    async fn content_key(&self, share: &ResolvedShare) -> Result<ContentKey> {
        Ok(self
            .cipher
            .content_key(share.owner, &share.derived_key)
            .await?)
    }

    /// Calendar markers for one month.
    pub async fn marked_days(
        &self,
        token: &str,
        cookie: Option<&str>,
        year: i32,
        month: u32,
        ctx: &RequestContext,
    ) -> Result<MarkedDays> {
        let (share, email) = self.authorize(token, cookie).await?;
        let marked = self.reader.marked_days(share.owner, year, month).await?;

        self.record(share.owner, AccessEventKind::Access, &email, ctx).await;
        Ok(marked)
    }

    /// Every entry of one month, decrypted.
    pub async fn read_month(
        &self,
        token: &str,
        cookie: Option<&str>,
        year: i32,
        month: u32,
        ctx: &RequestContext,
    ) -> Result<Vec<DecryptedDay>> {
        let (share, email) = self.authorize(token, cookie).await?;
        let key = self.content_key(&share).await?;
        let days = self.reader.read_month(share.owner, &key, year, month).await?;

        self.record(share.owner, AccessEventKind::Access, &email, ctx).await;
        Ok(days)
    }

    /// Full-text search across the owner's whole archive.
    pub async fn search(
        &self,
        token: &str,
        cookie: Option<&str>,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchHit>> {
        let (share, email) = self.authorize(token, cookie).await?;
        let query = SearchQuery::parse(query).map_err(|e| match e {
            SearchError::EmptyQuery => ShareError::bad_request("missing search query"),
            other => other.into(),
        })?;

        let key = self.content_key(&share).await?;
        let hits = self.engine.search(share.owner, &key, &query).await?;

        self.record(share.owner, AccessEventKind::Access, &email, ctx).await;
        Ok(hits)
    }

    /// One attachment, decrypted.
    pub async fn download_file(
        &self,
        token: &str,
        cookie: Option<&str>,
        uuid: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<u8>> {
        let (share, email) = self.authorize(token, cookie).await?;
        if uuid.is_empty() {
            return Err(ShareError::bad_request("missing uuid"));
        }

        let key = self.content_key(&share).await?;
        let bytes = self.reader.download_file(share.owner, &key, uuid).await?;

        self.record(share.owner, AccessEventKind::Access, &email, ctx).await;
        Ok(bytes)
    }
}
