//! Token issuer, verifier and session binder.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    allow_list::AdminAllowList,
    clock::Clock,
    config::MagicLinkConfig,
    error::AuthError,
    models::{AdminIdentity, AdminSession, IssuedSession, Role},
    store::{AuthStore, PurgeCounts},
    utils::{build_magic_link_url, generate_token, hash_token, normalize_email},
};
use crate::email::{EmailMessage, EmailSender};

const MAGIC_LINK_SUBJECT: &str = "Your Magic Link";
const SESSION_INSERT_ATTEMPTS: usize = 3;

pub struct MagicLinkService {
    config: MagicLinkConfig,
    allow_list: AdminAllowList,
    store: Arc<dyn AuthStore>,
    mailer: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
}

impl MagicLinkService {
    pub fn new(
        config: MagicLinkConfig,
        allow_list: AdminAllowList,
        store: Arc<dyn AuthStore>,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            allow_list,
            store,
            mailer,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// Issue a fresh magic link for an allow-listed email and mail it.
    ///
    /// Any earlier token for the same email stops working. If the mailer fails the
    /// new token is revoked, so no undeliverable link stays live.
    ///
    /// # Errors
    /// `Unauthorized` for emails outside the allow-list (nothing is stored or sent),
    /// `Store` or `Mailer` on infrastructure failures.
    #[instrument(skip(self, email))]
    pub async fn request_link(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if !self.allow_list.contains(&email) {
            debug!("magic link requested for non-admin email");
            return Err(AuthError::Unauthorized);
        }

        let token = generate_token().map_err(AuthError::Store)?;
        let token_hash = hash_token(&token);
        let expires_at = self.expires_in(self.config.token_ttl())?;

        self.store
            .replace_token(&email, &token_hash, expires_at)
            .await
            .map_err(AuthError::Store)?;

        let message = self.magic_link_message(&email, &token);
        if let Err(err) = self.mailer.send(&message).await {
            error!("Failed to send magic link email: {err:#}");
            if let Err(revoke_err) = self.store.revoke_token(&token_hash).await {
                // Row still expires on its own.
                warn!("Failed to revoke undelivered magic link: {revoke_err:#}");
            }
            return Err(AuthError::Mailer(err));
        }

        info!(expires_at = %expires_at, "magic link issued");
        Ok(())
    }

    /// Consume a token and return the identity it was issued for.
    ///
    /// This is the only place tokens are validated; both the link-following route and
    /// the credential exchange go through it, so a token opens at most one session.
    ///
    /// # Errors
    /// `Invalid` for unknown, expired or already used tokens; `Store` on store failure.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Invalid);
        }

        let email = self
            .store
            .consume_token(&hash_token(token), self.clock.now())
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::Invalid)?;

        Ok(AdminIdentity::admin(email))
    }

    /// Credential-style exchange: the token must have been issued for `email`.
    ///
    /// The token is consumed even when the email does not match.
    ///
    /// # Errors
    /// `Invalid` when the token is unusable or belongs to another email.
    #[instrument(skip_all)]
    pub async fn bind(&self, email: &str, token: &str) -> Result<IssuedSession, AuthError> {
        let identity = self.verify(token).await?;
        if identity.email != normalize_email(email) {
            warn!("magic link presented with a mismatched email");
            return Err(AuthError::Invalid);
        }
        self.start_session(&identity).await
    }

    /// One-step path for a followed link: consume the token and open a session.
    ///
    /// # Errors
    /// Same as [`MagicLinkService::verify`].
    pub async fn verify_and_bind(&self, token: &str) -> Result<IssuedSession, AuthError> {
        let identity = self.verify(token).await?;
        self.start_session(&identity).await
    }

    async fn start_session(&self, identity: &AdminIdentity) -> Result<IssuedSession, AuthError> {
        let expires_at = self.expires_in(self.config.session_ttl())?;

        for _ in 0..SESSION_INSERT_ATTEMPTS {
            let token = generate_token().map_err(AuthError::Store)?;
            let inserted = self
                .store
                .insert_session(&hash_token(&token), &identity.email, identity.role, expires_at)
                .await
                .map_err(AuthError::Store)?;
            if inserted {
                info!("admin session started");
                return Ok(IssuedSession {
                    token,
                    session: AdminSession {
                        email: identity.email.clone(),
                        role: identity.role,
                        expires_at,
                    },
                });
            }
        }

        Err(AuthError::Store(anyhow::anyhow!(
            "failed to generate unique session token"
        )))
    }

    /// Resolve a raw session token into a live session.
    ///
    /// # Errors
    /// `Store` on store failure. Unknown or expired sessions are `Ok(None)`.
    pub async fn authenticate(&self, session_token: &str) -> Result<Option<AdminSession>, AuthError> {
        if session_token.trim().is_empty() {
            return Ok(None);
        }
        let session = self
            .store
            .lookup_session(&hash_token(session_token), self.clock.now())
            .await
            .map_err(AuthError::Store)?;
        Ok(session.filter(|session| session.role == Role::Admin))
    }

    /// End a session. Logging out twice is fine.
    ///
    /// # Errors
    /// `Store` on store failure.
    pub async fn logout(&self, session_token: &str) -> Result<(), AuthError> {
        self.store
            .delete_session(&hash_token(session_token))
            .await
            .map_err(AuthError::Store)
    }

    /// Delete expired tokens and sessions.
    ///
    /// # Errors
    /// `Store` on store failure.
    pub async fn purge_expired(&self) -> Result<PurgeCounts, AuthError> {
        self.store
            .purge_expired(self.clock.now())
            .await
            .map_err(AuthError::Store)
    }

    fn expires_in(&self, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
        self.clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Store(anyhow::anyhow!("expiry out of range for ttl {ttl}")))
    }

    fn magic_link_message(&self, email: &str, token: &str) -> EmailMessage {
        let link = build_magic_link_url(self.config.app_base_url(), token);
        EmailMessage {
            to_email: email.to_string(),
            subject: MAGIC_LINK_SUBJECT.to_string(),
            text_body: format!("Click here to log in: {link}"),
            html_body: format!("<p>Click <a href=\"{link}\">here</a> to log in.</p>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::testing::RecordingEmailSender;
    use crate::magic_link::clock::testing::ManualClock;
    use crate::magic_link::memory::MemoryAuthStore;
    use anyhow::Result;

    struct Harness {
        service: MagicLinkService,
        store: Arc<MemoryAuthStore>,
        mailer: Arc<RecordingEmailSender>,
        clock: Arc<ManualClock>,
    }

    fn harness_with(mailer: RecordingEmailSender) -> Result<Harness> {
        let store = Arc::new(MemoryAuthStore::default());
        let mailer = Arc::new(mailer);
        let clock = Arc::new(ManualClock::new());
        let service = MagicLinkService::new(
            MagicLinkConfig::new("https://boxport.dev".to_string()),
            AdminAllowList::parse("admin@example.com,ops@example.com")?,
            store.clone(),
            mailer.clone(),
            clock.clone(),
        );
        Ok(Harness {
            service,
            store,
            mailer,
            clock,
        })
    }

    fn harness() -> Result<Harness> {
        harness_with(RecordingEmailSender::default())
    }

    #[tokio::test]
    async fn non_admin_email_creates_nothing_and_sends_nothing() -> Result<()> {
        let h = harness()?;
        let result = h.service.request_link("random@nowhere.com").await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        assert_eq!(h.store.link_count().await, 0);
        assert_eq!(h.mailer.count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn admin_request_stores_one_token_with_fifteen_minute_expiry() -> Result<()> {
        let h = harness()?;
        let issued_at = h.clock.now();
        h.service.request_link("Admin@Example.com ").await?;

        let links = h.store.links_for("admin@example.com").await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].expires_at, issued_at + Duration::minutes(15));
        assert_eq!(h.mailer.count().await, 1);

        let sent = h.mailer.messages().await;
        assert_eq!(sent[0].to_email, "admin@example.com");
        assert_eq!(sent[0].subject, "Your Magic Link");
        assert!(
            sent[0]
                .text_body
                .contains("https://boxport.dev/admin/verify?token=")
        );
        Ok(())
    }

    #[tokio::test]
    async fn second_request_supersedes_the_first() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let first = h.mailer.last_token().await?;

        h.clock.advance(Duration::minutes(1));
        h.service.request_link("admin@example.com").await?;
        let second = h.mailer.last_token().await?;
        assert_ne!(first, second);
        assert_eq!(h.store.links_for("admin@example.com").await.len(), 1);

        assert!(matches!(
            h.service.verify(&first).await,
            Err(AuthError::Invalid)
        ));
        assert_eq!(h.service.verify(&second).await?.email, "admin@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn tokens_for_other_admins_are_untouched_by_rotation() -> Result<()> {
        let h = harness()?;
        h.service.request_link("ops@example.com").await?;
        let ops_token = h.mailer.last_token().await?;
        h.service.request_link("admin@example.com").await?;

        assert_eq!(h.store.link_count().await, 2);
        assert_eq!(h.service.verify(&ops_token).await?.email, "ops@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn token_expires_after_ttl_even_though_row_exists() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        h.clock.advance(Duration::minutes(16));
        assert!(matches!(
            h.service.verify(&token).await,
            Err(AuthError::Invalid)
        ));
        assert_eq!(h.store.link_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn token_is_invalid_exactly_at_expiry() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        h.clock.advance(Duration::minutes(15));
        assert!(matches!(
            h.service.verify(&token).await,
            Err(AuthError::Invalid)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn token_is_valid_just_before_expiry() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        h.clock.advance(Duration::minutes(15) - Duration::seconds(1));
        assert_eq!(h.service.verify(&token).await?.role, Role::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_and_blank_tokens_are_invalid() -> Result<()> {
        let h = harness()?;
        assert!(matches!(
            h.service.verify("does-not-exist").await,
            Err(AuthError::Invalid)
        ));
        assert!(matches!(h.service.verify("  ").await, Err(AuthError::Invalid)));
        Ok(())
    }

    #[tokio::test]
    async fn verify_and_bind_is_single_use() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        let issued = h.service.verify_and_bind(&token).await?;
        assert_eq!(issued.session.email, "admin@example.com");
        assert_eq!(issued.session.role, Role::Admin);
        assert_eq!(h.store.link_count().await, 0);

        assert!(matches!(
            h.service.verify_and_bind(&token).await,
            Err(AuthError::Invalid)
        ));
        assert!(matches!(
            h.service.bind("admin@example.com", &token).await,
            Err(AuthError::Invalid)
        ));
        assert_eq!(h.store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn verify_then_bind_cannot_reuse_the_token() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        h.service.verify(&token).await?;
        assert!(matches!(
            h.service.bind("admin@example.com", &token).await,
            Err(AuthError::Invalid)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_verification_has_exactly_one_winner() -> Result<()> {
        let h = Arc::new(harness()?);
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let h = h.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                h.service.verify_and_bind(&token).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await? {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }

    #[tokio::test]
    async fn bind_requires_matching_email_and_still_consumes() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        assert!(matches!(
            h.service.bind("ops@example.com", &token).await,
            Err(AuthError::Invalid)
        ));
        assert_eq!(h.store.session_count().await, 0);
        assert!(matches!(
            h.service.bind("admin@example.com", &token).await,
            Err(AuthError::Invalid)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn bind_accepts_email_in_any_case() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;

        let issued = h.service.bind(" ADMIN@example.com", &token).await?;
        assert_eq!(issued.session.email, "admin@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn mailer_failure_rolls_back_the_token() -> Result<()> {
        let h = harness_with(RecordingEmailSender::failing())?;
        let result = h.service.request_link("admin@example.com").await;
        assert!(matches!(result, Err(AuthError::Mailer(_))));
        assert_eq!(h.mailer.count().await, 1);
        assert_eq!(h.store.link_count().await, 0);

        let token = h.mailer.last_token().await?;
        assert!(matches!(
            h.service.verify(&token).await,
            Err(AuthError::Invalid)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn sessions_authenticate_until_expiry_or_logout() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;
        let issued = h.service.verify_and_bind(&token).await?;

        let session = h.service.authenticate(&issued.token).await?;
        assert_eq!(session.map(|s| s.email), Some("admin@example.com".to_string()));
        assert!(h.service.authenticate("bogus").await?.is_none());
        assert!(h.service.authenticate("").await?.is_none());

        h.service.logout(&issued.token).await?;
        assert!(h.service.authenticate(&issued.token).await?.is_none());
        h.service.logout(&issued.token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn sessions_expire_after_session_ttl() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        let token = h.mailer.last_token().await?;
        let issued = h.service.verify_and_bind(&token).await?;

        h.clock.advance(Duration::hours(12));
        assert!(h.service.authenticate(&issued.token).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() -> Result<()> {
        let h = harness()?;
        h.service.request_link("admin@example.com").await?;
        h.clock.advance(Duration::minutes(20));
        h.service.request_link("ops@example.com").await?;

        let counts = h.service.purge_expired().await?;
        assert_eq!(counts.magic_links, 1);
        assert_eq!(counts.sessions, 0);
        assert_eq!(h.store.links_for("ops@example.com").await.len(), 1);
        Ok(())
    }

    fn service_with(config: MagicLinkConfig, clock: Arc<ManualClock>) -> Result<Harness> {
        let store = Arc::new(MemoryAuthStore::default());
        let mailer = Arc::new(RecordingEmailSender::default());
        let service = MagicLinkService::new(
            config,
            AdminAllowList::parse("admin@example.com")?,
            store.clone(),
            mailer.clone(),
            clock.clone(),
        );
        Ok(Harness {
            service,
            store,
            mailer,
            clock,
        })
    }

    #[tokio::test]
    async fn huge_ttls_are_capped_instead_of_panicking() -> Result<()> {
        let config = MagicLinkConfig::new("https://boxport.dev".to_string())
            .with_token_ttl_seconds(i64::MAX)
            .with_session_ttl_seconds(10_000_000_000_000);
        let h = service_with(config, Arc::new(ManualClock::new()))?;
        let issued_at = h.clock.now();

        h.service.request_link("admin@example.com").await?;
        let links = h.store.links_for("admin@example.com").await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].expires_at, issued_at + Duration::days(365));

        let token = h.mailer.last_token().await?;
        let issued = h.service.verify_and_bind(&token).await?;
        assert_eq!(issued.session.expires_at, issued_at + Duration::days(365));
        Ok(())
    }

    #[tokio::test]
    async fn expiry_overflow_is_a_store_error() -> Result<()> {
        let clock = Arc::new(ManualClock::at(
            DateTime::<Utc>::MAX_UTC - Duration::minutes(1),
        ));
        let h = service_with(
            MagicLinkConfig::new("https://boxport.dev".to_string()),
            clock,
        )?;

        let result = h.service.request_link("admin@example.com").await;
        assert!(matches!(result, Err(AuthError::Store(_))));
        assert_eq!(h.store.link_count().await, 0);
        assert_eq!(h.mailer.count().await, 0);
        Ok(())
    }
}
