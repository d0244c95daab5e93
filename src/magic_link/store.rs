//! Persistence for magic-link tokens and admin sessions.
//!
//! Every operation takes token hashes, never raw tokens. Expiry is always compared
//! against the `now` the caller passes in, so the service's clock is authoritative.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::models::{AdminSession, Role};
use crate::db::is_unique_violation;

/// Rows removed by a sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeCounts {
    pub magic_links: u64,
    pub sessions: u64,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Make `token_hash` the only token for `email`, atomically.
    ///
    /// Concurrent calls for the same email must still leave exactly one row.
    async fn replace_token(
        &self,
        email: &str,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Remove a single token (used to roll back an undelivered link).
    async fn revoke_token(&self, token_hash: &[u8]) -> Result<()>;

    /// Delete the token if it exists and `expires_at > now`; return its email.
    ///
    /// Must be a single atomic check-and-delete so concurrent callers cannot both win.
    async fn consume_token(&self, token_hash: &[u8], now: DateTime<Utc>)
    -> Result<Option<String>>;

    /// Insert a session. Returns `false` when the hash already exists.
    async fn insert_session(
        &self,
        session_hash: &[u8],
        email: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn lookup_session(
        &self,
        session_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>>;

    /// Idempotent; missing sessions are fine.
    async fn delete_session(&self, session_hash: &[u8]) -> Result<()>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts>;
}

/// Postgres-backed store.
#[derive(Clone, Debug)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn replace_token(
        &self,
        email: &str,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        // `email` is unique, so concurrent requests serialize on the conflicting row.
        let query = r"
            INSERT INTO magic_links (email, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(email)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to store magic link")?;

        Ok(())
    }

    async fn revoke_token(&self, token_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM magic_links WHERE token_hash = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to revoke magic link")?;
        Ok(())
    }

    async fn consume_token(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let query = r"
            DELETE FROM magic_links
            WHERE token_hash = $1
              AND expires_at > $2
            RETURNING email
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume magic link")?;

        Ok(row.map(|row| row.get("email")))
    }

    async fn insert_session(
        &self,
        session_hash: &[u8],
        email: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let query = r"
            INSERT INTO admin_sessions (email, role, session_hash, expires_at)
            VALUES ($1, $2, $3, $4)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(role.as_str())
            .bind(session_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err).context("failed to insert session"),
        }
    }

    async fn lookup_session(
        &self,
        session_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>> {
        // Record activity without extending the session TTL.
        let query = r"
            UPDATE admin_sessions
            SET last_seen_at = $2
            WHERE session_hash = $1
              AND expires_at > $2
            RETURNING email, role, expires_at
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(session_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup session")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: String = row.get("role");
        Ok(Some(AdminSession {
            email: row.get("email"),
            role: Role::from_db(&role).context("failed to decode session role")?,
            expires_at: row.get("expires_at"),
        }))
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM admin_sessions WHERE session_hash = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(session_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete session")?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts> {
        let query = "DELETE FROM magic_links WHERE expires_at <= $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let magic_links = sqlx::query(query)
            .bind(now)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired magic links")?
            .rows_affected();

        let query = "DELETE FROM admin_sessions WHERE expires_at <= $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let sessions = sqlx::query(query)
            .bind(now)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired sessions")?
            .rows_affected();

        Ok(PurgeCounts {
            magic_links,
            sessions,
        })
    }
}
