//! In-memory `AuthStore` for flow tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::models::{AdminSession, Role};
use super::store::{AuthStore, PurgeCounts};

#[derive(Clone, Debug)]
pub(crate) struct StoredLink {
    pub(crate) email: String,
    pub(crate) expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct MemoryAuthStore {
    links: Mutex<HashMap<Vec<u8>, StoredLink>>,
    sessions: Mutex<HashMap<Vec<u8>, AdminSession>>,
}

impl MemoryAuthStore {
    pub(crate) async fn link_count(&self) -> usize {
        self.links.lock().await.len()
    }

    pub(crate) async fn links_for(&self, email: &str) -> Vec<StoredLink> {
        self.links
            .lock()
            .await
            .values()
            .filter(|link| link.email == email)
            .cloned()
            .collect()
    }

    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn replace_token(
        &self,
        email: &str,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut links = self.links.lock().await;
        links.retain(|_, link| link.email != email);
        links.insert(
            token_hash.to_vec(),
            StoredLink {
                email: email.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn revoke_token(&self, token_hash: &[u8]) -> Result<()> {
        self.links.lock().await.remove(token_hash);
        Ok(())
    }

    async fn consume_token(
        &self,
        token_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let mut links = self.links.lock().await;
        match links.get(token_hash) {
            Some(link) if link.expires_at > now => {}
            _ => return Ok(None),
        }
        Ok(links.remove(token_hash).map(|link| link.email))
    }

    async fn insert_session(
        &self,
        session_hash: &[u8],
        email: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(session_hash) {
            return Ok(false);
        }
        sessions.insert(
            session_hash.to_vec(),
            AdminSession {
                email: email.to_string(),
                role,
                expires_at,
            },
        );
        Ok(true)
    }

    async fn lookup_session(
        &self,
        session_hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .get(session_hash)
            .filter(|session| session.expires_at > now)
            .cloned())
    }

    async fn delete_session(&self, session_hash: &[u8]) -> Result<()> {
        self.sessions.lock().await.remove(session_hash);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts> {
        let mut links = self.links.lock().await;
        let before = links.len();
        links.retain(|_, link| link.expires_at > now);
        let magic_links = (before - links.len()) as u64;

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        let sessions = (before - sessions.len()) as u64;

        Ok(PurgeCounts {
            magic_links,
            sessions,
        })
    }
}
