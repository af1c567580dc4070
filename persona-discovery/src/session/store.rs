//! Session Store contract and in-memory implementation

use crate::session::model::{Session, SessionUpdate};
use async_trait::async_trait;
use persona_common::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for discovery sessions
///
/// `update` merges the partial update into the stored document atomically
/// with respect to other updates of the same session: time totals accumulate
/// and log entries append, so concurrent `progress` calls lose no events.
/// Other fields are last-write-wins. A finished session is rechecked under
/// the lock and never written again.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: &str) -> Result<Session>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>>;

    /// Merge `update` into the session and return the merged document
    ///
    /// # Errors
    /// `Error::NotFound` if the session does not exist, `Error::Conflict` if
    /// it is already completed or abandoned when the write lock is taken.
    async fn update(&self, id: Uuid, update: SessionUpdate) -> Result<Session>;

    /// Most recent sessions of a user, newest first
    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Session>>;
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: &str) -> Result<Session> {
        let session = Session::new(user_id);
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, update: SessionUpdate) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))?;
        session.apply_active(update)?;
        Ok(session.clone())
    }

    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        found.truncate(limit);
        Ok(found)
    }
}
