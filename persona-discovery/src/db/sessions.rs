//! SQLite Session Store
//!
//! Updates run inside a `BEGIN IMMEDIATE` transaction: the document is read,
//! merged and written back while holding the write lock, so two updates of
//! the same session never interleave. The transaction guard rolls back if the
//! update future is dropped before commit.

use crate::session::{Session, SessionStore, SessionUpdate};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use persona_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Wrap a pool whose tables were created by [`super::init_tables`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Fixed-width timestamp so the text column sorts chronologically
fn sortable(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode(document: &str) -> Result<Session> {
    Ok(serde_json::from_str(document)?)
}

async fn load(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Session>> {
    let document: Option<String> =
        sqlx::query_scalar("SELECT document FROM discovery_sessions WHERE session_id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    document.as_deref().map(decode).transpose()
}

async fn save(conn: &mut SqliteConnection, session: &Session) -> Result<()> {
    let document = serde_json::to_string(session)?;

    sqlx::query(
        r#"
        INSERT INTO discovery_sessions (
            session_id, user_id, current_step, document,
            started_at, updated_at, completed_at, abandoned_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            current_step = excluded.current_step,
            document = excluded.document,
            updated_at = excluded.updated_at,
            completed_at = excluded.completed_at,
            abandoned_at = excluded.abandoned_at
        "#,
    )
    .bind(session.id.to_string())
    .bind(&session.user_id)
    .bind(session.current_step.as_str())
    .bind(&document)
    .bind(sortable(session.started_at))
    .bind(sortable(session.updated_at))
    .bind(session.completed_at.map(sortable))
    .bind(session.abandoned_at.map(sortable))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn merge(conn: &mut SqliteConnection, id: Uuid, update: SessionUpdate) -> Result<Session> {
    let mut session = load(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("session {}", id)))?;
    session.apply_active(update)?;
    save(conn, &session).await?;
    Ok(session)
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, user_id: &str) -> Result<Session> {
        let session = Session::new(user_id);
        let mut conn = self.pool.acquire().await?;
        save(&mut conn, &session).await?;

        tracing::debug!(session_id = %session.id, "Session persisted");
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    async fn update(&self, id: Uuid, update: SessionUpdate) -> Result<Session> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        // Dropping `tx` on the error path rolls back
        let session = merge(&mut tx, id, update).await?;
        tx.commit().await?;
        Ok(session)
    }

    async fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Session>> {
        let documents: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT document
            FROM discovery_sessions
            WHERE user_id = ?
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        documents.iter().map(|d| decode(d)).collect()
    }
}
