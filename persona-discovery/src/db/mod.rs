//! SQLite persistence for discovery sessions

pub mod sessions;

pub use sessions::SqliteSessionStore;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to the database at `url` and create the tables
///
/// `url` is a sqlx SQLite URL such as `sqlite://discovery.db?mode=rwc`.
pub async fn init_database_pool(url: &str) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", url);

    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    init_tables(&pool).await?;
    Ok(pool)
}

/// Create the session table and its user index if missing
///
/// The full session is stored as a JSON document; the other columns exist
/// for lookups and ordering.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS discovery_sessions (
            session_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            current_step TEXT NOT NULL,
            document TEXT NOT NULL,
            started_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            abandoned_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_discovery_sessions_user
            ON discovery_sessions (user_id, started_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (discovery_sessions)");
    Ok(())
}
