//! SQLite bootstrap for the `users` store.
//!
//! Connections handed out by [`connect`] always have the embedded migrations
//! applied. Per-request access goes through [`SessionProvider`].

use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;

mod session;

pub use session::{ReadSession, SessionProvider, WriteSession};

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Opens the pool described by `config` and runs migrations.
pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    if config.database_url == IN_MEMORY_URL {
        return connect_in_memory().await;
    }

    let started_at = Instant::now();
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("parse DATABASE_URL {}", config.database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await
        .context("connect to database")?;

    migrate(&pool).await?;
    info!(
        mode = "file",
        duration_ms = started_at.elapsed().as_millis() as u64,
        "database ready"
    );
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// pinned to a single connection that is never recycled. Sessions on this
/// pool queue on that connection, so readers do not overlap here; use a file
/// database for concurrent reads.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(IN_MEMORY_URL)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("open in-memory database")?;

    migrate(&pool).await?;
    info!(mode = "memory", "database ready");
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("apply migrations")
}
