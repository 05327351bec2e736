//! Database access for panchang-sync
//!
//! One SQLite file in the root folder holds the almanac cache and the
//! settings table.

pub mod settings;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Initialize database connection pool
///
/// `max_page_count` of 0 leaves the database unbounded; any other value
/// caps its size so writes past the cap fail with `SQLITE_FULL`.
pub async fn init_database_pool(db_path: &Path, max_page_count: u32) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = with_page_limit(SqliteConnectOptions::from_str(&db_url)?, max_page_count);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the same schema
///
/// Limited to one connection: every connection to `sqlite::memory:` opens
/// its own private database.
pub async fn init_memory_pool(max_page_count: u32) -> Result<SqlitePool> {
    let options = with_page_limit(SqliteConnectOptions::from_str("sqlite::memory:")?, max_page_count);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

fn with_page_limit(options: SqliteConnectOptions, max_page_count: u32) -> SqliteConnectOptions {
    if max_page_count > 0 {
        options.pragma("max_page_count", max_page_count.to_string())
    } else {
        options
    }
}

/// Creates the settings and almanac_cache tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS almanac_cache (
            key TEXT PRIMARY KEY,
            namespace TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_almanac_cache_namespace ON almanac_cache(namespace)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (settings, almanac_cache)");

    Ok(())
}
