//! SQLite-backed almanac store

use super::{AlmanacStore, StoreError};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// SQLite primary result code for "database or disk is full"
const SQLITE_FULL: &str = "13";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap a pool whose schema was created by [`crate::db::init_tables`]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let full = db_err.code().as_deref() == Some(SQLITE_FULL)
            || db_err.message().contains("database or disk is full");
        if full {
            return StoreError::CapacityExceeded;
        }
    }
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl AlmanacStore for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM almanac_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|(value,)| value))
    }

    async fn write(&self, key: &str, namespace: &str, value: String) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO almanac_cache (key, namespace, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                namespace = excluded.namespace,
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(namespace)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM almanac_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, namespace: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM almanac_cache WHERE namespace = ?")
            .bind(namespace)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
