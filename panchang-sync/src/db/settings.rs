//! Settings database operations
//!
//! Key/value accessors over the `settings` table.

use sqlx::{Pool, Sqlite};

const ENRICHMENT_API_KEY: &str = "enrichment_api_key";

/// Get the enrichment provider API key, if stored
pub async fn get_enrichment_api_key(db: &Pool<Sqlite>) -> sqlx::Result<Option<String>> {
    get_setting(db, ENRICHMENT_API_KEY).await
}

/// Store the enrichment provider API key
pub async fn set_enrichment_api_key(db: &Pool<Sqlite>, key: &str) -> sqlx::Result<()> {
    set_setting(db, ENRICHMENT_API_KEY, key).await
}

/// Generic setting getter
pub async fn get_setting(db: &Pool<Sqlite>, key: &str) -> sqlx::Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    Ok(row.map(|(value,)| value))
}

/// Generic setting setter (upsert)
pub async fn set_setting(db: &Pool<Sqlite>, key: &str, value: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_pool;

    #[tokio::test]
    async fn test_api_key_round_trip_and_overwrite() {
        let pool = init_memory_pool(0).await.unwrap();

        assert_eq!(get_enrichment_api_key(&pool).await.unwrap(), None);

        set_enrichment_api_key(&pool, "first").await.unwrap();
        set_enrichment_api_key(&pool, "second").await.unwrap();

        assert_eq!(
            get_enrichment_api_key(&pool).await.unwrap(),
            Some("second".to_string())
        );
    }
}
