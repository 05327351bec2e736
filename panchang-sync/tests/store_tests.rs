//! SQLite store integration tests

use panchang_common::engine;
use panchang_common::{AlmanacMonth, EnrichedDay, GeoCoordinate, Region};
use panchang_sync::db;
use panchang_sync::store::{AlmanacStore, SqliteStore, StoreError};
use panchang_sync::sync::CacheKey;

const NS: &str = "panchang_cache_v1";

fn month(year: i32, month: u32, region: Region) -> AlmanacMonth {
    let days = engine::skeleton_month(
        year,
        month,
        region,
        GeoCoordinate::reference(),
        engine::DEFAULT_UTC_OFFSET_MINUTES,
    );
    AlmanacMonth {
        month,
        year,
        region,
        days: days.into_iter().map(EnrichedDay::bare).collect(),
    }
}

async fn memory_store() -> SqliteStore {
    SqliteStore::new(db::init_memory_pool(0).await.unwrap())
}

#[tokio::test]
async fn test_put_then_get_returns_same_month() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 1, Region::Malayalam, None);
    let january = month(2024, 1, Region::Malayalam);

    assert!(store.get(&key).await.unwrap().is_none());
    store.put(&key, &january).await.unwrap();

    assert_eq!(store.get(&key).await.unwrap(), Some(january));
    assert!(store.contains(&key).await.unwrap());
}

#[tokio::test]
async fn test_put_overwrites_whole_record() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 2, Region::Tamil, None);

    let mut february = month(2024, 2, Region::Tamil);
    store.put(&key, &february).await.unwrap();

    february.days[0].advisory.festivals = vec!["Thai Poosam".to_string()];
    store.put(&key, &february).await.unwrap();

    let stored = store.get(&key).await.unwrap().unwrap();
    assert_eq!(stored.days[0].advisory.festivals, vec!["Thai Poosam".to_string()]);
}

#[tokio::test]
async fn test_incomplete_month_is_rejected() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 3, Region::Telugu, None);

    let mut march = month(2024, 3, Region::Telugu);
    march.days.truncate(20);

    let err = store.put(&key, &march).await.unwrap_err();
    assert!(matches!(err, StoreError::IncompleteMonth { days: 20, .. }));
    assert!(store.read(key.as_str()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_record_is_removed_on_read() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 4, Region::Bengali, None);

    store
        .write(key.as_str(), NS, "{not json".to_string())
        .await
        .unwrap();

    assert!(store.get(&key).await.unwrap().is_none());
    assert!(store.read(key.as_str()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stored_short_month_reads_as_miss() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 5, Region::Marathi, None);

    let mut may = month(2024, 5, Region::Marathi);
    may.days.truncate(10);
    let raw = serde_json::to_string(&may).unwrap();
    store.write(key.as_str(), NS, raw).await.unwrap();

    assert!(!store.contains(&key).await.unwrap());
    assert!(store.read(key.as_str()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_record_for_another_month_reads_as_miss() {
    let store = memory_store().await;
    let key = CacheKey::new(NS, 2024, 1, Region::Malayalam, None);

    // Complete, but January for a different region
    let tamil = serde_json::to_string(&month(2024, 1, Region::Tamil)).unwrap();
    store.write(key.as_str(), NS, tamil).await.unwrap();
    assert!(store.get(&key).await.unwrap().is_none());
    assert!(store.read(key.as_str()).await.unwrap().is_none());

    // Complete, right region, wrong year
    let last_year = serde_json::to_string(&month(2023, 1, Region::Malayalam)).unwrap();
    store.write(key.as_str(), NS, last_year).await.unwrap();
    assert!(!store.contains(&key).await.unwrap());
}

#[tokio::test]
async fn test_clear_is_scoped_to_namespace() {
    let store = memory_store().await;
    let old = CacheKey::new("panchang_cache_v0", 2024, 1, Region::Kannada, None);
    let a = CacheKey::new(NS, 2024, 1, Region::Kannada, None);
    let b = CacheKey::new(NS, 2024, 2, Region::Kannada, None);

    store.put(&old, &month(2024, 1, Region::Kannada)).await.unwrap();
    store.put(&a, &month(2024, 1, Region::Kannada)).await.unwrap();
    store.put(&b, &month(2024, 2, Region::Kannada)).await.unwrap();

    assert_eq!(store.clear(NS).await.unwrap(), 2);
    assert!(store.contains(&old).await.unwrap());
    assert!(!store.contains(&a).await.unwrap());
}

#[tokio::test]
async fn test_page_limit_surfaces_as_capacity_exceeded() {
    // A handful of pages holds the schema and little else
    let pool = db::init_memory_pool(16).await.unwrap();
    let store = SqliteStore::new(pool);

    let mut result = Ok(());
    for m in 1..=12 {
        let key = CacheKey::new(NS, 2024, m, Region::NorthIndian, None);
        result = store.put(&key, &month(2024, m, Region::NorthIndian)).await;
        if result.is_err() {
            break;
        }
    }

    assert!(matches!(result, Err(StoreError::CapacityExceeded)));

    // Eviction frees room again
    store.clear(NS).await.unwrap();
    let key = CacheKey::new(NS, 2024, 1, Region::NorthIndian, None);
    store
        .put(&key, &month(2024, 1, Region::NorthIndian))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_file_database_persists_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panchang.db");
    let key = CacheKey::new(NS, 2024, 6, Region::Malayalam, None);
    let june = month(2024, 6, Region::Malayalam);

    {
        let pool = db::init_database_pool(&path, 0).await.unwrap();
        SqliteStore::new(pool.clone()).put(&key, &june).await.unwrap();
        pool.close().await;
    }

    let pool = db::init_database_pool(&path, 0).await.unwrap();
    let store = SqliteStore::new(pool);
    assert_eq!(store.get(&key).await.unwrap(), Some(june));
}
