//! Enrichment API key resolution and write-back
//!
//! Tests touching PANCHANG_ENRICHMENT_API_KEY run #[serial].

use panchang_common::config::{
    load_toml_config, write_toml_config, EnrichmentConfig, TomlConfig, ENRICHMENT_API_KEY_ENV,
};
use panchang_sync::config::{build_provider, resolve_enrichment_api_key, sync_api_key_to_toml};
use panchang_sync::db;
use serial_test::serial;

fn toml_with_key(key: &str) -> TomlConfig {
    TomlConfig {
        enrichment: EnrichmentConfig {
            api_key: Some(key.to_string()),
            ..EnrichmentConfig::default()
        },
        ..TomlConfig::default()
    }
}

#[tokio::test]
#[serial]
async fn test_database_key_wins() {
    let pool = db::init_memory_pool(0).await.unwrap();
    db::settings::set_enrichment_api_key(&pool, "from-db").await.unwrap();
    std::env::set_var(ENRICHMENT_API_KEY_ENV, "from-env");

    let key = resolve_enrichment_api_key(Some(&pool), &toml_with_key("from-toml"))
        .await
        .unwrap();

    std::env::remove_var(ENRICHMENT_API_KEY_ENV);
    assert_eq!(key.as_deref(), Some("from-db"));
}

#[tokio::test]
#[serial]
async fn test_env_beats_toml() {
    std::env::set_var(ENRICHMENT_API_KEY_ENV, "from-env");

    let key = resolve_enrichment_api_key(None, &toml_with_key("from-toml"))
        .await
        .unwrap();

    std::env::remove_var(ENRICHMENT_API_KEY_ENV);
    assert_eq!(key.as_deref(), Some("from-env"));
}

#[tokio::test]
#[serial]
async fn test_blank_keys_are_ignored() {
    std::env::set_var(ENRICHMENT_API_KEY_ENV, "   ");
    let pool = db::init_memory_pool(0).await.unwrap();

    let key = resolve_enrichment_api_key(Some(&pool), &toml_with_key(""))
        .await
        .unwrap();

    std::env::remove_var(ENRICHMENT_API_KEY_ENV);
    assert_eq!(key, None);
}

#[test]
fn test_http_provider_needs_endpoint_and_key() {
    let mut config = TomlConfig::default();
    config.enrichment.endpoint = Some("http://127.0.0.1:9/enrich".to_string());

    assert_eq!(build_provider(&config, None).name(), "weekday-timings");
    assert_eq!(build_provider(&config, Some("k".to_string())).name(), "http");
}

#[test]
fn test_key_written_back_to_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    sync_api_key_to_toml("written", &path);
    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.enrichment.api_key.as_deref(), Some("written"));

    // Other settings survive a second write
    let mut edited = config.clone();
    edited.port = Some(6123);
    write_toml_config(&edited, &path).unwrap();
    sync_api_key_to_toml("rotated", &path);

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.port, Some(6123));
    assert_eq!(config.enrichment.api_key.as_deref(), Some("rotated"));
}
