//! Runtime configuration resolution for panchang-sync
//!
//! Enrichment API key priority: Database → ENV → TOML. Without a key (or
//! without an endpoint) the offline weekday provider is used.

use crate::enrichment::{EnrichmentProvider, HttpEnrichmentClient, WeekdayTimingsProvider};
use panchang_common::config::{
    load_toml_config, write_toml_config, TomlConfig, DEFAULT_PORT, ENRICHMENT_API_KEY_ENV,
};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the enrichment API key
///
/// Returns `Ok(None)` when no tier holds a valid key.
pub async fn resolve_enrichment_api_key(
    db: Option<&Pool<Sqlite>>,
    toml_config: &TomlConfig,
) -> sqlx::Result<Option<String>> {
    // Tier 1: Database (authoritative)
    let db_key = match db {
        Some(db) => crate::db::settings::get_enrichment_api_key(db).await?,
        None => None,
    }
    .filter(|k| is_valid_key(k));

    // Tier 2: Environment variable
    let env_key = std::env::var(ENRICHMENT_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));

    // Tier 3: TOML config
    let toml_key = toml_config
        .enrichment
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| "database"),
        env_key.as_ref().map(|_| "environment"),
        toml_key.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "Enrichment API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(source) = sources.first() {
        info!("Enrichment API key loaded from {}", source);
    }

    Ok(db_key.or(env_key).or(toml_key))
}

/// Provider for the resolved settings
pub fn build_provider(toml_config: &TomlConfig, api_key: Option<String>) -> Arc<dyn EnrichmentProvider> {
    let (Some(_), Some(key)) = (&toml_config.enrichment.endpoint, api_key) else {
        info!("Enrichment endpoint or key not configured, using offline weekday timings");
        return Arc::new(WeekdayTimingsProvider);
    };

    match HttpEnrichmentClient::from_config(&toml_config.enrichment, key) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "HTTP enrichment client unavailable, using offline weekday timings");
            Arc::new(WeekdayTimingsProvider)
        }
    }
}

/// HTTP port: CLI/ENV (merged by clap) → TOML → default
pub fn resolve_port(cli_or_env: Option<u16>, toml_config: &TomlConfig) -> u16 {
    cli_or_env.or(toml_config.port).unwrap_or(DEFAULT_PORT)
}

/// Write the API key back to the TOML file
///
/// Best-effort: the database already holds the key, so failures only warn.
pub fn sync_api_key_to_toml(key: &str, toml_path: &Path) {
    let mut config = if toml_path.exists() {
        match load_toml_config(toml_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("TOML read failed, not writing back API key: {}", e);
                return;
            }
        }
    } else {
        TomlConfig::default()
    };

    config.enrichment.api_key = Some(key.to_string());

    match write_toml_config(&config, toml_path) {
        Ok(()) => info!("API key synced to TOML: {}", toml_path.display()),
        Err(e) => warn!("TOML write failed (database write succeeded): {}", e),
    }
}
