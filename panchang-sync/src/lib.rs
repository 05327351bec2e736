//! panchang-sync library interface
//!
//! Synchronization cache, enrichment gateway, persistent store and the HTTP
//! surface. Exposed as a library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod store;
pub mod sync;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use panchang_common::config::TomlConfig;
use panchang_common::events::EventBus;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::sync::SyncCache;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings database (in-memory when running ephemeral)
    pub db: SqlitePool,
    pub cache: SyncCache,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub toml_config: Arc<TomlConfig>,
    /// TOML file settings are written back to, if known
    pub config_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, cache: SyncCache, toml_config: TomlConfig) -> Self {
        let event_bus = cache.events().clone();
        Self {
            db,
            cache,
            event_bus,
            toml_config: Arc::new(toml_config),
            config_path: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::almanac_routes())
        .merge(api::cache_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
