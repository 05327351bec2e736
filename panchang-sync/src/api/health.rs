//! Liveness and sync diagnostics
//!
//! GET /health

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::sync::PrefetchStatus;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the handler runs
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Enrichment provider answering new fetches
    pub provider: String,
    /// Fetches currently in flight, foreground and prefetch
    pub in_flight: usize,
    pub prefetch: PrefetchStatus,
    /// Most recent failed sync, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = (Utc::now() - state.startup_time).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "panchang-sync".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        provider: state.cache.provider_name().to_string(),
        in_flight: state.cache.in_flight_count(),
        prefetch: state.cache.prefetch_status(),
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
