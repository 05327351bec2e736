//! Bulk cache reset
//!
//! DELETE /api/cache

use axum::{extract::State, routing::delete, Json, Router};
use serde::Serialize;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub namespace: String,
    pub removed: u64,
}

/// DELETE /api/cache
pub async fn reset_cache(State(state): State<AppState>) -> ApiResult<Json<ResetResponse>> {
    let removed = state.cache.reset().await?;
    Ok(Json(ResetResponse {
        namespace: state.cache.settings().namespace.clone(),
        removed,
    }))
}

/// Build cache routes
pub fn cache_routes() -> Router<AppState> {
    Router::new().route("/api/cache", delete(reset_cache))
}
