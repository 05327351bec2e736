//! Settings endpoints
//!
//! POST /api/settings/enrichment_api_key

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{build_provider, is_valid_key, sync_api_key_to_toml};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    /// Provider in use after the update
    pub provider: String,
}

/// POST /api/settings/enrichment_api_key
///
/// Stores the key in the database, writes it back to the TOML file when one
/// is known, and switches the cache to a provider using it.
pub async fn set_enrichment_api_key(
    State(state): State<AppState>,
    Json(request): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    let key = request.api_key.trim();
    if !is_valid_key(key) {
        return Err(ApiError::BadRequest("API key cannot be empty".to_string()));
    }

    crate::db::settings::set_enrichment_api_key(&state.db, key).await?;
    info!("Enrichment API key stored in database");

    if let Some(path) = &state.config_path {
        sync_api_key_to_toml(key, path);
    }

    let provider = build_provider(&state.toml_config, Some(key.to_string()));
    state.cache.replace_provider(provider);

    Ok(Json(SetApiKeyResponse {
        success: true,
        provider: state.cache.provider_name().to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/enrichment_api_key", post(set_enrichment_api_key))
}
