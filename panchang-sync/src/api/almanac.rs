//! Month retrieval and export
//!
//! GET /api/almanac/:year/:month
//! GET /api/almanac/:year/:month/export

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use panchang_common::events::LoadSource;
use panchang_common::{AlmanacMonth, GeoCoordinate, MonthRequest, Region};
use serde::Deserialize;
use std::sync::Arc;

use crate::sync::SyncOutcome;
use crate::{export, ApiError, ApiResult, AppState};

/// Which store answered the request
pub const SOURCE_HEADER: &str = "x-panchang-source";

/// Day number to select initially: today if in the month, else 1
pub const FOCUS_DAY_HEADER: &str = "x-panchang-focus-day";

/// Query parameters shared by both routes
#[derive(Debug, Default, Deserialize)]
pub struct AlmanacQuery {
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub force: bool,
}

impl AlmanacQuery {
    pub fn to_request(&self, year: i32, month: u32) -> ApiResult<MonthRequest> {
        let region = match &self.region {
            Some(name) => name.parse::<Region>()?,
            None => Region::default(),
        };

        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)?),
            (None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(
                    "lat and lon must be given together".to_string(),
                ))
            }
        };

        Ok(MonthRequest::new(year, month, region)?
            .with_location(location)
            .forced(self.force))
    }
}

async fn load_month(state: &AppState, request: MonthRequest) -> ApiResult<(Arc<AlmanacMonth>, LoadSource)> {
    match state.cache.load(request).await {
        Ok(SyncOutcome::Loaded { month, source }) => Ok((month, source)),
        Ok(SyncOutcome::Superseded) => Err(ApiError::Superseded),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

fn source_label(source: LoadSource) -> &'static str {
    match source {
        LoadSource::Cache => "cache",
        LoadSource::Network => "network",
    }
}

/// Civil date at the configured UTC offset
fn civil_today(utc_offset_minutes: i32) -> chrono::NaiveDate {
    (chrono::Utc::now() + chrono::Duration::minutes(utc_offset_minutes as i64)).date_naive()
}

/// GET /api/almanac/:year/:month
pub async fn get_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<AlmanacQuery>,
) -> ApiResult<Response> {
    let request = query.to_request(year, month)?;
    let (month, source) = load_month(&state, request).await?;

    let today = civil_today(state.cache.settings().utc_offset_minutes);
    let focus_day = month
        .focus_day(today)
        .map(|d| d.skeleton.day_number)
        .unwrap_or(1);

    Ok((
        [
            (SOURCE_HEADER, source_label(source).to_string()),
            (FOCUS_DAY_HEADER, focus_day.to_string()),
        ],
        Json((*month).clone()),
    )
        .into_response())
}

/// GET /api/almanac/:year/:month/export
///
/// Serves cached months only. Exporting never fetches and never replaces
/// the current request, so a pending load elsewhere is unaffected.
pub async fn export_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<AlmanacQuery>,
) -> ApiResult<Response> {
    let request = query.to_request(year, month)?;
    let Some(month) = state.cache.cached(&request).await? else {
        return Err(ApiError::NotCached(format!(
            "{} {}-{:02} has not been loaded",
            request.region, request.year, request.month
        )));
    };

    let disposition = format!("attachment; filename=\"{}\"", export::file_name(&month));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export::to_csv(&month),
    )
        .into_response())
}

/// Build almanac routes
pub fn almanac_routes() -> Router<AppState> {
    Router::new()
        .route("/api/almanac/:year/:month", get(get_month))
        .route("/api/almanac/:year/:month/export", get(export_month))
}
