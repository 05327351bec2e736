//! HTTP enrichment provider
//!
//! Posts the skeleton month as JSON and expects `{"days": [...]}` back,
//! index-aligned with the skeleton.

use super::{EnrichmentError, EnrichmentPayload, EnrichmentProvider, SkeletonMonth};
use async_trait::async_trait;
use panchang_common::config::EnrichmentConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("panchang-sync/", env!("CARGO_PKG_VERSION"));

const INSTRUCTION: &str = "For each day, fill festivals, regionalMonthName, \
publicHoliday, rahuKaalam, gulikaKaalam and auspiciousTime for the given region. \
Return exactly one object per input day in the same order. Do not change date, \
lunar day, phase, mansion, sunrise or sunset; they are computed.";

/// Enforces a minimum interval between outbound calls
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Serialize)]
struct EnrichmentRequestBody<'a> {
    region: &'a str,
    month: u32,
    year: i32,
    instruction: &'a str,
    days: &'a [panchang_common::AlmanacDay],
}

/// Remote generative provider reached over HTTP
pub struct HttpEnrichmentClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpEnrichmentClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        min_interval_ms: u64,
    ) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::new(min_interval_ms)),
        })
    }

    /// Client from `[enrichment]` settings and a resolved API key
    pub fn from_config(config: &EnrichmentConfig, api_key: String) -> Result<Self, EnrichmentError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| EnrichmentError::NotConfigured("enrichment.endpoint".to_string()))?;

        Self::new(
            endpoint,
            api_key,
            Duration::from_secs(config.timeout_secs),
            config.min_interval_ms,
        )
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn enrich(&self, skeleton: &SkeletonMonth) -> Result<EnrichmentPayload, EnrichmentError> {
        self.rate_limiter.wait().await;

        let region = skeleton.region.display_name();
        tracing::debug!(
            endpoint = %self.endpoint,
            year = skeleton.year,
            month = skeleton.month,
            region = %region,
            "Requesting enrichment"
        );

        let body = EnrichmentRequestBody {
            region,
            month: skeleton.month,
            year: skeleton.year,
            instruction: INSTRUCTION,
            days: &skeleton.days,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api(status.as_u16(), error_text));
        }

        let payload: EnrichmentPayload = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))?;

        tracing::debug!(days = payload.days.len(), "Enrichment response received");

        Ok(payload)
    }
}
