//! Enrichment gateway
//!
//! A provider receives the computed skeleton of a month and returns one
//! untrusted JSON object per day. [`merge`] turns that payload into an
//! [`AlmanacMonth`](panchang_common::AlmanacMonth) whose skeleton fields are
//! always the computed ones.

mod http_client;
mod merge;
mod weekday;

pub use http_client::{HttpEnrichmentClient, RateLimiter};
pub use merge::{advisory_from_value, merge};
pub use weekday::WeekdayTimingsProvider;

use async_trait::async_trait;
use panchang_common::{AlmanacDay, Region};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enrichment errors
///
/// Any of these fails the whole month: nothing is merged or cached.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider error {0}: {1}")]
    Api(u16, String),

    /// Response body was not the expected shape
    #[error("Malformed response: {0}")]
    Parse(String),

    /// Provider returned a different number of days than the skeleton
    #[error("Day count mismatch: expected {expected}, got {actual}")]
    DayCountMismatch { expected: usize, actual: usize },

    /// Request was superseded and its call abandoned
    #[error("Enrichment cancelled")]
    Cancelled,

    /// Provider needs settings that are missing (endpoint or API key)
    #[error("Enrichment provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EnrichmentError::Parse(err.to_string())
        } else {
            EnrichmentError::Network(err.to_string())
        }
    }
}

/// Computed skeleton of one month, as sent to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonMonth {
    pub year: i32,
    pub month: u32,
    pub region: Region,
    pub days: Vec<AlmanacDay>,
}

/// Raw provider response: one loosely typed object per day, index-aligned
/// with the skeleton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentPayload {
    #[serde(default)]
    pub days: Vec<serde_json::Value>,
}

/// Source of advisory content for a skeleton month
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Short name for logs and health output
    fn name(&self) -> &'static str;

    /// Fetch advisory content for `skeleton`
    ///
    /// Dropping the returned future abandons the call.
    async fn enrich(&self, skeleton: &SkeletonMonth) -> Result<EnrichmentPayload, EnrichmentError>;
}
