//! Persistent almanac store
//!
//! Backends deal in raw JSON records; the typed `get`/`put` layer on top
//! owns encoding, completeness checks and removal of undecodable records.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::sync::CacheKey;
use async_trait::async_trait;
use panchang_common::AlmanacMonth;
use thiserror::Error;
use tracing::warn;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage quota or page limit reached; recovered by bulk eviction
    #[error("Store capacity exceeded")]
    CapacityExceeded,

    /// Stored record could not be decoded
    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Refused to persist a month that does not cover every calendar day
    #[error("Incomplete month {year}-{month:02}: {days} days")]
    IncompleteMonth { year: i32, month: u32, days: usize },

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Typed repository for cached months
///
/// Writes are full-record overwrites keyed by the complete cache key, so
/// concurrent writers never interleave partial state for one key.
#[async_trait]
pub trait AlmanacStore: Send + Sync {
    /// Raw record for `key`
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite the raw record for `key`
    async fn write(&self, key: &str, namespace: &str, value: String) -> Result<(), StoreError>;

    /// Delete one record, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete every record in `namespace`, returning the number removed
    async fn clear(&self, namespace: &str) -> Result<u64, StoreError>;

    /// Cached month for `key`
    ///
    /// A record that fails to decode, decodes to an incomplete month, or
    /// holds a different month than `key` names is deleted and reported as
    /// a miss.
    async fn get(&self, key: &CacheKey) -> Result<Option<AlmanacMonth>, StoreError> {
        let Some(raw) = self.read(key.as_str()).await? else {
            return Ok(None);
        };

        let reason = match serde_json::from_str::<AlmanacMonth>(&raw) {
            Ok(month) if !key.describes(&month) => format!(
                "record holds {} {}-{:02}",
                month.region, month.year, month.month
            ),
            Ok(month) if month.is_complete() => return Ok(Some(month)),
            Ok(month) => format!("incomplete month ({} days)", month.days.len()),
            Err(e) => e.to_string(),
        };

        warn!(key = %key, reason = %reason, "Removing corrupt cache entry");
        if let Err(e) = self.remove(key.as_str()).await {
            warn!(key = %key, error = %e, "Failed to remove corrupt cache entry");
        }
        Ok(None)
    }

    /// Persist `month` under `key`, overwriting any previous record
    async fn put(&self, key: &CacheKey, month: &AlmanacMonth) -> Result<(), StoreError> {
        if !month.is_complete() {
            return Err(StoreError::IncompleteMonth {
                year: month.year,
                month: month.month,
                days: month.days.len(),
            });
        }
        let value = serde_json::to_string(month).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.write(key.as_str(), key.namespace(), value).await
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}
