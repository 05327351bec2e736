//! Event types for the panchang event system
//!
//! Sync and prefetch outcomes are published on an [`EventBus`] so they stay
//! inspectable (SSE clients, tests, logs) without affecting control flow.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::region::Region;

/// Where a delivered month came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    Cache,
    Network,
}

/// Result of one prefetch sweep item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrefetchItemOutcome {
    /// Already cached, nothing fetched
    AlreadyCached,
    /// Fetched and written
    Fetched,
    /// Fetch failed; only future read latency is affected
    Failed { reason: String },
}

/// Panchang event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// A foreground request delivered a month
    MonthLoaded {
        key: String,
        source: LoadSource,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A foreground request failed while still current
    SyncFailed {
        key: String,
        year: i32,
        month: u32,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A completed request was no longer current and was dropped
    StaleDiscarded {
        key: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every entry in a namespace was cleared (user reset or capacity fault)
    CacheCleared {
        namespace: String,
        removed: u64,
        /// True when triggered by a capacity fault rather than a user reset
        eviction: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A background prefetch sweep started
    PrefetchStarted {
        anchor_year: i32,
        anchor_month: u32,
        region: Region,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One sweep item finished
    PrefetchProgress {
        key: String,
        year: i32,
        month: u32,
        outcome: PrefetchItemOutcome,
        completed: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A sweep ended, either normally or because the region changed
    PrefetchFinished {
        completed: usize,
        total: usize,
        aborted: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SyncEvent {
    /// Event name used for SSE `event:` lines
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::MonthLoaded { .. } => "MonthLoaded",
            SyncEvent::SyncFailed { .. } => "SyncFailed",
            SyncEvent::StaleDiscarded { .. } => "StaleDiscarded",
            SyncEvent::CacheCleared { .. } => "CacheCleared",
            SyncEvent::PrefetchStarted { .. } => "PrefetchStarted",
            SyncEvent::PrefetchProgress { .. } => "PrefetchProgress",
            SyncEvent::PrefetchFinished { .. } => "PrefetchFinished",
        }
    }
}

/// Broadcast bus for [`SyncEvent`]s
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use panchang_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SyncEvent) -> Result<usize, broadcast::error::SendError<SyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(SyncEvent::StaleDiscarded {
            key: "k".to_string(),
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "StaleDiscarded");
    }

    #[test]
    fn test_emit_without_subscribers_errors_but_lossy_does_not() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let event = SyncEvent::PrefetchFinished {
            completed: 0,
            total: 12,
            aborted: true,
            timestamp: chrono::Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SyncEvent::PrefetchProgress {
            key: "panchang_cache_v1_2024_3_Tamil_default".to_string(),
            year: 2024,
            month: 3,
            outcome: PrefetchItemOutcome::Failed {
                reason: "timeout".to_string(),
            },
            completed: 1,
            total: 12,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PrefetchProgress");
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["reason"], "timeout");
    }
}
