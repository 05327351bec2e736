//! Background prefetch sweep
//!
//! After a foreground fetch, the months within the configured radius on
//! either side are fetched one at a time, in calendar order, through the
//! same fetch path. Only one sweep runs per cache; a request for a second
//! sweep while one runs is a no-op. The sweep stops when the region changes,
//! and a sweep requested for the new region starts once the old one exits.

use super::{lock, FetchOrigin, Inner, SyncCache};
use panchang_common::events::{PrefetchItemOutcome, SyncEvent};
use panchang_common::{MonthRequest, Region};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot of the most recent sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchStatus {
    pub active: bool,
    pub anchor_year: Option<i32>,
    pub anchor_month: Option<u32>,
    pub region: Option<Region>,
    pub completed: usize,
    pub total: usize,
    pub fetched: usize,
    pub failed: usize,
    pub aborted: bool,
}

impl PrefetchStatus {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

/// Month offsets covered by a sweep, excluding the anchor
fn sweep_offsets(radius: u32) -> Vec<i32> {
    let radius = radius as i32;
    (-radius..=radius).filter(|d| *d != 0).collect()
}

impl SyncCache {
    /// Latest sweep progress
    pub fn prefetch_status(&self) -> PrefetchStatus {
        lock(&self.inner.prefetch_status).clone()
    }

    /// Resolves once no sweep is running or queued
    pub async fn wait_for_prefetch(&self) {
        loop {
            let guard = self.inner.sweep_lock.lock().await;
            if lock(&self.inner.pending_sweep).is_none() {
                return;
            }
            drop(guard);
            tokio::task::yield_now().await;
        }
    }

    /// Start a sweep around `anchor` unless one is already running
    ///
    /// If the running sweep has been cancelled, the new sweep is queued and
    /// starts when the old one releases the lock.
    pub(super) fn spawn_prefetch(&self, anchor: MonthRequest) {
        if self.inner.settings.prefetch_radius_months == 0 {
            return;
        }

        let inner = Arc::clone(&self.inner);
        match Arc::clone(&inner.sweep_lock).try_lock_owned() {
            Ok(guard) => {
                let token = inner.state.sweep_token();
                *lock(&inner.running_sweep) = Some(token.clone());
                tokio::spawn(run_sweep(inner, anchor, token, guard));
            }
            Err(_) => {
                let running_cancelled = lock(&inner.running_sweep)
                    .as_ref()
                    .map_or(false, CancellationToken::is_cancelled);
                if !running_cancelled {
                    debug!(
                        year = anchor.year,
                        month = anchor.month,
                        "Prefetch sweep already running"
                    );
                    return;
                }

                let waiter_queued = lock(&inner.pending_sweep).replace(anchor).is_some();
                if !waiter_queued {
                    debug!(region = %anchor.region, "Prefetch sweep queued behind cancelled sweep");
                    tokio::spawn(run_queued_sweep(inner));
                }
            }
        }
    }
}

/// Wait for the cancelled sweep to exit, then sweep the latest queued anchor
async fn run_queued_sweep(inner: Arc<Inner>) {
    let guard = Arc::clone(&inner.sweep_lock).lock_owned().await;
    let Some(anchor) = lock(&inner.pending_sweep).take() else {
        return;
    };

    let token = inner.state.sweep_token();
    if token.is_cancelled() || inner.state.current_region() != Some(anchor.region) {
        debug!(region = %anchor.region, "Queued prefetch sweep no longer current");
        return;
    }

    *lock(&inner.running_sweep) = Some(token.clone());
    run_sweep(inner, anchor, token, guard).await;
}

async fn run_sweep(
    inner: Arc<Inner>,
    anchor: MonthRequest,
    token: CancellationToken,
    _guard: OwnedMutexGuard<()>,
) {
    let offsets = sweep_offsets(inner.settings.prefetch_radius_months);
    let total = offsets.len();

    *lock(&inner.prefetch_status) = PrefetchStatus {
        active: true,
        anchor_year: Some(anchor.year),
        anchor_month: Some(anchor.month),
        region: Some(anchor.region),
        total,
        ..PrefetchStatus::default()
    };

    info!(
        year = anchor.year,
        month = anchor.month,
        region = %anchor.region,
        total,
        "Prefetch sweep started"
    );
    inner.emit(SyncEvent::PrefetchStarted {
        anchor_year: anchor.year,
        anchor_month: anchor.month,
        region: anchor.region,
        total,
        timestamp: chrono::Utc::now(),
    });

    let mut completed = 0;
    let mut aborted = false;

    for delta in offsets {
        if token.is_cancelled() || inner.state.current_region() != Some(anchor.region) {
            aborted = true;
            break;
        }

        let request = anchor.shifted(delta);
        let key = super::CacheKey::for_request(&inner.settings.namespace, &request);

        let cached = match inner.store.contains(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = %key, error = %e, "Prefetch cache check failed");
                false
            }
        };

        let outcome = if cached {
            PrefetchItemOutcome::AlreadyCached
        } else {
            tokio::select! {
                _ = token.cancelled() => {
                    aborted = true;
                    break;
                }
                _ = tokio::time::sleep(inner.settings.prefetch_throttle) => {}
            }

            let (fetch, _) = inner.join_or_start(&key, request, FetchOrigin::Prefetch, token.child_token());
            match fetch.await {
                Ok(_) => PrefetchItemOutcome::Fetched,
                Err(failure) => {
                    warn!(key = %key, reason = %failure, "Prefetch item failed");
                    PrefetchItemOutcome::Failed {
                        reason: failure.to_string(),
                    }
                }
            }
        };

        completed += 1;
        {
            let mut status = lock(&inner.prefetch_status);
            status.completed = completed;
            match outcome {
                PrefetchItemOutcome::Fetched => status.fetched += 1,
                PrefetchItemOutcome::Failed { .. } => status.failed += 1,
                PrefetchItemOutcome::AlreadyCached => {}
            }
        }

        inner.emit(SyncEvent::PrefetchProgress {
            key: key.to_string(),
            year: request.year,
            month: request.month,
            outcome,
            completed,
            total,
            timestamp: chrono::Utc::now(),
        });
    }

    {
        let mut status = lock(&inner.prefetch_status);
        status.active = false;
        status.aborted = aborted;
    }

    if aborted {
        info!(completed, total, "Prefetch sweep aborted");
    } else {
        info!(completed, total, "Prefetch sweep finished");
    }
    inner.emit(SyncEvent::PrefetchFinished {
        completed,
        total,
        aborted,
        timestamp: chrono::Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_covers_twelve_neighbours_for_radius_six() {
        let offsets = sweep_offsets(6);
        assert_eq!(offsets.len(), 12);
        assert_eq!(offsets.first(), Some(&-6));
        assert_eq!(offsets.last(), Some(&6));
        assert!(!offsets.contains(&0));
    }

    #[test]
    fn test_percent() {
        let status = PrefetchStatus {
            completed: 3,
            total: 12,
            ..PrefetchStatus::default()
        };
        assert_eq!(status.percent(), 25);
        assert_eq!(PrefetchStatus::default().percent(), 100);
    }
}
