//! Session-local request state
//!
//! Tracks the currently relevant cache key as a generation counter. Each
//! foreground request captures a [`RequestTicket`]; after every suspension
//! point the ticket is compared against the live generation to detect
//! superseded work.

use super::CacheKey;
use panchang_common::Region;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Captured identity of one foreground request
#[derive(Debug, Clone)]
pub struct RequestTicket {
    epoch: u64,
    key: CacheKey,
    cancel: CancellationToken,
}

impl RequestTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Cancelled once another key becomes current
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

struct Inner {
    epoch: u64,
    current: Option<CacheKey>,
    foreground: CancellationToken,
    region: Option<Region>,
    sweep: CancellationToken,
}

pub struct SyncState {
    inner: Mutex<Inner>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch: 0,
                current: None,
                foreground: CancellationToken::new(),
                region: None,
                sweep: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `key` as current and return the caller's ticket
    ///
    /// Re-issuing the current key joins the existing generation. A different
    /// key starts a new generation and cancels the previous foreground token;
    /// a different region also cancels the running prefetch sweep.
    pub fn begin(&self, key: &CacheKey, region: Region) -> RequestTicket {
        let mut inner = self.lock();

        if inner.current.as_ref() != Some(key) {
            inner.epoch += 1;
            inner.foreground.cancel();
            inner.foreground = CancellationToken::new();
            inner.current = Some(key.clone());
        }

        if inner.region != Some(region) {
            if inner.region.is_some() {
                tracing::debug!(region = %region, "Region changed, cancelling prefetch sweep");
            }
            inner.sweep.cancel();
            inner.sweep = CancellationToken::new();
            inner.region = Some(region);
        }

        RequestTicket {
            epoch: inner.epoch,
            key: key.clone(),
            cancel: inner.foreground.clone(),
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.is_current_epoch(ticket.epoch)
    }

    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    pub fn current_key(&self) -> Option<CacheKey> {
        self.lock().current.clone()
    }

    pub fn current_region(&self) -> Option<Region> {
        self.lock().region
    }

    /// Token for the sweep belonging to the current region
    pub fn sweep_token(&self) -> CancellationToken {
        self.lock().sweep.clone()
    }
}
