//! Calendar synchronization cache
//!
//! Turns single-month requests into a cache-first pipeline:
//! - cache hit returns immediately with no network call
//! - at most one fetch per key is in flight; later callers join it
//! - results of superseded foreground requests are neither written nor delivered
//! - a capacity fault on write clears the namespace and retries once
//! - each foreground fetch that reached the network schedules a prefetch sweep

mod key;
mod prefetch;
mod state;

pub use key::{CacheKey, NO_LOCATION_TOKEN};
pub use prefetch::PrefetchStatus;
pub use state::{RequestTicket, SyncState};

use crate::enrichment::{merge, EnrichmentError, EnrichmentProvider, SkeletonMonth};
use crate::store::{AlmanacStore, StoreError};
use futures::future::{BoxFuture, FutureExt, Shared};
use panchang_common::config::SyncConfig;
use panchang_common::engine;
use panchang_common::events::{EventBus, LoadSource, SyncEvent};
use panchang_common::{AlmanacMonth, GeoCoordinate, MonthRequest, Region};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sync errors visible to callers
#[derive(Debug, Error)]
pub enum SyncError {
    /// Enrichment failed while the request was still current
    #[error("Sync failed for {year}-{month:02}: {reason}")]
    SyncFailed { year: i32, month: u32, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Store failure on an explicit operation (reset)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<panchang_common::Error> for SyncError {
    fn from(err: panchang_common::Error) -> Self {
        SyncError::InvalidRequest(err.to_string())
    }
}

/// Result of a foreground request
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Loaded {
        month: Arc<AlmanacMonth>,
        source: LoadSource,
    },
    /// Another request became current before this one resolved
    Superseded,
}

impl SyncOutcome {
    pub fn month(&self) -> Option<&Arc<AlmanacMonth>> {
        match self {
            SyncOutcome::Loaded { month, .. } => Some(month),
            SyncOutcome::Superseded => None,
        }
    }
}

/// Tunables for a [`SyncCache`]
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub namespace: String,
    /// 0 disables the prefetch sweep
    pub prefetch_radius_months: u32,
    pub prefetch_throttle: Duration,
    pub utc_offset_minutes: i32,
    /// Computation location for requests without one
    pub default_location: GeoCoordinate,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let config = SyncConfig::default();
        Self {
            namespace: config.namespace,
            prefetch_radius_months: config.prefetch_radius_months,
            prefetch_throttle: Duration::from_millis(config.prefetch_throttle_ms),
            utc_offset_minutes: config.utc_offset_minutes,
            default_location: GeoCoordinate::reference(),
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &SyncConfig) -> panchang_common::Result<Self> {
        Ok(Self {
            namespace: config.namespace.clone(),
            prefetch_radius_months: config.prefetch_radius_months,
            prefetch_throttle: Duration::from_millis(config.prefetch_throttle_ms),
            utc_offset_minutes: config.utc_offset_minutes,
            default_location: config.default_location()?,
        })
    }
}

#[derive(Debug, Clone)]
enum FetchFailure {
    /// Foreground result no longer current; nothing written
    Stale,
    Cancelled,
    Failed(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Stale => f.write_str("superseded"),
            FetchFailure::Cancelled => f.write_str("cancelled"),
            FetchFailure::Failed(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FetchOrigin {
    /// Only persisted while this generation is current
    Foreground { epoch: u64 },
    /// Persisted unconditionally under its own key
    Prefetch,
}

type FetchResult = Result<Arc<AlmanacMonth>, FetchFailure>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct Flight {
    id: u64,
    cancel: CancellationToken,
    fetch: SharedFetch,
}

struct Inner {
    store: Arc<dyn AlmanacStore>,
    provider: RwLock<Arc<dyn EnrichmentProvider>>,
    events: EventBus,
    settings: SyncSettings,
    state: SyncState,
    in_flight: Mutex<HashMap<CacheKey, Flight>>,
    next_flight_id: AtomicU64,
    sweep_lock: Arc<tokio::sync::Mutex<()>>,
    /// Cancellation token of the sweep holding `sweep_lock`
    running_sweep: Mutex<Option<CancellationToken>>,
    /// Anchor of a sweep queued behind a cancelled one
    pending_sweep: Mutex<Option<MonthRequest>>,
    prefetch_status: Mutex<PrefetchStatus>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cache-first month loader shared by every request of one session
///
/// Cloning shares state.
#[derive(Clone)]
pub struct SyncCache {
    inner: Arc<Inner>,
}

impl SyncCache {
    pub fn new(
        store: Arc<dyn AlmanacStore>,
        provider: Arc<dyn EnrichmentProvider>,
        events: EventBus,
        settings: SyncSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                provider: RwLock::new(provider),
                events,
                settings,
                state: SyncState::new(),
                in_flight: Mutex::new(HashMap::new()),
                next_flight_id: AtomicU64::new(1),
                sweep_lock: Arc::new(tokio::sync::Mutex::new(())),
                running_sweep: Mutex::new(None),
                pending_sweep: Mutex::new(None),
                prefetch_status: Mutex::new(PrefetchStatus::default()),
            }),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn key_for(&self, request: &MonthRequest) -> CacheKey {
        CacheKey::for_request(&self.inner.settings.namespace, request)
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.provider().name()
    }

    /// Swap the enrichment provider; fetches already running keep the old one
    pub fn replace_provider(&self, provider: Arc<dyn EnrichmentProvider>) {
        info!(provider = provider.name(), "Enrichment provider replaced");
        *self
            .inner
            .provider
            .write()
            .unwrap_or_else(PoisonError::into_inner) = provider;
    }

    /// Build and load a request in one step
    pub async fn request(
        &self,
        year: i32,
        month: u32,
        region: Region,
        location: Option<GeoCoordinate>,
        force: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let request = MonthRequest::new(year, month, region)?
            .with_location(location)
            .forced(force);
        self.load(request).await
    }

    /// Load one month, cache first
    ///
    /// Returns [`SyncOutcome::Superseded`] when a request for a different key
    /// was issued before this one resolved. Errors only when enrichment failed
    /// and this request is still current.
    pub async fn load(&self, request: MonthRequest) -> Result<SyncOutcome, SyncError> {
        let inner = &self.inner;
        let key = self.key_for(&request);
        let ticket = inner.state.begin(&key, request.region);

        if !request.force {
            match inner.store.get(&key).await {
                Ok(Some(month)) => {
                    if !inner.state.is_current(&ticket) {
                        return Ok(inner.discard_stale(&key));
                    }
                    debug!(key = %key, "Cache hit");
                    inner.emit(SyncEvent::MonthLoaded {
                        key: key.to_string(),
                        source: LoadSource::Cache,
                        timestamp: chrono::Utc::now(),
                    });
                    return Ok(SyncOutcome::Loaded {
                        month: Arc::new(month),
                        source: LoadSource::Cache,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Cache read failed, treating as miss"),
            }
        }

        let (fetch, started) = inner.join_or_start(
            &key,
            request,
            FetchOrigin::Foreground {
                epoch: ticket.epoch(),
            },
            ticket.cancel_token().clone(),
        );
        let result = fetch.await;

        if !inner.state.is_current(&ticket) {
            return Ok(inner.discard_stale(&key));
        }

        match result {
            Ok(month) => {
                info!(
                    key = %key,
                    year = request.year,
                    month = request.month,
                    region = %request.region,
                    "Month synced"
                );
                inner.emit(SyncEvent::MonthLoaded {
                    key: key.to_string(),
                    source: LoadSource::Network,
                    timestamp: chrono::Utc::now(),
                });
                if started {
                    self.spawn_prefetch(request);
                }
                Ok(SyncOutcome::Loaded {
                    month,
                    source: LoadSource::Network,
                })
            }
            Err(failure) => {
                let reason = failure.to_string();
                warn!(key = %key, reason = %reason, "Sync failed");
                inner.emit(SyncEvent::SyncFailed {
                    key: key.to_string(),
                    year: request.year,
                    month: request.month,
                    reason: reason.clone(),
                    timestamp: chrono::Utc::now(),
                });
                Err(SyncError::SyncFailed {
                    year: request.year,
                    month: request.month,
                    reason,
                })
            }
        }
    }

    /// Cached month for `request`, if any
    ///
    /// Read-only with respect to sync state: the current request, in-flight
    /// fetches and the prefetch sweep are untouched, and nothing is fetched.
    pub async fn cached(&self, request: &MonthRequest) -> Result<Option<AlmanacMonth>, SyncError> {
        let key = self.key_for(request);
        Ok(self.inner.store.get(&key).await?)
    }

    /// Clear every entry in this cache's namespace
    pub async fn reset(&self) -> Result<u64, SyncError> {
        let namespace = &self.inner.settings.namespace;
        let removed = self.inner.store.clear(namespace).await?;
        info!(namespace = %namespace, removed, "Cache reset");
        self.inner.emit(SyncEvent::CacheCleared {
            namespace: namespace.clone(),
            removed,
            eviction: false,
            timestamp: chrono::Utc::now(),
        });
        Ok(removed)
    }

    /// Number of fetches currently in flight
    pub fn in_flight_count(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }
}

impl Inner {
    fn provider(&self) -> Arc<dyn EnrichmentProvider> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn emit(&self, event: SyncEvent) {
        self.events.emit_lossy(event);
    }

    fn discard_stale(&self, key: &CacheKey) -> SyncOutcome {
        debug!(key = %key, "Discarding superseded result");
        self.emit(SyncEvent::StaleDiscarded {
            key: key.to_string(),
            timestamp: chrono::Utc::now(),
        });
        SyncOutcome::Superseded
    }

    /// Join the live fetch for `key`, or start one
    ///
    /// Returns the shared fetch and whether this call started it. A flight
    /// whose token was cancelled is never joined.
    fn join_or_start(
        self: &Arc<Self>,
        key: &CacheKey,
        request: MonthRequest,
        origin: FetchOrigin,
        cancel: CancellationToken,
    ) -> (SharedFetch, bool) {
        let mut flights = lock(&self.in_flight);

        if let Some(flight) = flights.get(key) {
            if !flight.cancel.is_cancelled() {
                debug!(key = %key, "Joining in-flight fetch");
                return (flight.fetch.clone(), false);
            }
        }

        let id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(self);
        let task_key = key.clone();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let result = inner.fetch(&task_key, request, origin, task_cancel).await;
            inner.finish_flight(&task_key, id);
            result
        });

        let fetch = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(FetchFailure::Failed(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared();

        flights.insert(
            key.clone(),
            Flight {
                id,
                cancel,
                fetch: fetch.clone(),
            },
        );
        (fetch, true)
    }

    fn finish_flight(&self, key: &CacheKey, id: u64) {
        let mut flights = lock(&self.in_flight);
        if flights.get(key).is_some_and(|f| f.id == id) {
            flights.remove(key);
        }
    }

    /// Compute, enrich, merge and persist one month
    async fn fetch(
        &self,
        key: &CacheKey,
        request: MonthRequest,
        origin: FetchOrigin,
        cancel: CancellationToken,
    ) -> FetchResult {
        let location = request.resolved_location(self.settings.default_location);
        let skeleton = SkeletonMonth {
            year: request.year,
            month: request.month,
            region: request.region,
            days: engine::skeleton_month(
                request.year,
                request.month,
                request.region,
                location,
                self.settings.utc_offset_minutes,
            ),
        };

        let provider = self.provider();
        debug!(key = %key, provider = provider.name(), "Fetching month");

        let enriched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EnrichmentError::Cancelled),
            result = provider.enrich(&skeleton) => result.and_then(|payload| merge(&skeleton, payload)),
        };

        let month = match enriched {
            Ok(month) => month,
            Err(EnrichmentError::Cancelled) => {
                debug!(key = %key, "Enrichment call abandoned");
                return Err(FetchFailure::Cancelled);
            }
            Err(e) => return Err(FetchFailure::Failed(e.to_string())),
        };

        if !month.is_complete() {
            return Err(FetchFailure::Failed(format!(
                "incomplete month: {} days",
                month.days.len()
            )));
        }

        if let FetchOrigin::Foreground { epoch } = origin {
            if !self.state.is_current_epoch(epoch) {
                return Err(FetchFailure::Stale);
            }
        }

        self.persist(key, &month).await;
        Ok(Arc::new(month))
    }

    /// Best-effort write with one evict-and-retry on a capacity fault
    async fn persist(&self, key: &CacheKey, month: &AlmanacMonth) {
        match self.store.put(key, month).await {
            Ok(()) => return,
            Err(StoreError::CapacityExceeded) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed, continuing uncached");
                return;
            }
        }

        let namespace = key.namespace();
        warn!(key = %key, namespace = %namespace, "Store full, evicting namespace");
        match self.store.clear(namespace).await {
            Ok(removed) => self.emit(SyncEvent::CacheCleared {
                namespace: namespace.to_string(),
                removed,
                eviction: true,
                timestamp: chrono::Utc::now(),
            }),
            Err(e) => warn!(namespace = %namespace, error = %e, "Eviction failed"),
        }

        if let Err(e) = self.store.put(key, month).await {
            warn!(key = %key, error = %e, "Cache write retry failed, continuing uncached");
        }
    }
}
