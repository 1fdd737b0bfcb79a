use crate::grid::RawGrid;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Error)]
#[error("failed to load fleet sheet {source_id}: {cause}")]
pub struct FetchError {
    pub source_id: String,
    #[source]
    pub cause: TransportError,
}

/// Whatever actually talks to the tabular backend. Credentials, scopes and
/// retries are the implementor's business.
pub trait GridTransport {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError>;
}

impl<T: GridTransport + ?Sized> GridTransport for Box<T> {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError> {
        (**self).fetch_grid(source_id)
    }
}

impl<T: GridTransport + ?Sized> GridTransport for Arc<T> {
    fn fetch_grid(&self, source_id: &str) -> Result<RawGrid, TransportError> {
        (**self).fetch_grid(source_id)
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct CachedGrid {
    grid: Arc<RawGrid>,
    fetched_at: Instant,
}

/// Single-slot, time-bounded cache in front of a [`GridTransport`].
///
/// The slot starts empty and is only ever replaced by a successful fetch, so
/// a failed refresh leaves the last good grid in place. The lock is held
/// across the transport call: concurrent refreshes queue up rather than race.
pub struct FleetDataSource<T, C = SystemClock> {
    source_id: String,
    transport: T,
    clock: C,
    freshness: Duration,
    slot: Mutex<Option<CachedGrid>>,
}

impl<T: GridTransport> FleetDataSource<T, SystemClock> {
    pub fn new(source_id: impl Into<String>, transport: T) -> Self {
        Self::with_clock(source_id, transport, SystemClock)
    }
}

impl<T: GridTransport, C: Clock> FleetDataSource<T, C> {
    pub fn with_clock(source_id: impl Into<String>, transport: T, clock: C) -> Self {
        Self {
            source_id: source_id.into(),
            transport,
            clock,
            freshness: DEFAULT_FRESHNESS,
            slot: Mutex::new(None),
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub fn fetch(&self, force_refresh: bool) -> Result<Arc<RawGrid>, FetchError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if !force_refresh {
            if let Some(cached) = slot.as_ref() {
                let age = self.clock.now().saturating_duration_since(cached.fetched_at);
                if age < self.freshness {
                    debug!(
                        source_id = %self.source_id,
                        age_ms = age.as_millis() as u64,
                        "fleet_grid_cache_hit"
                    );
                    return Ok(Arc::clone(&cached.grid));
                }
            }
        }

        match self.transport.fetch_grid(&self.source_id) {
            Ok(grid) => {
                let grid = Arc::new(grid);
                *slot = Some(CachedGrid {
                    grid: Arc::clone(&grid),
                    fetched_at: self.clock.now(),
                });
                info!(
                    source_id = %self.source_id,
                    rows = grid.len(),
                    forced = force_refresh,
                    "fleet_grid_fetched"
                );
                Ok(grid)
            }
            Err(cause) => {
                warn!(
                    source_id = %self.source_id,
                    forced = force_refresh,
                    error = %cause,
                    "fleet_grid_fetch_failed"
                );
                Err(FetchError {
                    source_id: self.source_id.clone(),
                    cause,
                })
            }
        }
    }

    /// Manual refresh: always goes to the transport.
    pub fn refresh(&self) -> Result<Arc<RawGrid>, FetchError> {
        self.fetch(true)
    }

    pub fn cached_age(&self) -> Option<Duration> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .map(|cached| self.clock.now().saturating_duration_since(cached.fetched_at))
    }
}
