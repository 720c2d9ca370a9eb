//! Network-first forecast access with an offline fallback.
//!
//! Every fetch goes to the network. On success the snapshot replaces the
//! cached one; on failure a still-valid cached snapshot is served as if the
//! fetch had succeeded, and only when none exists does the state become
//! [`FetchState::Failed`].
//!
//! Overlapping fetches are not queued. Each fetch takes a ticket when it
//! starts and only commits its terminal state if no newer fetch has started
//! since, so the most recently triggered fetch decides what is shown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metcast_core::{Config, ForecastError, NetworkError, StorageError};
use parking_lot::Mutex;

use crate::cache::ForecastCache;
use crate::clock::Clock;
use crate::provider::ForecastProvider;
use crate::store::KeyValueStore;
use crate::types::{FetchState, ForecastSnapshot};

#[derive(Debug)]
pub struct ForecastRepository {
    provider: ForecastProvider,
    cache: ForecastCache,
    state: Mutex<FetchState>,
    latest_ticket: AtomicU64,
}

impl ForecastRepository {
    pub fn new(provider: ForecastProvider, cache: ForecastCache) -> Self {
        Self {
            provider,
            cache,
            state: Mutex::new(FetchState::Idle),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Build a repository from application config on top of the given store.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NetworkError> {
        let provider = ForecastProvider::from_config(&config.forecast)?;
        let cache = ForecastCache::with_clock(store, clock, config.forecast.cache_ttl_millis());
        Ok(Self::new(provider, cache))
    }

    /// Current state, for rendering.
    pub fn state(&self) -> FetchState {
        self.state.lock().clone()
    }

    /// Fetch the bulletin, falling back to a valid cached snapshot.
    ///
    /// Enters `Loading` (or `Refreshing` when `force_refresh`) before any I/O.
    /// Returns this fetch's own outcome, which is only reflected in
    /// [`state`](Self::state) if no newer fetch started in the meantime.
    pub async fn fetch(&self, force_refresh: bool) -> FetchState {
        self.fetch_tracked(force_refresh).await.0
    }

    /// Like [`fetch`](Self::fetch), also reporting whether the outcome was
    /// committed (`false` when a newer fetch superseded this one).
    pub async fn fetch_tracked(&self, force_refresh: bool) -> (FetchState, bool) {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        *self.state.lock() = if force_refresh {
            FetchState::Refreshing
        } else {
            FetchState::Loading
        };

        let outcome = match self.provider.fetch().await {
            Ok(snapshot) => {
                tracing::info!(id = %snapshot.id, issued = %snapshot.issue_time, "Fetched forecast");
                if self.is_current(ticket) {
                    if let Err(e) = self.write_cache(snapshot.clone()).await {
                        tracing::warn!("Failed to cache forecast: {}", e);
                    }
                } else {
                    tracing::debug!(ticket, "Not caching result of superseded fetch");
                }
                FetchState::Ready(snapshot)
            }
            Err(network_err) => {
                tracing::warn!("Forecast fetch failed: {}", network_err);
                match self.read_valid_cache().await {
                    Ok(snapshot) => {
                        tracing::info!(id = %snapshot.id, "Serving cached forecast while offline");
                        FetchState::Ready(snapshot)
                    }
                    Err(miss) => {
                        tracing::debug!("{}", miss);
                        let err = ForecastError::NetworkUnavailable(network_err.to_string());
                        tracing::error!("{}", err);
                        FetchState::Failed {
                            reason: err.to_string(),
                            last_known: None,
                        }
                    }
                }
            }
        };

        let committed = self.commit(ticket, &outcome);
        (outcome, committed)
    }

    /// User retry after a failure.
    pub async fn retry(&self) -> FetchState {
        self.fetch(true).await
    }

    /// Valid cached snapshot, without touching the network.
    pub fn get_cached(&self) -> Option<ForecastSnapshot> {
        self.cache.get()
    }

    /// Drop the cached snapshot.
    pub fn invalidate_cache(&self) -> Result<(), StorageError> {
        tracing::info!("Invalidating forecast cache");
        self.cache.clear()
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest_ticket.load(Ordering::SeqCst) == ticket
    }

    fn commit(&self, ticket: u64, outcome: &FetchState) -> bool {
        let mut state = self.state.lock();
        if self.is_current(ticket) {
            *state = outcome.clone();
            true
        } else {
            tracing::debug!(ticket, "Discarding result of superseded fetch");
            false
        }
    }

    async fn write_cache(&self, snapshot: ForecastSnapshot) -> Result<(), StorageError> {
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || cache.store(&snapshot))
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }

    /// A cache read that cannot complete counts as a miss.
    async fn read_valid_cache(&self) -> Result<ForecastSnapshot, ForecastError> {
        let cache = self.cache.clone();
        match tokio::task::spawn_blocking(move || cache.get()).await {
            Ok(cached) => cached.ok_or(ForecastError::CacheMiss),
            Err(e) => {
                tracing::warn!("Cache read task failed: {}", e);
                Err(ForecastError::CacheMiss)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::cache::DEFAULT_TTL_MILLIS;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use crate::types::fixtures;
    use std::time::Duration;

    /// Nothing listens on the discard port, so every request fails fast.
    fn unreachable_repository() -> (ForecastRepository, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_700_000_000_000));
        let provider =
            ForecastProvider::new("http://127.0.0.1:9/api/forecasts", Duration::from_secs(2))
                .unwrap();
        let cache = ForecastCache::with_clock(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            DEFAULT_TTL_MILLIS,
        );
        (ForecastRepository::new(provider, cache), clock)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (repo, _) = unreachable_repository();
        assert_eq!(repo.state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_fails() {
        let (repo, _) = unreachable_repository();
        let state = repo.fetch(false).await;

        match &state {
            FetchState::Failed { reason, last_known } => {
                assert!(reason.contains("Could not connect to weather service"));
                assert!(last_known.is_none());
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(repo.state(), state);
    }

    #[tokio::test]
    async fn test_network_failure_serves_valid_cache() {
        let (repo, _) = unreachable_repository();
        repo.cache.store(&fixtures::snapshot("cached")).unwrap();

        let state = repo.fetch(false).await;
        assert_eq!(state, FetchState::Ready(fixtures::snapshot("cached")));
    }

    #[tokio::test]
    async fn test_network_failure_ignores_expired_cache() {
        let (repo, clock) = unreachable_repository();
        repo.cache.store(&fixtures::snapshot("stale")).unwrap();
        clock.advance(Duration::from_secs(31 * 60));

        assert!(matches!(repo.fetch(true).await, FetchState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_commit() {
        let (repo, _) = unreachable_repository();
        repo.cache.store(&fixtures::snapshot("cached")).unwrap();

        // A newer fetch has started since ticket 1 was issued
        repo.latest_ticket.store(5, Ordering::SeqCst);
        *repo.state.lock() = FetchState::Refreshing;
        assert!(!repo.commit(1, &FetchState::Ready(fixtures::snapshot("old"))));

        assert_eq!(repo.state(), FetchState::Refreshing);
    }

    #[tokio::test]
    async fn test_fetch_tracked_reports_commit() {
        let (repo, _) = unreachable_repository();
        let (state, committed) = repo.fetch_tracked(false).await;
        assert!(committed);
        assert_eq!(repo.state(), state);
    }

    #[test]
    fn test_from_config_reports_construction_errors_as_network_errors() {
        let config = Config::default();
        let result: Result<ForecastRepository, NetworkError> = ForecastRepository::from_config(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::new(0)),
        );
        let repo = result.unwrap();
        assert_eq!(repo.state(), FetchState::Idle);
    }

    #[test]
    fn test_invalidate_cache() {
        let (repo, _) = unreachable_repository();
        repo.cache.store(&fixtures::snapshot("a")).unwrap();
        assert!(repo.get_cached().is_some());

        repo.invalidate_cache().unwrap();
        assert!(repo.get_cached().is_none());
    }
}
