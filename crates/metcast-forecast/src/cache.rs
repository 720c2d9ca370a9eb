//! Single-entry, time-bounded snapshot cache.
//!
//! The snapshot is stored as JSON under [`CACHE_KEY`] and its capture time
//! as decimal epoch milliseconds under [`CACHE_TIMESTAMP_KEY`]. An entry is
//! usable only while `now - captured_at < ttl`; past that it is treated as
//! absent even though it may still be stored.

use std::sync::Arc;

use metcast_core::StorageError;

use crate::clock::{Clock, SystemClock};
use crate::store::KeyValueStore;
use crate::types::ForecastSnapshot;

pub const CACHE_KEY: &str = "tt_weather_cache";
pub const CACHE_TIMESTAMP_KEY: &str = "tt_weather_cache_timestamp";

/// 30 minutes
pub const DEFAULT_TTL_MILLIS: i64 = 30 * 60 * 1000;

/// A stored snapshot together with the moment it was captured
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub snapshot: ForecastSnapshot,
    pub captured_at_millis: i64,
}

impl CacheEntry {
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.captured_at_millis)
    }

    pub fn is_valid(&self, now_millis: i64, ttl_millis: i64) -> bool {
        self.age_millis(now_millis) < ttl_millis
    }
}

#[derive(Clone)]
pub struct ForecastCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl std::fmt::Debug for ForecastCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastCache")
            .field("clock", &self.clock)
            .field("ttl_millis", &self.ttl_millis)
            .finish_non_exhaustive()
    }
}

impl ForecastCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), DEFAULT_TTL_MILLIS)
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl_millis: i64) -> Self {
        Self {
            store,
            clock,
            ttl_millis,
        }
    }

    pub fn ttl_millis(&self) -> i64 {
        self.ttl_millis
    }

    /// Replace the cached snapshot, stamping it with the current time.
    pub fn store(&self, snapshot: &ForecastSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        let captured_at = self.clock.now_millis();

        // Timestamp goes first and comes back last: an interrupted write
        // leaves no timestamp, which reads as no entry.
        self.store.remove(CACHE_TIMESTAMP_KEY)?;
        self.store.set(CACHE_KEY, &json)?;
        self.store.set(CACHE_TIMESTAMP_KEY, &captured_at.to_string())?;

        tracing::debug!(id = %snapshot.id, captured_at, "Cached forecast snapshot");
        Ok(())
    }

    /// The stored entry regardless of age.
    ///
    /// Unreadable data is logged and reported as absent.
    pub fn entry(&self) -> Option<CacheEntry> {
        let (json, timestamp) = match (
            self.store.get(CACHE_KEY),
            self.store.get(CACHE_TIMESTAMP_KEY),
        ) {
            (Ok(Some(json)), Ok(Some(timestamp))) => (json, timestamp),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to read cached forecast: {}", e);
                return None;
            }
            _ => return None,
        };

        let captured_at_millis = match timestamp.trim().parse::<i64>() {
            Ok(ms) => ms,
            Err(e) => {
                tracing::warn!(%timestamp, "Ignoring cache entry with bad timestamp: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ForecastSnapshot>(&json) {
            Ok(snapshot) => Some(CacheEntry {
                snapshot,
                captured_at_millis,
            }),
            Err(e) => {
                tracing::warn!("Ignoring undecodable cached forecast: {}", e);
                None
            }
        }
    }

    /// The cached snapshot if it is still within its TTL.
    pub fn get(&self) -> Option<ForecastSnapshot> {
        let now = self.clock.now_millis();
        self.entry()
            .filter(|entry| entry.is_valid(now, self.ttl_millis))
            .map(|entry| entry.snapshot)
    }

    pub fn is_expired(&self) -> bool {
        self.get().is_none()
    }

    /// Remove any stored entry.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(CACHE_KEY)?;
        self.store.remove(CACHE_TIMESTAMP_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use crate::types::fixtures;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (ForecastCache, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(T0));
        let cache = ForecastCache::with_clock(store.clone(), clock.clone(), DEFAULT_TTL_MILLIS);
        (cache, store, clock)
    }

    #[test]
    fn test_empty_cache_returns_none() {
        let (cache, _, _) = setup();
        assert!(cache.get().is_none());
        assert!(cache.entry().is_none());
        assert!(cache.is_expired());
    }

    #[test]
    fn test_store_writes_both_keys() {
        let (cache, store, _) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();

        assert_eq!(
            store.get(CACHE_TIMESTAMP_KEY).unwrap().as_deref(),
            Some("1700000000000")
        );
        assert!(store.get(CACHE_KEY).unwrap().unwrap().contains("\"id\":\"a\""));
    }

    #[test]
    fn test_valid_entry_returns_exact_snapshot() {
        let (cache, _, clock) = setup();
        let snapshot = fixtures::snapshot("a");
        cache.store(&snapshot).unwrap();

        clock.advance(Duration::from_secs(29 * 60));
        assert_eq!(cache.get(), Some(snapshot));
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let (cache, _, clock) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();

        clock.set(T0 + DEFAULT_TTL_MILLIS - 1);
        assert!(cache.get().is_some());

        clock.set(T0 + DEFAULT_TTL_MILLIS);
        assert!(cache.get().is_none());

        // Still physically present
        let entry = cache.entry().unwrap();
        assert_eq!(entry.captured_at_millis, T0);
        assert_eq!(entry.age_millis(T0 + DEFAULT_TTL_MILLIS), DEFAULT_TTL_MILLIS);
    }

    #[test]
    fn test_newer_write_supersedes() {
        let (cache, _, clock) = setup();
        cache.store(&fixtures::snapshot("old")).unwrap();
        clock.advance(Duration::from_secs(40 * 60));
        cache.store(&fixtures::snapshot("new")).unwrap();

        assert_eq!(cache.get().map(|s| s.id), Some("new".to_string()));
    }

    #[test]
    fn test_get_is_idempotent() {
        let (cache, _, _) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();
        assert_eq!(cache.get(), cache.get());
    }

    #[test]
    fn test_clear_removes_entry() {
        let (cache, store, _) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();
        cache.clear().unwrap();

        assert!(cache.get().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_bad_timestamp_is_treated_as_absent() {
        let (cache, store, _) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();
        store.set(CACHE_TIMESTAMP_KEY, "yesterday").unwrap();

        assert!(cache.get().is_none());
    }

    #[test]
    fn test_corrupt_json_is_treated_as_absent() {
        let (cache, store, _) = setup();
        store.set(CACHE_KEY, "{not json").unwrap();
        store.set(CACHE_TIMESTAMP_KEY, &T0.to_string()).unwrap();

        assert!(cache.entry().is_none());
    }

    #[test]
    fn test_missing_timestamp_is_treated_as_absent() {
        let (cache, store, _) = setup();
        cache.store(&fixtures::snapshot("a")).unwrap();
        store.remove(CACHE_TIMESTAMP_KEY).unwrap();

        assert!(cache.get().is_none());
    }

    /// Store whose timestamp writes can be made to fail.
    struct FlakyTimestampStore {
        inner: MemoryStore,
        fail_timestamp: AtomicBool,
    }

    impl KeyValueStore for FlakyTimestampStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == CACHE_TIMESTAMP_KEY && self.fail_timestamp.load(Ordering::SeqCst) {
                return Err(StorageError::OperationFailed("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_interrupted_store_leaves_no_mismatched_entry() {
        let store = Arc::new(FlakyTimestampStore {
            inner: MemoryStore::new(),
            fail_timestamp: AtomicBool::new(false),
        });
        let clock = Arc::new(FixedClock::new(T0));
        let cache = ForecastCache::with_clock(store.clone(), clock.clone(), DEFAULT_TTL_MILLIS);

        cache.store(&fixtures::snapshot("old")).unwrap();
        assert_eq!(cache.get().map(|s| s.id), Some("old".to_string()));

        clock.advance(Duration::from_secs(25 * 60));
        store.fail_timestamp.store(true, Ordering::SeqCst);
        assert!(cache.store(&fixtures::snapshot("new")).is_err());

        // The new JSON must not be paired with the old capture time
        assert!(cache.entry().is_none());
        assert!(cache.get().is_none());

        store.fail_timestamp.store(false, Ordering::SeqCst);
        cache.store(&fixtures::snapshot("new")).unwrap();
        let entry = cache.entry().unwrap();
        assert_eq!(entry.snapshot.id, "new");
        assert_eq!(entry.captured_at_millis, T0 + 25 * 60 * 1000);
    }
}
