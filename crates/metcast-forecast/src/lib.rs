//! Forecast bulletin retrieval for metcast
//!
//! Fetches the published bulletin over HTTP and keeps a single
//! time-bounded snapshot in a local key-value store so the last good
//! forecast survives network outages.

pub mod cache;
pub mod clock;
pub mod provider;
pub mod repository;
pub mod service;
pub mod store;
pub mod types;

pub use cache::{CacheEntry, ForecastCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use provider::ForecastProvider;
pub use repository::ForecastRepository;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::*;
