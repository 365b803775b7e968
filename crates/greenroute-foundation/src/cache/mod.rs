//! Signal cache
//!
//! Time-bounded storage of external signals (traffic, weather, air quality,
//! routes, vehicles, user preferences and model predictions) in front of an
//! injected [`SignalStore`](greenroute_kernel::storage::SignalStore).
//!
//! The cache never fails a request: store outages turn reads into misses
//! and writes into no-ops, and every store call is bounded by a timeout.

pub mod config;
pub mod keys;
pub mod memory;
pub mod metrics;
pub mod signal_cache;

pub use config::{CacheConfig, TtlTable};
pub use memory::InMemorySignalStore;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use signal_cache::{CacheStats, SignalCache};
