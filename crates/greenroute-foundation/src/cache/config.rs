//! Signal cache configuration
//!
//! Per-category expiry table and store call timeout.

use greenroute_kernel::SignalCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Category → time-to-live table, in milliseconds.
///
/// A category missing from the table is cached without expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TtlTable {
    millis: HashMap<SignalCategory, u64>,
}

impl Default for TtlTable {
    fn default() -> Self {
        Self::empty()
            .with(SignalCategory::Traffic, Duration::from_secs(5 * 60))
            .with(SignalCategory::Weather, Duration::from_secs(30 * 60))
            .with(SignalCategory::AirQuality, Duration::from_secs(15 * 60))
            .with(SignalCategory::Route, Duration::from_secs(60 * 60))
            .with(SignalCategory::Vehicle, Duration::from_secs(12 * 60 * 60))
            .with(SignalCategory::UserPreferences, Duration::from_secs(24 * 60 * 60))
            .with(SignalCategory::MlPrediction, Duration::from_secs(10 * 60))
    }
}

impl TtlTable {
    /// A table with no entries: nothing expires.
    pub fn empty() -> Self {
        Self {
            millis: HashMap::new(),
        }
    }

    /// Set the TTL for a category
    pub fn with(mut self, category: SignalCategory, ttl: Duration) -> Self {
        self.millis.insert(category, ttl.as_millis() as u64);
        self
    }

    /// Remove a category so its entries never expire
    pub fn without(mut self, category: SignalCategory) -> Self {
        self.millis.remove(&category);
        self
    }

    pub fn get(&self, category: SignalCategory) -> Option<Duration> {
        self.millis.get(&category).map(|ms| Duration::from_millis(*ms))
    }
}

/// Configuration for a [`SignalCache`](super::SignalCache)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on every store round trip, in milliseconds
    pub op_timeout_ms: u64,
    /// Default expiry per category
    pub ttl: TtlTable,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: 500,
            ttl: TtlTable::default(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_ttl_table(mut self, ttl: TtlTable) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}
