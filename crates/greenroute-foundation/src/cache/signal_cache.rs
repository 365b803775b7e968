use super::config::CacheConfig;
use super::keys::{area_patterns, category_key, compose, location_key, segment_key};
use super::metrics::{CacheMetrics, CacheMetricsSnapshot};
use greenroute_kernel::storage::SignalStore;
use greenroute_kernel::{
    AirQualitySnapshot, EngineResult, Location, Signal, SignalCategory, TrafficSnapshot,
    WeatherSnapshot,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Snapshot returned by [`SignalCache::stats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Percentage of lookups served from the cache
    pub hit_rate: f64,
    pub total_keys: u64,
    pub used_memory_bytes: u64,
    pub peak_memory_bytes: u64,
    pub counters: CacheMetricsSnapshot,
}

/// Fail-open cache of external signals
///
/// Wraps an injected [`SignalStore`] handle with per-category expiry, a
/// timeout on every store call and JSON (de)serialization of [`Signal`]
/// envelopes. Store failures never reach the caller: reads degrade to a
/// miss and writes are dropped, both with a logged warning.
pub struct SignalCache {
    store: Arc<dyn SignalStore>,
    config: CacheConfig,
    metrics: CacheMetrics,
    open: AtomicBool,
}

impl SignalCache {
    /// Open the cache over a store handle.
    ///
    /// An unreachable store is logged; the cache still opens and serves
    /// misses until the store recovers.
    pub async fn open(store: Arc<dyn SignalStore>, config: CacheConfig) -> Self {
        let cache = Self {
            store,
            config,
            metrics: CacheMetrics::new(),
            open: AtomicBool::new(true),
        };
        if cache.guarded("ping", "-", cache.store.ping()).await.is_some() {
            info!("Signal cache opened (timeout {:?})", cache.config.op_timeout());
        }
        cache
    }

    /// Close the store handle. Later operations are misses and no-ops.
    pub async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.store.close().await {
                warn!("Signal store close failed: {}", e);
            }
            info!("Signal cache closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run a store call under the timeout, mapping any failure to `None`.
    async fn guarded<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = EngineResult<T>>,
    ) -> Option<T> {
        if !self.is_open() {
            debug!("Signal cache closed, skipping {} {}", op, key);
            return None;
        }
        match tokio::time::timeout(self.config.op_timeout(), call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                self.metrics.record_error();
                warn!("Signal cache {} failed for {}: {}", op, key, e);
                None
            }
            Err(_) => {
                self.metrics.record_timeout();
                warn!(
                    "Signal cache {} timed out after {:?} for {}",
                    op,
                    self.config.op_timeout(),
                    key
                );
                None
            }
        }
    }

    /// Look up the full signal envelope.
    pub async fn get_signal(&self, category: SignalCategory, key: &str) -> Option<Signal> {
        let signal = self.fetch(category, key).await?;
        self.metrics.record_hit();
        Some(signal)
    }

    /// Read and decode the envelope. Records misses; hits are left to the caller.
    async fn fetch(&self, category: SignalCategory, key: &str) -> Option<Signal> {
        let full_key = category_key(category, key);
        let Some(entry) = self.guarded("get", &full_key, self.store.get(&full_key)).await.flatten()
        else {
            self.metrics.record_miss();
            return None;
        };

        if entry.is_expired_at(Instant::now()) {
            debug!("Signal {} past expiry, treating as miss", full_key);
            self.metrics.record_miss();
            return None;
        }

        match serde_json::from_str::<Signal>(&entry.payload) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!("Discarding unreadable signal {}: {}", full_key, e);
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Look up a payload; `None` on miss, expiry or store failure.
    pub async fn get(&self, category: SignalCategory, key: &str) -> Option<serde_json::Value> {
        self.get_signal(category, key).await.map(|s| s.payload)
    }

    /// Look up and decode a typed payload.
    pub async fn get_as<T: DeserializeOwned>(&self, category: SignalCategory, key: &str) -> Option<T> {
        let signal = self.fetch(category, key).await?;
        match serde_json::from_value(signal.payload) {
            Ok(value) => {
                self.metrics.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!("Cached {} payload for {} has unexpected shape: {}", category, key, e);
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Store a payload. `ttl` overrides the category default.
    pub async fn set(
        &self,
        category: SignalCategory,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) {
        let full_key = category_key(category, key);
        let ttl = ttl.or_else(|| self.config.ttl.get(category));
        let signal = Signal::new(category, key, value);
        let payload = match serde_json::to_string(&signal) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot serialize signal {}: {}", full_key, e);
                return;
            }
        };
        self.guarded("set", &full_key, self.store.set(&full_key, payload, ttl))
            .await;
    }

    /// Encode and store a typed payload.
    pub async fn set_as<T: Serialize>(
        &self,
        category: SignalCategory,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(category, key, value, ttl).await,
            Err(e) => warn!("Cannot encode {} payload for {}: {}", category, key, e),
        }
    }

    /// Remove one entry; `true` when something was deleted.
    pub async fn delete(&self, category: SignalCategory, key: &str) -> bool {
        let full_key = category_key(category, key);
        self.guarded("delete", &full_key, self.store.delete(&full_key))
            .await
            .unwrap_or(false)
    }

    /// Remove every key matching a glob over full keys; returns the count.
    pub async fn clear_matching(&self, pattern: &str) -> usize {
        let Some(keys) = self.guarded("keys", pattern, self.store.keys(pattern)).await else {
            return 0;
        };
        let mut removed = 0;
        for key in keys {
            if self
                .guarded("delete", &key, self.store.delete(&key))
                .await
                .unwrap_or(false)
            {
                removed += 1;
            }
        }
        debug!("Cleared {} signal(s) matching {}", removed, pattern);
        removed
    }

    /// Remove everything.
    pub async fn clear_all(&self) {
        self.guarded("flush", "*", self.store.flush()).await;
    }

    /// Hit rate, key count and memory usage.
    pub async fn stats(&self) -> CacheStats {
        let info = self
            .guarded("info", "-", self.store.info())
            .await
            .unwrap_or_default();
        let counters = self.metrics.snapshot();
        CacheStats {
            hit_rate: counters.hit_rate,
            total_keys: info.total_keys,
            used_memory_bytes: info.used_memory_bytes,
            peak_memory_bytes: info.peak_memory_bytes,
            counters,
        }
    }

    // ------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------

    pub async fn weather(&self, at: &Location) -> Option<WeatherSnapshot> {
        self.get_as(SignalCategory::Weather, &location_key(at)).await
    }

    pub async fn set_weather(&self, at: &Location, weather: &WeatherSnapshot) {
        self.set_as(SignalCategory::Weather, &location_key(at), weather, None)
            .await
    }

    pub async fn air_quality(&self, at: &Location) -> Option<AirQualitySnapshot> {
        self.get_as(SignalCategory::AirQuality, &location_key(at)).await
    }

    pub async fn set_air_quality(&self, at: &Location, aq: &AirQualitySnapshot) {
        self.set_as(SignalCategory::AirQuality, &location_key(at), aq, None)
            .await
    }

    pub async fn traffic(&self, from: &Location, to: &Location) -> Option<TrafficSnapshot> {
        self.get_as(SignalCategory::Traffic, &segment_key(from, to)).await
    }

    pub async fn set_traffic(&self, from: &Location, to: &Location, traffic: &TrafficSnapshot) {
        self.set_as(SignalCategory::Traffic, &segment_key(from, to), traffic, None)
            .await
    }

    pub async fn route<T: DeserializeOwned>(&self, from: &Location, to: &Location) -> Option<T> {
        self.get_as(SignalCategory::Route, &segment_key(from, to)).await
    }

    pub async fn set_route<T: Serialize>(&self, from: &Location, to: &Location, route: &T) {
        self.set_as(SignalCategory::Route, &segment_key(from, to), route, None)
            .await
    }

    pub async fn invalidate_route(&self, from: &Location, to: &Location) -> bool {
        self.delete(SignalCategory::Route, &segment_key(from, to)).await
    }

    pub async fn vehicle<T: DeserializeOwned>(&self, vehicle_id: &str) -> Option<T> {
        self.get_as(SignalCategory::Vehicle, vehicle_id).await
    }

    pub async fn set_vehicle<T: Serialize>(&self, vehicle_id: &str, vehicle: &T) {
        self.set_as(SignalCategory::Vehicle, vehicle_id, vehicle, None)
            .await
    }

    pub async fn user_preferences<T: DeserializeOwned>(&self, user_id: &str) -> Option<T> {
        self.get_as(SignalCategory::UserPreferences, user_id).await
    }

    pub async fn set_user_preferences<T: Serialize>(&self, user_id: &str, preferences: &T) {
        self.set_as(SignalCategory::UserPreferences, user_id, preferences, None)
            .await
    }

    /// Cached prediction for a model revision and feature hash.
    pub async fn ml_prediction<T: DeserializeOwned>(&self, revision: Uuid, feature_hash: &str) -> Option<T> {
        let key = compose(&[&revision.simple().to_string(), feature_hash]);
        self.get_as(SignalCategory::MlPrediction, &key).await
    }

    pub async fn set_ml_prediction<T: Serialize>(&self, revision: Uuid, feature_hash: &str, prediction: &T) {
        let key = compose(&[&revision.simple().to_string(), feature_hash]);
        self.set_as(SignalCategory::MlPrediction, &key, prediction, None)
            .await
    }

    /// Drop every entry mentioning the coordinate, in every category.
    ///
    /// Approximate: matches on the rendered coordinate, not on distance.
    pub async fn invalidate_area(&self, at: &Location) -> usize {
        let mut removed = 0;
        for pattern in area_patterns(at) {
            removed += self.clear_matching(&pattern).await;
        }
        info!("Invalidated {} cached signal(s) around {}", removed, at);
        removed
    }
}
