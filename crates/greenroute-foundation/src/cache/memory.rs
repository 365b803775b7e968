//! In-memory signal store
//!
//! A [`SignalStore`] held entirely in process memory, suitable for tests,
//! development and single-instance deployments.

use super::keys::glob_to_regex;
use async_trait::async_trait;
use greenroute_kernel::storage::{SignalStore, StoreInfo, StoredEntry};
use greenroute_kernel::{EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// In-memory signal store
///
/// Expired records are evicted as they are touched: `get` drops the record
/// it finds expired, while `keys` and `info` sweep the whole map first. The
/// byte footprint is kept up to date on every insert and removal.
///
/// # Example
///
/// ```rust,ignore
/// use greenroute_foundation::cache::{InMemorySignalStore, SignalCache, CacheConfig};
///
/// let store = InMemorySignalStore::shared();
/// let cache = SignalCache::open(store, CacheConfig::default()).await;
/// ```
pub struct InMemorySignalStore {
    state: Arc<RwLock<StoreState>>,
    connected: AtomicBool,
    peak_bytes: AtomicU64,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, StoredEntry>,
    used_bytes: u64,
}

fn entry_bytes(key: &str, entry: &StoredEntry) -> u64 {
    (key.len() + entry.payload.len()) as u64
}

impl StoreState {
    fn insert(&mut self, key: String, entry: StoredEntry) {
        self.used_bytes += entry_bytes(&key, &entry);
        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.used_bytes -= entry_bytes(&key, &old);
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.used_bytes -= entry_bytes(key, &old);
                true
            }
            None => false,
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|key, entry| {
            let expired = entry.is_expired_at(now);
            if expired {
                freed += entry_bytes(key, entry);
            }
            !expired
        });
        self.used_bytes -= freed;
        before - self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.used_bytes = 0;
    }
}

impl InMemorySignalStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            connected: AtomicBool::new(true),
            peak_bytes: AtomicU64::new(0),
        }
    }

    /// Create a shared store handle
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Drop every expired record; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let removed = self.state.write().await.purge_expired(Instant::now());
        if removed > 0 {
            debug!("Purged {} expired signal records", removed);
        }
        removed
    }

    /// Number of physical records, expired ones included
    pub async fn raw_len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    fn ensure_connected(&self) -> EngineResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::cache_unavailable("in-memory signal store is closed"))
        }
    }
}

impl Default for InMemorySignalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalStore for InMemorySignalStore {
    async fn get(&self, key: &str) -> EngineResult<Option<StoredEntry>> {
        self.ensure_connected()?;
        let now = Instant::now();
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.clone())),
                Some(_) => {}
            }
        }
        let mut state = self.state.write().await;
        // re-check: a writer may have replaced the record in between
        match state.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        state.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, payload: String, ttl: Option<Duration>) -> EngineResult<()> {
        self.ensure_connected()?;
        let mut state = self.state.write().await;
        state.insert(
            key.to_string(),
            StoredEntry {
                payload,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        self.peak_bytes.fetch_max(state.used_bytes, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, key: &str) -> EngineResult<bool> {
        self.ensure_connected()?;
        Ok(self.state.write().await.remove(key))
    }

    async fn keys(&self, pattern: &str) -> EngineResult<Vec<String>> {
        self.ensure_connected()?;
        let re = glob_to_regex(pattern)
            .map_err(|e| EngineError::validation(format!("bad key pattern {}: {}", pattern, e)))?;
        let mut state = self.state.write().await;
        state.purge_expired(Instant::now());
        Ok(state
            .entries
            .keys()
            .filter(|k| re.is_match(k))
            .cloned()
            .collect())
    }

    async fn flush(&self) -> EngineResult<()> {
        self.ensure_connected()?;
        self.state.write().await.clear();
        Ok(())
    }

    async fn info(&self) -> EngineResult<StoreInfo> {
        self.ensure_connected()?;
        let mut state = self.state.write().await;
        state.purge_expired(Instant::now());
        Ok(StoreInfo {
            total_keys: state.entries.len() as u64,
            used_memory_bytes: state.used_bytes,
            peak_memory_bytes: self.peak_bytes.load(Ordering::Relaxed),
        })
    }

    async fn ping(&self) -> EngineResult<()> {
        self.ensure_connected()
    }

    async fn close(&self) -> EngineResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
