//! Storage contracts for the signal cache and for staged training data
//!
//! Defines the abstract interfaces the engine needs from its storage
//! collaborators. Implementations can be backed by an in-process map, a
//! remote key-value server or a document database.

use crate::error::EngineResult;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Signal Store
// ============================================================================

/// A raw record as held by a [`SignalStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// Serialized payload text
    pub payload: String,
    /// When the record stops being valid; `None` never expires.
    ///
    /// Remote stores derive this from the remaining TTL they report.
    pub expires_at: Option<Instant>,
}

impl StoredEntry {
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Server-side statistics reported by a [`SignalStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreInfo {
    pub total_keys: u64,
    pub used_memory_bytes: u64,
    pub peak_memory_bytes: u64,
}

/// Key-value store holding serialized signals with per-key expiry
///
/// Mirrors the subset of a remote cache server the engine relies on.
/// Concurrent writers to the same key race; the last write wins.
///
/// # Example
///
/// ```rust,ignore
/// use greenroute_kernel::storage::SignalStore;
///
/// async fn warm(store: &dyn SignalStore) -> EngineResult<()> {
///     store
///         .set("weather:40.7128,-74.006", "{\"temperature\":20}".into(), Some(Duration::from_secs(1800)))
///         .await
/// }
/// ```
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Fetch a record. Some stores may still return records past their
    /// expiry; callers must check [`StoredEntry::expires_at`].
    async fn get(&self, key: &str) -> EngineResult<Option<StoredEntry>>;

    /// Create or replace a record.
    async fn set(&self, key: &str, payload: String, ttl: Option<Duration>) -> EngineResult<()>;

    /// Delete a record. Returns `Ok(true)` if it existed.
    async fn delete(&self, key: &str) -> EngineResult<bool>;

    /// List keys matching a glob pattern (`*` matches any run of characters).
    async fn keys(&self, pattern: &str) -> EngineResult<Vec<String>>;

    /// Remove every record.
    async fn flush(&self) -> EngineResult<()>;

    /// Store-side statistics.
    async fn info(&self) -> EngineResult<StoreInfo>;

    /// Connectivity check performed when the cache is opened.
    async fn ping(&self) -> EngineResult<()> {
        Ok(())
    }

    /// Release the connection.
    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

// ============================================================================
// Document Store
// ============================================================================

/// Minimal document persistence used to stage historical training examples
///
/// Documents are JSON values addressed by string keys.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document. Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> EngineResult<Option<serde_json::Value>>;

    /// Create or replace a document.
    async fn set(&self, key: &str, document: serde_json::Value) -> EngineResult<()>;

    /// Delete a document. Returns `Ok(true)` if it existed.
    async fn delete(&self, key: &str) -> EngineResult<bool>;

    /// List keys sharing a prefix. Pass `""` to list everything.
    async fn list_keys(&self, prefix: &str) -> EngineResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    // Simple in-memory document store for testing the contract
    struct MapDocuments {
        data: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    }

    #[async_trait]
    impl DocumentStore for MapDocuments {
        async fn get(&self, key: &str) -> EngineResult<Option<serde_json::Value>> {
            Ok(self.data.read().await.get(key).cloned())
        }

        async fn set(&self, key: &str, document: serde_json::Value) -> EngineResult<()> {
            self.data.write().await.insert(key.to_string(), document);
            Ok(())
        }

        async fn delete(&self, key: &str) -> EngineResult<bool> {
            Ok(self.data.write().await.remove(key).is_some())
        }

        async fn list_keys(&self, prefix: &str) -> EngineResult<Vec<String>> {
            let data = self.data.read().await;
            Ok(data.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_document_store_basic_operations() {
        let store = MapDocuments {
            data: Arc::new(RwLock::new(HashMap::new())),
        };

        store
            .set("examples:1", serde_json::json!({ "distance_km": 5.0 }))
            .await
            .unwrap();

        let doc = store.get("examples:1").await.unwrap();
        assert_eq!(doc.unwrap()["distance_km"], 5.0);

        let keys = store.list_keys("examples:").await.unwrap();
        assert_eq!(keys, vec!["examples:1".to_string()]);

        assert!(store.delete("examples:1").await.unwrap());
        assert_eq!(store.get("examples:1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stored_entry_expiry_uses_tokio_clock() {
        let entry = StoredEntry {
            payload: "{}".into(),
            expires_at: Some(Instant::now() + Duration::from_secs(5)),
        };
        assert!(!entry.is_expired_at(Instant::now()));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(entry.is_expired_at(Instant::now()));
    }
}
