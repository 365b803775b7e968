//! Training data staging
//!
//! Historical examples and route feedback are staged in a
//! [`DocumentStore`] before they reach the predictor. New examples wait
//! under the `pending:` prefix; once fed to the engine they move to
//! `history:`, so a full retrain can replay everything.

use crate::prediction::{FeatureVector, HistoricalExample, PredictionEngine};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenroute_kernel::storage::DocumentStore;
use greenroute_kernel::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

const PENDING_PREFIX: &str = "pending:";
const HISTORY_PREFIX: &str = "history:";
const FEEDBACK_PREFIX: &str = "feedback:";

/// A driver's report on a completed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeedback {
    pub route_id: String,
    pub user_id: String,
    pub vehicle_id: String,
    /// 1-5
    pub rating: u8,
    /// Minutes
    #[serde(default)]
    pub actual_duration: Option<f64>,
    /// kg CO₂
    #[serde(default)]
    pub actual_emissions: Option<f64>,
    /// 1-5
    #[serde(default)]
    pub traffic_accuracy: Option<u8>,
    /// 1-5
    #[serde(default)]
    pub weather_impact: Option<u8>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl RouteFeedback {
    pub fn new(
        route_id: impl Into<String>,
        user_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            user_id: user_id.into(),
            vehicle_id: vehicle_id.into(),
            rating,
            actual_duration: None,
            actual_emissions: None,
            traffic_accuracy: None,
            weather_impact: None,
            comments: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_actuals(mut self, duration_min: f64, emissions_kg: f64) -> Self {
        self.actual_duration = Some(duration_min);
        self.actual_emissions = Some(emissions_kg);
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        let ratings = [
            ("rating", Some(self.rating)),
            ("traffic_accuracy", self.traffic_accuracy),
            ("weather_impact", self.weather_impact),
        ];
        for (field, value) in ratings {
            if let Some(v) = value {
                if !(1..=5).contains(&v) {
                    return Err(EngineError::validation(format!(
                        "{} {} outside 1-5",
                        field, v
                    ))
                    .with_details(json!({ "field": field, "value": v })));
                }
            }
        }
        for (field, value) in [
            ("actual_duration", self.actual_duration),
            ("actual_emissions", self.actual_emissions),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(EngineError::validation(format!(
                        "{} must be a non-negative number",
                        field
                    ))
                    .with_details(json!({ "field": field })));
                }
            }
        }
        Ok(())
    }

    /// Training example for this trip, once both actuals are known.
    ///
    /// Traffic delay is the actual duration beyond the planned one.
    pub fn to_example(
        &self,
        features: &FeatureVector,
        planned_duration_min: f64,
    ) -> Option<HistoricalExample> {
        let duration = self.actual_duration?;
        let emissions = self.actual_emissions?;
        let delay = (duration - planned_duration_min).max(0.0);
        Some(HistoricalExample::from_features(
            features, delay, emissions, duration,
        ))
    }
}

/// Stages training data for the prediction engine.
pub struct TrainingStage {
    store: Arc<dyn DocumentStore>,
}

impl TrainingStage {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stage one example; returns its key.
    pub async fn stage(&self, example: &HistoricalExample) -> EngineResult<String> {
        let key = format!("{}{}", PENDING_PREFIX, Uuid::now_v7());
        self.store.set(&key, serde_json::to_value(example)?).await?;
        Ok(key)
    }

    pub async fn stage_all(&self, examples: &[HistoricalExample]) -> EngineResult<Vec<String>> {
        let mut keys = Vec::with_capacity(examples.len());
        for example in examples {
            keys.push(self.stage(example).await?);
        }
        Ok(keys)
    }

    pub async fn record_feedback(&self, feedback: &RouteFeedback) -> EngineResult<String> {
        feedback.validate()?;
        let key = format!(
            "{}{}:{}",
            FEEDBACK_PREFIX,
            feedback.route_id,
            Uuid::now_v7()
        );
        self.store.set(&key, serde_json::to_value(feedback)?).await?;
        Ok(key)
    }

    pub async fn feedback_for_route(&self, route_id: &str) -> EngineResult<Vec<RouteFeedback>> {
        let prefix = format!("{}{}:", FEEDBACK_PREFIX, route_id);
        self.load_all(&prefix)
            .await
            .map(|entries| entries.into_iter().map(|(_, fb)| fb).collect())
    }

    pub async fn pending(&self) -> EngineResult<Vec<HistoricalExample>> {
        Ok(self
            .load_all(PENDING_PREFIX)
            .await?
            .into_iter()
            .map(|(_, ex)| ex)
            .collect())
    }

    pub async fn history(&self) -> EngineResult<Vec<HistoricalExample>> {
        Ok(self
            .load_all(HISTORY_PREFIX)
            .await?
            .into_iter()
            .map(|(_, ex)| ex)
            .collect())
    }

    /// Grow the engine with pending examples, then archive them.
    ///
    /// Returns how many examples were consumed. Nothing pending is a no-op.
    pub async fn apply_update(&self, engine: &PredictionEngine) -> EngineResult<usize> {
        let pending = self.load_all::<HistoricalExample>(PENDING_PREFIX).await?;
        if pending.is_empty() {
            return Ok(0);
        }
        let batch: Vec<_> = pending.iter().map(|(_, ex)| ex.clone()).collect();
        engine.update(&batch)?;
        self.archive(&pending).await?;
        info!("Applied {} staged example(s) as an incremental update", batch.len());
        Ok(batch.len())
    }

    /// Retrain the engine on history plus pending, then archive pending.
    pub async fn apply_train(&self, engine: &PredictionEngine) -> EngineResult<usize> {
        let pending = self.load_all::<HistoricalExample>(PENDING_PREFIX).await?;
        let mut batch = self.history().await?;
        batch.extend(pending.iter().map(|(_, ex)| ex.clone()));
        engine.train(&batch)?;
        self.archive(&pending).await?;
        info!("Retrained on {} staged example(s)", batch.len());
        Ok(batch.len())
    }

    async fn archive(&self, pending: &[(String, HistoricalExample)]) -> EngineResult<()> {
        for (key, example) in pending {
            let id = key.trim_start_matches(PENDING_PREFIX);
            self.store
                .set(&format!("{}{}", HISTORY_PREFIX, id), serde_json::to_value(example)?)
                .await?;
            self.store.delete(key).await?;
        }
        Ok(())
    }

    /// Load every decodable document under `prefix`, ordered by key.
    async fn load_all<T: for<'de> Deserialize<'de>>(
        &self,
        prefix: &str,
    ) -> EngineResult<Vec<(String, T)>> {
        let mut keys = self.store.list_keys(prefix).await?;
        keys.sort();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(doc) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_value(doc) {
                Ok(value) => out.push((key, value)),
                Err(e) => warn!("Skipping unreadable staged document {}: {}", key, e),
            }
        }
        Ok(out)
    }
}

/// In-memory document store
///
/// Thread-safe, process-local. Suitable for tests, the CLI and
/// short-lived deployments.
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> EngineResult<Option<serde_json::Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, document: serde_json::Value) -> EngineResult<()> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn delete(&self, key: &str) -> EngineResult<bool> {
        Ok(self.documents.write().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> EngineResult<Vec<String>> {
        Ok(self
            .documents
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
