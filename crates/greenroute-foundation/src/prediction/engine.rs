use super::bundle::{self, TrainedModels};
use super::ensemble::{Forest, ForestParams, MemberSummary, Target};
use super::features::{self, FeatureVector, HistoricalExample, HolidayCalendar};
use super::scaler::FeatureScaler;
use chrono::{DateTime, NaiveDate, Utc};
use greenroute_kernel::{
    AirQualitySnapshot, EngineError, EngineReport, EngineResult, IntoEngineReport, Route, Vehicle,
    WeatherSnapshot,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Per-target confidence, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub traffic: f64,
    pub emissions: f64,
    pub duration: f64,
}

/// Output of [`PredictionEngine::predict`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePrediction {
    /// Minutes
    pub traffic_delay: f64,
    /// kg CO₂
    pub emissions: f64,
    /// Minutes
    pub duration: f64,
    pub confidence: ConfidenceScores,
    /// Model generation that produced this prediction
    pub generation: u64,
    /// Identity of the fitted models that produced this prediction
    pub revision: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Untrained,
    Trained,
}

/// Snapshot of the engine for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: ModelState,
    pub generation: u64,
    pub traffic_members: usize,
    pub emissions_members: usize,
    pub duration_members: usize,
    /// Examples consumed by train and every update since
    pub examples_seen: usize,
    pub scaler_id: Option<Uuid>,
    pub revision: Option<Uuid>,
    pub holidays: usize,
}

/// Ensemble predictor for traffic delay, emissions and duration
///
/// Lifecycle is `Untrained → Trained → Trained(+growth)*`. One feature
/// scaler is shared by the three forests. Fitting (`train`, `update`,
/// `restore`) holds the write lock for its whole duration; predictions
/// share the read lock.
///
/// Every fit also draws a fresh revision id. Unlike the generation counter,
/// which restarts at zero in each process, the revision is unique across
/// engines and is what shared prediction caches key on.
///
/// # Example
///
/// ```rust,ignore
/// let engine = PredictionEngine::new(ForestParams::default());
/// engine.train(&examples)?;
/// let prediction = engine.predict(&route, &vehicle, &weather, &aq, Utc::now())?;
/// ```
pub struct PredictionEngine {
    params: ForestParams,
    holidays: RwLock<HolidayCalendar>,
    models: RwLock<Option<TrainedModels>>,
    generation: AtomicU64,
    /// Written only while `models` is write-locked
    revision: Mutex<Option<Uuid>>,
}

impl PredictionEngine {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            holidays: RwLock::new(HolidayCalendar::new()),
            models: RwLock::new(None),
            generation: AtomicU64::new(0),
            revision: Mutex::new(None),
        }
    }

    pub fn with_holidays(self, holidays: HolidayCalendar) -> Self {
        *self.holidays.write() = holidays;
        self
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn add_holiday(&self, date: NaiveDate) {
        self.holidays.write().add(date);
    }

    pub fn is_trained(&self) -> bool {
        self.models.read().is_some()
    }

    /// Bumped by every train, update and restore.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Identity of the current fit, `None` while untrained.
    pub fn revision(&self) -> Option<Uuid> {
        let _models = self.models.read();
        *self.revision.lock()
    }

    /// Record a completed fit. Caller holds the `models` write lock.
    fn advance(&self) -> u64 {
        *self.revision.lock() = Some(Uuid::new_v4());
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn status(&self) -> EngineStatus {
        let models = self.models.read();
        let members = |target| models.as_ref().map_or(0, |m| m.forest(target).len());
        EngineStatus {
            state: if models.is_some() {
                ModelState::Trained
            } else {
                ModelState::Untrained
            },
            generation: self.generation(),
            traffic_members: members(Target::TrafficDelay),
            emissions_members: members(Target::Emissions),
            duration_members: members(Target::Duration),
            examples_seen: models.as_ref().map_or(0, |m| m.traffic.examples_seen()),
            scaler_id: models.as_ref().map(|m| m.scaler.id()),
            revision: *self.revision.lock(),
            holidays: self.holidays.read().len(),
        }
    }

    /// Raw (unscaled) feature vector for a trip.
    pub fn features(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        weather: &WeatherSnapshot,
        air_quality: &AirQualitySnapshot,
        at: DateTime<Utc>,
    ) -> FeatureVector {
        features::assemble(route, vehicle, weather, air_quality, at, &self.holidays.read())
    }

    /// Fit the scaler and a fresh forest per target on `examples`.
    ///
    /// Replaces any existing models.
    pub fn train(&self, examples: &[HistoricalExample]) -> EngineResult<()> {
        features::check_batch(examples)?;
        let mut models = self.models.write();
        let started = Instant::now();

        *models = Some(self.fit_fresh(examples));
        let generation = self.advance();

        info!(
            "Trained {} trees per target on {} examples in {:?} (generation {})",
            self.params.n_trees,
            examples.len(),
            started.elapsed(),
            generation
        );
        Ok(())
    }

    /// Append `growth_trees` members per target fitted on `examples` only.
    ///
    /// The batch is standardised with the existing scaler. Behaves as
    /// [`train`](Self::train) when nothing has been trained yet.
    pub fn update(&self, examples: &[HistoricalExample]) -> EngineResult<()> {
        features::check_batch(examples)?;
        let mut guard = self.models.write();

        match guard.as_mut() {
            None => {
                debug!("No trained models yet; update performs a full train");
                *guard = Some(self.fit_fresh(examples));
                let generation = self.advance();
                info!(
                    "Trained {} trees per target on {} examples (generation {})",
                    self.params.n_trees,
                    examples.len(),
                    generation
                );
            }
            Some(models) => {
                let rows: Vec<FeatureVector> = examples.iter().map(|e| e.features()).collect();
                let scaled = models.scaler.transform_all(&rows);
                for target in Target::ALL {
                    let y = targets(examples, target);
                    models.forest_mut(target).grow(&scaled, &y, &self.params);
                }
                let generation = self.advance();
                info!(
                    "Grew each forest to {} trees with {} new examples (generation {})",
                    models.traffic.len(),
                    examples.len(),
                    generation
                );
            }
        }
        Ok(())
    }

    fn fit_fresh(&self, examples: &[HistoricalExample]) -> TrainedModels {
        let rows: Vec<FeatureVector> = examples.iter().map(|e| e.features()).collect();
        let scaler = FeatureScaler::fit(&rows);
        let scaled = scaler.transform_all(&rows);
        let fit = |target: Target| {
            let y = targets(examples, target);
            Forest::fit(target, scaler.id(), &scaled, &y, &self.params)
        };

        TrainedModels {
            traffic: fit(Target::TrafficDelay),
            emissions: fit(Target::Emissions),
            duration: fit(Target::Duration),
            scaler,
        }
    }

    pub fn predict(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        weather: &WeatherSnapshot,
        air_quality: &AirQualitySnapshot,
        at: DateTime<Utc>,
    ) -> EngineResult<RoutePrediction> {
        let row = self.features(route, vehicle, weather, air_quality, at);
        self.predict_features(&row)
    }

    /// Predict from an already assembled raw feature vector.
    pub fn predict_features(&self, row: &FeatureVector) -> EngineResult<RoutePrediction> {
        let guard = self.models.read();
        let models = guard
            .as_ref()
            .ok_or_else(|| EngineError::not_ready("models not trained; call train first"))?;

        let scaled = models.scaler.transform(row);
        let summary = |target: Target| -> MemberSummary { models.forest(target).predict(&scaled) };
        let traffic = summary(Target::TrafficDelay);
        let emissions = summary(Target::Emissions);
        let duration = summary(Target::Duration);

        Ok(RoutePrediction {
            traffic_delay: traffic.mean,
            emissions: emissions.mean,
            duration: duration.mean,
            confidence: ConfidenceScores {
                traffic: traffic.confidence,
                emissions: emissions.confidence,
                duration: duration.confidence,
            },
            generation: self.generation(),
            revision: self.revision.lock().unwrap_or_default(),
        })
    }

    /// Write the model bundle into `dir`.
    pub fn persist(&self, dir: &Path) -> EngineReport<()> {
        let guard = self.models.read();
        let models = guard
            .as_ref()
            .ok_or_else(|| EngineError::not_ready("models not trained; nothing to persist"))
            .into_report()?;
        bundle::write_bundle(dir, models)
    }

    /// Replace the current models with the bundle in `dir`.
    ///
    /// On failure the current models are kept.
    pub fn restore(&self, dir: &Path) -> EngineReport<()> {
        let mut guard = self.models.write();
        let restored = bundle::read_bundle(dir)?;
        let members = restored.traffic.len();
        *guard = Some(restored);
        let generation = self.advance();
        info!(
            "Restored model bundle from {} ({} trees per target, generation {})",
            dir.display(),
            members,
            generation
        );
        Ok(())
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

fn targets(examples: &[HistoricalExample], target: Target) -> Vec<f64> {
    examples
        .iter()
        .map(|e| match target {
            Target::TrafficDelay => e.traffic_delay,
            Target::Emissions => e.total_emissions,
            Target::Duration => e.total_duration,
        })
        .collect()
}
