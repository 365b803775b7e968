//! Scoring orchestrator
//!
//! Combines the deterministic emissions estimate, the predictor's output
//! (when trained) and preference-derived weights into one composite score
//! per candidate route. Lower is better.

use crate::cache::SignalCache;
use crate::emissions::{self, EmissionsEstimate, EmissionsModel};
use crate::preferences::{self, PreferenceSet, WeightVector};
use crate::prediction::{ConfidenceScores, FeatureVector, PredictionEngine, RoutePrediction};
use crate::signals::{RouteSignals, SignalHub};
use chrono::{DateTime, Timelike, Utc};
use greenroute_kernel::provider::RouteProvider;
use greenroute_kernel::{
    AirQualitySnapshot, EngineError, EngineResult, ErrorKind, Location, Route, TrafficSnapshot,
    Vehicle, VehicleType, WeatherSnapshot,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a candidate whose signals could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalFailurePolicy {
    /// Drop the candidate from the result
    #[default]
    SkipCandidate,
    /// Score it against neutral default snapshots
    UseDefaults,
}

/// Prices and knobs used by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub fuel_price_per_litre: f64,
    pub driver_cost_per_hour: f64,
    /// Electric vehicles only
    pub energy_cost_per_km: f64,
    /// Confidence reported when no trained model is available
    pub neutral_confidence: f64,
    /// Fractional time penalty for peak departures when peak hours are avoided
    pub peak_hour_penalty: f64,
    pub signal_failure_policy: SignalFailurePolicy,
    /// Cache predictions in the `ml_prediction` category
    pub cache_predictions: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fuel_price_per_litre: 1.5,
            driver_cost_per_hour: 25.0,
            energy_cost_per_km: 0.05,
            neutral_confidence: 0.5,
            peak_hour_penalty: 0.25,
            signal_failure_policy: SignalFailurePolicy::default(),
            cache_predictions: true,
        }
    }
}

/// Morning 07:00-09:00 and evening 16:00-19:00, end exclusive.
pub fn is_peak_hour(at: DateTime<Utc>) -> bool {
    matches!(at.hour(), 7..9 | 16..19)
}

/// Hex SHA-256 of the little-endian feature bytes.
pub fn feature_hash(row: &FeatureVector) -> String {
    let mut hasher = Sha256::new();
    for value in row {
        hasher.update(value.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Weighted contribution of each objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerms {
    pub distance: f64,
    pub time: f64,
    pub emissions: f64,
    pub cost: f64,
}

impl WeightedTerms {
    pub fn sum(&self) -> f64 {
        self.distance + self.time + self.emissions + self.cost
    }
}

/// Everything that went into a composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance_km: f64,
    /// Blended duration plus predicted delay, after any peak penalty
    pub time_min: f64,
    /// Blended emissions, kg CO₂
    pub emissions_kg: f64,
    pub cost: f64,
    pub eco_score: f64,
    pub emissions_estimate: EmissionsEstimate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<RoutePrediction>,
    pub confidence: ConfidenceScores,
    /// Composite scaling from weather sensitivity; 1.0 is neutral
    pub weather_multiplier: f64,
    pub peak_penalty_applied: bool,
    pub weighted: WeightedTerms,
}

/// A scored candidate route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScore {
    pub route_id: String,
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub composite: f64,
    pub breakdown: ScoreBreakdown,
}

/// Ascending composite score, ties by ascending distance.
pub fn rank(mut scores: Vec<RankedScore>) -> Vec<RankedScore> {
    scores.sort_by(|a, b| {
        a.composite.total_cmp(&b.composite).then_with(|| {
            a.breakdown
                .distance_km
                .total_cmp(&b.breakdown.distance_km)
        })
    });
    scores
}

/// Drop candidates failing the preference thresholds, rank the rest and
/// keep at most `max_route_options`.
pub fn rank_with_preferences(scores: Vec<RankedScore>, prefs: &PreferenceSet) -> Vec<RankedScore> {
    let before = scores.len();
    let kept: Vec<_> = scores
        .into_iter()
        .filter(|s| prefs.allows_vehicle(s.vehicle_type))
        .filter(|s| {
            prefs
                .eco_score_threshold
                .is_none_or(|min| s.breakdown.eco_score >= min)
        })
        .filter(|s| {
            prefs
                .max_emissions_threshold
                .is_none_or(|max| s.breakdown.emissions_kg <= max)
        })
        .collect();
    if kept.len() < before {
        debug!(
            "{} of {} candidate(s) filtered by preferences of {}",
            before - kept.len(),
            before,
            prefs.user_id
        );
    }
    let mut ranked = rank(kept);
    ranked.truncate(prefs.max_route_options as usize);
    ranked
}

pub struct ScoringOrchestrator {
    emissions: EmissionsModel,
    predictor: Arc<PredictionEngine>,
    cache: Option<Arc<SignalCache>>,
    config: ScoringConfig,
}

impl ScoringOrchestrator {
    pub fn new(predictor: Arc<PredictionEngine>, config: ScoringConfig) -> Self {
        Self {
            emissions: EmissionsModel::new(),
            predictor,
            cache: None,
            config,
        }
    }

    /// Cache predictions through `cache`.
    pub fn with_cache(mut self, cache: Arc<SignalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn predictor(&self) -> &Arc<PredictionEngine> {
        &self.predictor
    }

    pub fn emissions_model(&self) -> &EmissionsModel {
        &self.emissions
    }

    /// Score one route for one vehicle under the given conditions.
    ///
    /// Falls back to the deterministic emissions estimate and neutral
    /// confidence when the predictor is untrained.
    pub async fn score(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        weights: &WeightVector,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        air_quality: &AirQualitySnapshot,
    ) -> EngineResult<RankedScore> {
        route.validate()?;
        vehicle.check_load()?;

        let at = route.departure_time.unwrap_or_else(Utc::now);
        let estimate = self.emissions.estimate(route, vehicle, weather, traffic);
        let prediction = self
            .prediction(route, vehicle, weather, air_quality, at)
            .await;

        let (emissions_kg, mut time_min, confidence) = match &prediction {
            Some(p) => {
                let ce = p.confidence.emissions.clamp(0.0, 1.0);
                let cd = p.confidence.duration.clamp(0.0, 1.0);
                let ct = p.confidence.traffic.clamp(0.0, 1.0);
                let emissions = ce * p.emissions + (1.0 - ce) * estimate.total_emissions_kg;
                let duration = cd * p.duration + (1.0 - cd) * route.total_duration_min;
                let delay = ct * p.traffic_delay.max(0.0);
                (emissions.max(0.0), duration.max(0.0) + delay, p.confidence)
            }
            None => {
                let neutral = self.config.neutral_confidence;
                (
                    estimate.total_emissions_kg,
                    route.total_duration_min,
                    ConfidenceScores {
                        traffic: neutral,
                        emissions: neutral,
                        duration: neutral,
                    },
                )
            }
        };

        let peak_penalty_applied = weights.avoid_peak_hours && is_peak_hour(at);
        if peak_penalty_applied {
            time_min *= 1.0 + self.config.peak_hour_penalty;
        }

        let cost = self.cost(route.total_distance_km, time_min, vehicle);
        let weighted = WeightedTerms {
            distance: weights.distance * route.total_distance_km,
            time: weights.time * time_min,
            emissions: weights.emissions * emissions_kg,
            cost: weights.cost * cost,
        };
        let weather_multiplier =
            1.0 + (estimate.weather_factor - 1.0) * (weights.weather_sensitivity - 1.0);
        let composite = weighted.sum() * weather_multiplier;
        let eco_score = emissions::eco_score(emissions_kg * 1000.0 / route.total_distance_km);

        debug!(
            "Scored route {} for vehicle {}: composite {:.3} (predicted: {})",
            route.id,
            vehicle.id,
            composite,
            prediction.is_some()
        );

        Ok(RankedScore {
            route_id: route.id.clone(),
            vehicle_id: vehicle.id.clone(),
            vehicle_type: vehicle.vehicle_type,
            composite,
            breakdown: ScoreBreakdown {
                distance_km: route.total_distance_km,
                time_min,
                emissions_kg,
                cost,
                eco_score,
                emissions_estimate: estimate,
                prediction,
                confidence,
                weather_multiplier,
                peak_penalty_applied,
                weighted,
            },
        })
    }

    /// Resolve signals for each route, score and rank under `prefs`.
    ///
    /// A candidate whose signals fail is handled per
    /// [`SignalFailurePolicy`]; any other error aborts the whole call.
    pub async fn score_candidates(
        &self,
        hub: &SignalHub,
        routes: &[Route],
        vehicle: &Vehicle,
        prefs: &PreferenceSet,
    ) -> EngineResult<Vec<RankedScore>> {
        preferences::check(prefs)?;
        let weights = preferences::derive_weights(prefs);

        let signals =
            futures::future::join_all(routes.iter().map(|route| hub.for_route(route))).await;

        let mut scores = Vec::with_capacity(routes.len());
        for (route, signals) in routes.iter().zip(signals) {
            let signals = match signals {
                Ok(signals) => signals,
                Err(e) if e.is(ErrorKind::ExternalSignal) => match self.config.signal_failure_policy {
                    SignalFailurePolicy::SkipCandidate => {
                        warn!("Skipping route {}: {}", route.id, e);
                        continue;
                    }
                    SignalFailurePolicy::UseDefaults => {
                        warn!("Scoring route {} with default signals: {}", route.id, e);
                        RouteSignals::default()
                    }
                },
                Err(e) => return Err(e),
            };
            scores.push(
                self.score(
                    route,
                    vehicle,
                    &weights,
                    &signals.weather,
                    &signals.traffic,
                    &signals.air_quality,
                )
                .await?,
            );
        }

        Ok(rank_with_preferences(scores, prefs))
    }

    /// Ask `routes` for candidates between two points and score them.
    pub async fn score_trip(
        &self,
        routes: &dyn RouteProvider,
        hub: &SignalHub,
        origin: &Location,
        destination: &Location,
        waypoints: &[Location],
        vehicle: &Vehicle,
        prefs: &PreferenceSet,
    ) -> EngineResult<Vec<RankedScore>> {
        origin.validate()?;
        destination.validate()?;
        let candidates = routes
            .routes(origin, destination, waypoints)
            .await
            .map_err(|e| {
                if e.is(ErrorKind::ExternalSignal) {
                    e
                } else {
                    EngineError::external_signal(routes.name(), e.message)
                }
            })?;
        debug!("{} returned {} candidate(s)", routes.name(), candidates.len());
        self.score_candidates(hub, &candidates, vehicle, prefs).await
    }

    fn cost(&self, distance_km: f64, time_min: f64, vehicle: &Vehicle) -> f64 {
        let energy = if vehicle.vehicle_type == VehicleType::Electric {
            distance_km * self.config.energy_cost_per_km
        } else if vehicle.fuel_efficiency > 0.0 {
            distance_km / vehicle.fuel_efficiency * self.config.fuel_price_per_litre
        } else {
            0.0
        };
        energy + time_min / 60.0 * self.config.driver_cost_per_hour
    }

    async fn prediction(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        weather: &WeatherSnapshot,
        air_quality: &AirQualitySnapshot,
        at: DateTime<Utc>,
    ) -> Option<RoutePrediction> {
        let revision = self.predictor.revision()?;
        let row = self
            .predictor
            .features(route, vehicle, weather, air_quality, at);
        let cache = self.cache.as_ref().filter(|_| self.config.cache_predictions);
        let hash = feature_hash(&row);

        if let Some(cache) = cache {
            if let Some(hit) = cache.ml_prediction::<RoutePrediction>(revision, &hash).await {
                return Some(hit);
            }
        }

        match self.predictor.predict_features(&row) {
            Ok(prediction) => {
                if let Some(cache) = cache {
                    cache
                        .set_ml_prediction(prediction.revision, &hash, &prediction)
                        .await;
                }
                Some(prediction)
            }
            Err(e) => {
                debug!("Prediction unavailable, using deterministic estimate: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, InMemorySignalStore};
    use crate::prediction::{ForestParams, HistoricalExample};
    use crate::preferences::{RoutePreference, TimePreference, WeatherPreference};
    use chrono::TimeZone;
    use greenroute_kernel::Location;
    use greenroute_kernel::storage::SignalStore;

    fn route(id: &str, km: f64, minutes: f64) -> Route {
        Route::new(
            id,
            vec![Location::new(40.7128, -74.006), Location::new(40.7614, -73.9776)],
            km,
            minutes,
        )
    }

    fn orchestrator() -> ScoringOrchestrator {
        ScoringOrchestrator::new(
            Arc::new(PredictionEngine::new(ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            })),
            ScoringConfig::default(),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn untrained_score_is_deterministic() {
        let score = orchestrator()
            .score(
                &route("r1", 100.0, 120.0),
                &Vehicle::new("v1", VehicleType::MediumDuty, 1000.0),
                &WeightVector::default(),
                &WeatherSnapshot::default(),
                &TrafficSnapshot::default(),
                &AirQualitySnapshot::default(),
            )
            .await
            .unwrap();

        // 100 km + 120 min + 27.1 kg + (10 l * 1.5 + 2 h * 25)
        assert!(close(score.composite, 312.1));
        assert!(score.breakdown.prediction.is_none());
        assert_eq!(score.breakdown.confidence.emissions, 0.5);
        assert!(close(score.breakdown.cost, 65.0));
    }

    #[tokio::test]
    async fn overloaded_vehicle_is_rejected() {
        let err = orchestrator()
            .score(
                &route("r1", 10.0, 20.0),
                &Vehicle::new("v1", VehicleType::LightDuty, 100.0).with_load(150.0),
                &WeightVector::default(),
                &WeatherSnapshot::default(),
                &TrafficSnapshot::default(),
                &AirQualitySnapshot::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn electric_cost_uses_energy_price() {
        let score = orchestrator()
            .score(
                &route("r1", 100.0, 60.0),
                &Vehicle::new("ev", VehicleType::Electric, 500.0),
                &WeightVector::default(),
                &WeatherSnapshot::default(),
                &TrafficSnapshot::default(),
                &AirQualitySnapshot::default(),
            )
            .await
            .unwrap();
        assert!(close(score.breakdown.cost, 100.0 * 0.05 + 25.0));
        assert_eq!(score.breakdown.eco_score, 100.0);
    }

    #[tokio::test]
    async fn weather_sensitivity_scales_bad_weather() {
        let o = orchestrator();
        let r = route("r1", 50.0, 60.0);
        let v = Vehicle::new("v1", VehicleType::LightDuty, 500.0);
        let snow = WeatherSnapshot::default().with_snow(4.0);
        let neutral = WeightVector::default();
        let sensitive = preferences::derive_weights(
            &PreferenceSet::new("u1").with_weather(WeatherPreference::AvoidSnow),
        );

        let a = o
            .score(&r, &v, &neutral, &snow, &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        let b = o
            .score(&r, &v, &sensitive, &snow, &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        assert_eq!(a.breakdown.weather_multiplier, 1.0);
        assert!(close(b.breakdown.weather_multiplier, 1.0 + 0.25 * 0.5));
        assert!(b.composite > a.composite);
    }

    #[tokio::test]
    async fn peak_departure_penalised_when_avoided() {
        let o = orchestrator();
        let weights = preferences::derive_weights(
            &PreferenceSet::new("u1").with_time(TimePreference::AvoidPeakHours),
        );
        let v = Vehicle::new("v1", VehicleType::Hybrid, 500.0);
        let peak = route("r1", 20.0, 40.0)
            .with_departure(Utc.with_ymd_and_hms(2026, 5, 4, 8, 15, 0).unwrap());
        let calm = route("r2", 20.0, 40.0)
            .with_departure(Utc.with_ymd_and_hms(2026, 5, 4, 11, 0, 0).unwrap());

        let p = o
            .score(&peak, &v, &weights, &WeatherSnapshot::default(), &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        let c = o
            .score(&calm, &v, &weights, &WeatherSnapshot::default(), &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        assert!(p.breakdown.peak_penalty_applied);
        assert!(close(p.breakdown.time_min, 50.0));
        assert!(!c.breakdown.peak_penalty_applied);
    }

    #[test]
    fn peak_windows() {
        let at = |h| Utc.with_ymd_and_hms(2026, 1, 5, h, 0, 0).unwrap();
        assert!(is_peak_hour(at(7)));
        assert!(is_peak_hour(at(8)));
        assert!(!is_peak_hour(at(9)));
        assert!(is_peak_hour(at(18)));
        assert!(!is_peak_hour(at(19)));
    }

    fn scored(id: &str, composite: f64, km: f64, vt: VehicleType, eco: f64, kg: f64) -> RankedScore {
        RankedScore {
            route_id: id.to_string(),
            vehicle_id: "v".to_string(),
            vehicle_type: vt,
            composite,
            breakdown: ScoreBreakdown {
                distance_km: km,
                time_min: 0.0,
                emissions_kg: kg,
                cost: 0.0,
                eco_score: eco,
                emissions_estimate: EmissionsEstimate {
                    total_emissions_kg: kg,
                    base_emissions_kg: kg,
                    weather_factor: 1.0,
                    traffic_factor: 1.0,
                    route_length_km: km,
                    vehicle_type: vt,
                },
                prediction: None,
                confidence: ConfidenceScores {
                    traffic: 0.5,
                    emissions: 0.5,
                    duration: 0.5,
                },
                weather_multiplier: 1.0,
                peak_penalty_applied: false,
                weighted: WeightedTerms {
                    distance: 0.0,
                    time: 0.0,
                    emissions: 0.0,
                    cost: 0.0,
                },
            },
        }
    }

    #[test]
    fn ties_break_on_distance() {
        let ranked = rank(vec![
            scored("far", 10.0, 30.0, VehicleType::LightDuty, 80.0, 1.0),
            scored("worst", 12.0, 5.0, VehicleType::LightDuty, 80.0, 1.0),
            scored("near", 10.0, 20.0, VehicleType::LightDuty, 80.0, 1.0),
        ]);
        let ids: Vec<_> = ranked.iter().map(|s| s.route_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "worst"]);
    }

    #[test]
    fn preferences_filter_and_truncate() {
        let prefs = PreferenceSet::new("u1")
            .with_preference(RoutePreference::EcoFriendly)
            .with_eco_score_threshold(50.0)
            .with_max_emissions_threshold(5.0)
            .with_max_route_options(2)
            .with_vehicle_types(vec![VehicleType::LightDuty, VehicleType::Hybrid]);

        let ranked = rank_with_preferences(
            vec![
                scored("low_eco", 1.0, 10.0, VehicleType::LightDuty, 40.0, 1.0),
                scored("heavy", 2.0, 10.0, VehicleType::HeavyDuty, 90.0, 1.0),
                scored("dirty", 3.0, 10.0, VehicleType::Hybrid, 90.0, 6.0),
                scored("a", 6.0, 10.0, VehicleType::Hybrid, 90.0, 2.0),
                scored("b", 5.0, 10.0, VehicleType::LightDuty, 70.0, 3.0),
                scored("c", 7.0, 10.0, VehicleType::LightDuty, 70.0, 3.0),
            ],
            &prefs,
        );
        let ids: Vec<_> = ranked.iter().map(|s| s.route_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    fn history() -> Vec<HistoricalExample> {
        (0..30)
            .map(|i| {
                let km = 10.0 + i as f64;
                HistoricalExample {
                    hour: 10,
                    day_of_week: 2,
                    is_holiday: false,
                    distance_km: km,
                    vehicle_type: VehicleType::MediumDuty,
                    load_ratio: 0.2,
                    temperature: 20.0,
                    precipitation: 0.0,
                    wind_speed: 0.0,
                    air_quality_index: 50.0,
                    traffic_delay: 2.0,
                    total_emissions: km * 0.271,
                    total_duration: km * 1.2,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn trained_predictions_are_blended_and_cached() {
        let store = InMemorySignalStore::shared();
        let cache = Arc::new(SignalCache::open(store.clone(), CacheConfig::default()).await);
        let o = orchestrator().with_cache(cache.clone());
        o.predictor().train(&history()).unwrap();

        let r = route("r1", 20.0, 24.0)
            .with_departure(Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap());
        let v = Vehicle::new("v1", VehicleType::MediumDuty, 1000.0).with_load(200.0);
        let first = o
            .score(&r, &v, &WeightVector::default(), &WeatherSnapshot::default(), &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        assert!(first.breakdown.prediction.is_some());
        assert!(first.breakdown.time_min >= 24.0 * 0.5);

        let revision = o.predictor().revision().unwrap();
        let cached = store
            .keys(&format!("ml_prediction:{}:*", revision.simple()))
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);

        let second = o
            .score(&r, &v, &WeightVector::default(), &WeatherSnapshot::default(), &TrafficSnapshot::default(), &AirQualitySnapshot::default())
            .await
            .unwrap();
        assert!(close(first.composite, second.composite));
        assert!(cache.metrics().hits >= 1);
    }

    #[tokio::test]
    async fn engines_sharing_a_store_keep_their_own_predictions() {
        let store = InMemorySignalStore::shared();
        let cache = Arc::new(SignalCache::open(store.clone(), CacheConfig::default()).await);
        let a = orchestrator().with_cache(cache.clone());
        let b = orchestrator().with_cache(cache.clone());

        a.predictor().train(&history()).unwrap();
        let scaled: Vec<_> = history()
            .into_iter()
            .map(|mut e| {
                e.total_emissions *= 100.0;
                e
            })
            .collect();
        b.predictor().train(&scaled).unwrap();
        assert_eq!(a.predictor().generation(), b.predictor().generation());

        let r = route("r1", 20.0, 24.0)
            .with_departure(Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap());
        let v = Vehicle::new("v1", VehicleType::MediumDuty, 1000.0).with_load(200.0);
        let weights = WeightVector::default();
        let weather = WeatherSnapshot::default();
        let traffic = TrafficSnapshot::default();
        let aq = AirQualitySnapshot::default();

        let from_a = a.score(&r, &v, &weights, &weather, &traffic, &aq).await.unwrap();
        let from_b = b.score(&r, &v, &weights, &weather, &traffic, &aq).await.unwrap();
        let from_a = from_a.breakdown.prediction.unwrap();
        let from_b = from_b.breakdown.prediction.unwrap();
        let direct_b = b
            .predictor()
            .predict(&r, &v, &WeatherSnapshot::default(), &AirQualitySnapshot::default(), r.departure_time.unwrap())
            .unwrap();

        assert_ne!(from_a.revision, from_b.revision);
        assert!(close(from_b.emissions, direct_b.emissions));
        assert!(from_b.emissions > from_a.emissions * 10.0);
        assert_eq!(store.keys("ml_prediction:*").await.unwrap().len(), 2);
    }

    struct FixedRoutes(Vec<Route>);

    #[async_trait::async_trait]
    impl RouteProvider for FixedRoutes {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn routes(
            &self,
            _origin: &Location,
            _destination: &Location,
            _waypoints: &[Location],
        ) -> EngineResult<Vec<Route>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn trip_scores_provider_candidates() {
        let cache = Arc::new(SignalCache::open(InMemorySignalStore::shared(), CacheConfig::default()).await);
        let hub = SignalHub::new(
            cache,
            Arc::new(crate::signals::StaticSignalProvider::new(RouteSignals::default())),
        );
        let provider = FixedRoutes(vec![route("b", 15.0, 30.0), route("a", 9.0, 20.0)]);

        let ranked = orchestrator()
            .score_trip(
                &provider,
                &hub,
                &Location::new(40.7128, -74.006),
                &Location::new(40.7614, -73.9776),
                &[],
                &Vehicle::new("v1", VehicleType::Electric, 400.0),
                &PreferenceSet::new("u1"),
            )
            .await
            .unwrap();
        let ids: Vec<_> = ranked.iter().map(|s| s.route_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn trip_rejects_bad_coordinates() {
        let cache = Arc::new(SignalCache::open(InMemorySignalStore::shared(), CacheConfig::default()).await);
        let hub = SignalHub::new(
            cache,
            Arc::new(crate::signals::StaticSignalProvider::new(RouteSignals::default())),
        );
        let err = orchestrator()
            .score_trip(
                &FixedRoutes(vec![]),
                &hub,
                &Location::new(95.0, 0.0),
                &Location::new(40.0, -74.0),
                &[],
                &Vehicle::new("v1", VehicleType::Electric, 400.0),
                &PreferenceSet::new("u1"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn feature_hash_is_stable_hex() {
        let row = [1.0; crate::prediction::FEATURE_COUNT];
        let h = feature_hash(&row);
        assert_eq!(h.len(), 64);
        assert_eq!(h, feature_hash(&row));
        let mut other = row;
        other[9] = 2.0;
        assert_ne!(h, feature_hash(&other));
    }
}
