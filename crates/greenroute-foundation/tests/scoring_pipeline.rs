//! End-to-end scoring through the signal hub.
//!
//! ```bash
//! cargo test -p greenroute-foundation --test scoring_pipeline
//! ```

mod common;

use greenroute_foundation::cache::{CacheConfig, InMemorySignalStore, SignalCache};
use greenroute_foundation::prediction::{ForestParams, PredictionEngine};
use greenroute_foundation::preferences::{PreferenceSet, RoutePreference};
use greenroute_foundation::scoring::{ScoringConfig, ScoringOrchestrator, SignalFailurePolicy};
use greenroute_foundation::signals::{RouteSignals, SignalHub, StaticSignalProvider};
use greenroute_kernel::{
    AirQualitySnapshot, ErrorKind, TrafficSnapshot, Vehicle, VehicleType, WeatherSnapshot,
};
use std::sync::Arc;

async fn hub(provider: Arc<StaticSignalProvider>) -> SignalHub {
    let cache = SignalCache::open(InMemorySignalStore::shared(), CacheConfig::default()).await;
    SignalHub::new(Arc::new(cache), provider)
}

fn orchestrator(policy: SignalFailurePolicy) -> ScoringOrchestrator {
    ScoringOrchestrator::new(
        Arc::new(PredictionEngine::new(ForestParams {
            n_trees: 8,
            growth_trees: 2,
            ..ForestParams::default()
        })),
        ScoringConfig {
            signal_failure_policy: policy,
            ..ScoringConfig::default()
        },
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// § 1  Ranking
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn candidates_are_ranked_and_truncated() {
    let provider = Arc::new(StaticSignalProvider::new(RouteSignals {
        weather: WeatherSnapshot::default(),
        traffic: TrafficSnapshot::with_congestion(30.0),
        air_quality: AirQualitySnapshot::with_aqi(45.0),
    }));
    let hub = hub(provider.clone()).await;
    let prefs = PreferenceSet::new("dispatcher-7")
        .with_preference(RoutePreference::EcoFriendly)
        .with_max_route_options(2);

    let routes = vec![
        common::route("long", 30.0, 45.0),
        common::route("short", 12.0, 25.0),
        common::route("medium", 20.0, 30.0),
    ];
    let vehicle = Vehicle::new("van-1", VehicleType::LightDuty, 800.0).with_load(300.0);

    let ranked = orchestrator(SignalFailurePolicy::SkipCandidate)
        .score_candidates(&hub, &routes, &vehicle, &prefs)
        .await
        .unwrap();

    let ids: Vec<_> = ranked.iter().map(|s| s.route_id.as_str()).collect();
    assert_eq!(ids, vec!["short", "medium"]);
    assert!(ranked[0].composite <= ranked[1].composite);
    assert_eq!(ranked[0].breakdown.emissions_estimate.traffic_factor, 1.1);
    assert!(provider.calls() >= 3);
}

#[tokio::test]
async fn emissions_ceiling_filters_everything_over_it() {
    let provider = Arc::new(StaticSignalProvider::new(RouteSignals::default()));
    let hub = hub(provider).await;
    // 40 km at 857 g/km is 34.28 kg
    let prefs = PreferenceSet::new("u1").with_max_emissions_threshold(10.0);

    let ranked = orchestrator(SignalFailurePolicy::SkipCandidate)
        .score_candidates(
            &hub,
            &[common::route("r1", 40.0, 50.0)],
            &Vehicle::new("truck", VehicleType::HeavyDuty, 20_000.0),
            &prefs,
        )
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn invalid_preferences_abort_scoring() {
    let hub = hub(Arc::new(StaticSignalProvider::new(RouteSignals::default()))).await;
    let prefs = PreferenceSet::new("u1")
        .with_preference(RoutePreference::EcoFriendly)
        .with_preference(RoutePreference::Speed);

    let err = orchestrator(SignalFailurePolicy::SkipCandidate)
        .score_candidates(
            &hub,
            &[common::route("r1", 10.0, 20.0)],
            &Vehicle::new("v", VehicleType::LightDuty, 500.0),
            &prefs,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─────────────────────────────────────────────────────────────────────────────
// § 2  Signal failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_provider_skips_candidates_by_default() {
    let provider = Arc::new(StaticSignalProvider::new(RouteSignals::default()));
    provider.set_failing(true);
    let hub = hub(provider).await;

    let ranked = orchestrator(SignalFailurePolicy::SkipCandidate)
        .score_candidates(
            &hub,
            &[common::route("r1", 10.0, 20.0), common::route("r2", 12.0, 22.0)],
            &Vehicle::new("v", VehicleType::Hybrid, 500.0),
            &PreferenceSet::new("u1"),
        )
        .await
        .unwrap();
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn failing_provider_can_fall_back_to_defaults() {
    let provider = Arc::new(StaticSignalProvider::new(RouteSignals::default()));
    provider.set_failing(true);
    let hub = hub(provider).await;

    let ranked = orchestrator(SignalFailurePolicy::UseDefaults)
        .score_candidates(
            &hub,
            &[common::route("r1", 10.0, 20.0), common::route("r2", 12.0, 22.0)],
            &Vehicle::new("v", VehicleType::Hybrid, 500.0),
            &PreferenceSet::new("u1"),
        )
        .await
        .unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].route_id, "r1");
    assert_eq!(ranked[0].breakdown.emissions_estimate.weather_factor, 1.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// § 3  Trained predictor
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trained_engine_reports_predictions_in_breakdown() {
    let hub = hub(Arc::new(StaticSignalProvider::new(RouteSignals::default()))).await;
    let orchestrator = orchestrator(SignalFailurePolicy::SkipCandidate);
    orchestrator.predictor().train(&common::history(60)).unwrap();

    let ranked = orchestrator
        .score_candidates(
            &hub,
            &[common::route("r1", 25.0, 40.0)],
            &Vehicle::new("v", VehicleType::MediumDuty, 1000.0),
            &PreferenceSet::new("u1"),
        )
        .await
        .unwrap();

    let breakdown = &ranked[0].breakdown;
    let prediction = breakdown.prediction.expect("trained engine predicts");
    assert_eq!(prediction.generation, 1);
    for c in [
        breakdown.confidence.traffic,
        breakdown.confidence.emissions,
        breakdown.confidence.duration,
    ] {
        assert!((0.0..=1.0).contains(&c));
    }
    assert!(breakdown.emissions_kg >= 0.0);
}
