use super::types::{
    PreferencePatch, PreferenceSet, RoutePreference, TimePreference, WeatherPreference,
    WeightVector,
};
use greenroute_kernel::{EngineError, EngineResult};
use serde_json::json;

const PRIORITY_MULTIPLIER: f64 = 2.0;
const WEATHER_SENSITIVITY: f64 = 1.5;
const STRICT_TIMING_MULTIPLIER: f64 = 1.5;

/// Map a preference set onto routing weights.
///
/// Starts from unit weights. Each priority tag doubles its objective;
/// strict timing compounds on top of a speed priority.
pub fn derive_weights(preferences: &PreferenceSet) -> WeightVector {
    let mut weights = WeightVector::default();

    for preference in &preferences.route_preferences {
        match preference {
            RoutePreference::EcoFriendly => {
                weights.eco_friendly = true;
                weights.emissions = PRIORITY_MULTIPLIER;
            }
            RoutePreference::Speed => {
                weights.speed_priority = true;
                weights.time = PRIORITY_MULTIPLIER;
            }
            RoutePreference::CostEffective => weights.cost = PRIORITY_MULTIPLIER,
            RoutePreference::AvoidTolls => weights.avoid_tolls = true,
            RoutePreference::AvoidHighways => weights.avoid_highways = true,
            RoutePreference::EvFriendly | RoutePreference::ScenicRoute => {}
        }
    }

    if preferences.weather_preference != WeatherPreference::AnyWeather {
        weights.weather_sensitivity = WEATHER_SENSITIVITY;
    }

    match preferences.time_preference {
        TimePreference::AvoidPeakHours => weights.avoid_peak_hours = true,
        TimePreference::StrictTiming => weights.time *= STRICT_TIMING_MULTIPLIER,
        TimePreference::FlexibleTiming => {}
    }

    weights
}

/// Check a preference set, reporting the first rule it breaks.
pub fn check(preferences: &PreferenceSet) -> EngineResult<()> {
    if preferences.has(RoutePreference::Speed) && preferences.has(RoutePreference::EcoFriendly) {
        return Err(
            EngineError::validation("speed and eco_friendly preferences conflict")
                .with_details(json!({ "rule": "conflicting_preferences" })),
        );
    }

    if let Some(threshold) = preferences.eco_score_threshold {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(EngineError::validation(format!(
                "eco score threshold {} outside [0, 100]",
                threshold
            ))
            .with_details(json!({ "rule": "eco_score_threshold", "value": threshold })));
        }
    }

    if let Some(ceiling) = preferences.max_emissions_threshold {
        if ceiling.is_nan() || ceiling < 0.0 {
            return Err(EngineError::validation(format!(
                "max emissions threshold {} is negative",
                ceiling
            ))
            .with_details(json!({ "rule": "max_emissions_threshold", "value": ceiling })));
        }
    }

    if !(1..=5).contains(&preferences.max_route_options) {
        return Err(EngineError::validation(format!(
            "max_route_options {} outside 1-5",
            preferences.max_route_options
        ))
        .with_details(json!({
            "rule": "max_route_options",
            "value": preferences.max_route_options
        })));
    }

    Ok(())
}

pub fn validate(preferences: &PreferenceSet) -> bool {
    check(preferences).is_ok()
}

/// Field-by-field, last writer wins. No deep merge of list fields.
pub fn merge(base: &PreferenceSet, patch: &PreferencePatch) -> PreferenceSet {
    let mut merged = base.clone();
    if let Some(user_id) = &patch.user_id {
        merged.user_id = user_id.clone();
    }
    if let Some(route_preferences) = &patch.route_preferences {
        merged.route_preferences = route_preferences.clone();
    }
    if let Some(weather) = patch.weather_preference {
        merged.weather_preference = weather;
    }
    if let Some(time) = patch.time_preference {
        merged.time_preference = time;
    }
    if let Some(options) = patch.max_route_options {
        merged.max_route_options = options;
    }
    if let Some(types) = &patch.preferred_vehicle_types {
        merged.preferred_vehicle_types = Some(types.clone());
    }
    if let Some(threshold) = patch.eco_score_threshold {
        merged.eco_score_threshold = Some(threshold);
    }
    if let Some(ceiling) = patch.max_emissions_threshold {
        merged.max_emissions_threshold = Some(ceiling);
    }
    if let Some(networks) = &patch.preferred_charging_networks {
        merged.preferred_charging_networks = Some(networks.clone());
    }
    merged
}
