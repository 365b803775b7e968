//! Deterministic emissions model
//!
//! Base emissions are distance times a per-class emission factor; weather
//! and traffic each contribute an independent multiplicative factor.

use greenroute_kernel::{Route, TrafficSnapshot, Vehicle, VehicleType, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// Grams of CO₂ per kilometre for a vehicle class.
///
/// Unknown classes fall back to the medium-duty factor.
pub fn emission_factor(vehicle_type: VehicleType) -> f64 {
    match vehicle_type {
        VehicleType::LightDuty => 147.0,
        VehicleType::MediumDuty | VehicleType::Unknown => 271.0,
        VehicleType::HeavyDuty => 857.0,
        VehicleType::Electric => 0.0,
        VehicleType::Hybrid => 92.0,
    }
}

/// Weather multiplier, starting from 1.0.
pub fn weather_factor(weather: &WeatherSnapshot) -> f64 {
    let mut factor = 1.0;
    if weather.temperature < 0.0 {
        factor *= 1.2;
    } else if weather.temperature > 30.0 {
        factor *= 1.1;
    }
    if weather.rain > 0.0 {
        factor *= 1.15;
    }
    if weather.snow > 0.0 {
        factor *= 1.25;
    }
    factor
}

/// Traffic multiplier: a step function of congestion, highest band wins.
pub fn traffic_factor(traffic: &TrafficSnapshot) -> f64 {
    let congestion = traffic.congestion_level;
    if congestion > 80.0 {
        1.5
    } else if congestion > 50.0 {
        1.3
    } else if congestion > 20.0 {
        1.1
    } else {
        1.0
    }
}

/// Eco score in [0, 100] for an emission intensity in g/km.
///
/// 100 is emission free, 0 is at or beyond the heavy-duty factor.
pub fn eco_score(grams_per_km: f64) -> f64 {
    let worst = emission_factor(VehicleType::HeavyDuty);
    (100.0 * (1.0 - grams_per_km / worst)).clamp(0.0, 100.0)
}

/// Output of [`EmissionsModel::estimate`]. Masses are in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsEstimate {
    pub total_emissions_kg: f64,
    pub base_emissions_kg: f64,
    pub weather_factor: f64,
    pub traffic_factor: f64,
    pub route_length_km: f64,
    pub vehicle_type: VehicleType,
}

impl EmissionsEstimate {
    /// Eco score of this estimate, from its effective g/km.
    pub fn eco_score(&self) -> f64 {
        if self.route_length_km <= 0.0 {
            return 100.0;
        }
        eco_score(self.total_emissions_kg * 1000.0 / self.route_length_km)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    VehicleChange,
    Timing,
}

/// One way to cut the emissions of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub suggestion: String,
    pub potential_savings_kg: f64,
    /// Target class for vehicle changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
}

/// Share of total emissions assumed recoverable by leaving off-peak.
const OFF_PEAK_SAVINGS: f64 = 0.2;

/// Traffic factor above which rescheduling is suggested.
const RESCHEDULE_TRAFFIC_FACTOR: f64 = 1.2;

/// Stateless emissions calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct EmissionsModel;

impl EmissionsModel {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
    ) -> EmissionsEstimate {
        let base_g = route.total_distance_km * emission_factor(vehicle.vehicle_type);
        let weather_factor = weather_factor(weather);
        let traffic_factor = traffic_factor(traffic);
        let total_g = base_g * weather_factor * traffic_factor;

        EmissionsEstimate {
            total_emissions_kg: total_g / 1000.0,
            base_emissions_kg: base_g / 1000.0,
            weather_factor,
            traffic_factor,
            route_length_km: route.total_distance_km,
            vehicle_type: vehicle.vehicle_type,
        }
    }

    pub fn suggest_reductions(
        &self,
        route: &Route,
        vehicle: &Vehicle,
        current: &EmissionsEstimate,
    ) -> Vec<ReductionSuggestion> {
        let current_factor = emission_factor(vehicle.vehicle_type);
        let mut suggestions: Vec<ReductionSuggestion> = VehicleType::KNOWN
            .iter()
            .filter(|candidate| **candidate != vehicle.vehicle_type)
            .filter_map(|candidate| {
                let savings =
                    (current_factor - emission_factor(*candidate)) * route.total_distance_km / 1000.0;
                (savings > 0.0).then(|| ReductionSuggestion {
                    kind: SuggestionKind::VehicleChange,
                    suggestion: format!("Consider using a {} vehicle", candidate),
                    potential_savings_kg: savings,
                    vehicle_type: Some(*candidate),
                })
            })
            .collect();

        if current.traffic_factor > RESCHEDULE_TRAFFIC_FACTOR {
            suggestions.push(ReductionSuggestion {
                kind: SuggestionKind::Timing,
                suggestion: "Consider rescheduling to avoid peak traffic hours".to_string(),
                potential_savings_kg: current.total_emissions_kg * OFF_PEAK_SAVINGS,
                vehicle_type: None,
            });
        }

        suggestions
    }
}
