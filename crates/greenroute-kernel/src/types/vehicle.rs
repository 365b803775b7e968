use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Vehicle class used for emission factors and the predictor's type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    LightDuty,
    MediumDuty,
    HeavyDuty,
    Electric,
    Hybrid,
    /// Any tag the engine does not know about
    #[serde(other)]
    Unknown,
}

impl VehicleType {
    /// Every known class, in feature-code order.
    pub const KNOWN: [VehicleType; 5] = [
        VehicleType::LightDuty,
        VehicleType::MediumDuty,
        VehicleType::HeavyDuty,
        VehicleType::Electric,
        VehicleType::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::LightDuty => "light_duty",
            VehicleType::MediumDuty => "medium_duty",
            VehicleType::HeavyDuty => "heavy_duty",
            VehicleType::Electric => "electric",
            VehicleType::Hybrid => "hybrid",
            VehicleType::Unknown => "unknown",
        }
    }

    /// Categorical code fed to the predictor. Unknown types share code 0.
    pub fn feature_code(&self) -> f64 {
        match self {
            VehicleType::LightDuty | VehicleType::Unknown => 0.0,
            VehicleType::MediumDuty => 1.0,
            VehicleType::HeavyDuty => 2.0,
            VehicleType::Electric => 3.0,
            VehicleType::Hybrid => 4.0,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; unrecognised tags parse as [`VehicleType::Unknown`].
impl FromStr for VehicleType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "light_duty" => VehicleType::LightDuty,
            "medium_duty" => VehicleType::MediumDuty,
            "heavy_duty" => VehicleType::HeavyDuty,
            "electric" => VehicleType::Electric,
            "hybrid" => VehicleType::Hybrid,
            _ => VehicleType::Unknown,
        })
    }
}

/// A delivery vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub cargo_capacity: f64,
    #[serde(default)]
    pub current_load: f64,
    /// Kilometres per litre of fuel
    pub fuel_efficiency: f64,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, vehicle_type: VehicleType, cargo_capacity: f64) -> Self {
        Self {
            id: id.into(),
            vehicle_type,
            cargo_capacity,
            current_load: 0.0,
            fuel_efficiency: 10.0,
        }
    }

    pub fn with_load(mut self, load: f64) -> Self {
        self.current_load = load;
        self
    }

    pub fn with_fuel_efficiency(mut self, km_per_litre: f64) -> Self {
        self.fuel_efficiency = km_per_litre;
        self
    }

    /// current / capacity, 0 when capacity is not positive.
    pub fn load_ratio(&self) -> f64 {
        if self.cargo_capacity > 0.0 {
            self.current_load / self.cargo_capacity
        } else {
            0.0
        }
    }

    /// `0 ≤ current_load ≤ cargo_capacity`.
    pub fn check_load(&self) -> EngineResult<()> {
        if self.current_load < 0.0 || self.current_load > self.cargo_capacity {
            return Err(EngineError::validation(format!(
                "vehicle {} load {} exceeds capacity {}",
                self.id, self.current_load, self.cargo_capacity
            ))
            .with_details(serde_json::json!({
                "current_load": self.current_load,
                "cargo_capacity": self.cargo_capacity,
            })));
        }
        Ok(())
    }
}
