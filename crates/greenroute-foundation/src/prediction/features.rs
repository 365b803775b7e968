//! Feature assembly for the predictor
//!
//! The feature vector is positional and fixed:
//!
//! | idx | feature |
//! |-----|---------|
//! | 0 | hour of day |
//! | 1 | day of week (Monday = 0) |
//! | 2 | holiday flag |
//! | 3 | distance, km |
//! | 4 | vehicle type code |
//! | 5 | load ratio |
//! | 6 | temperature, °C |
//! | 7 | precipitation, mm |
//! | 8 | wind speed, m/s |
//! | 9 | air quality index |

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use greenroute_kernel::{
    AirQualitySnapshot, EngineError, EngineResult, Route, Vehicle, VehicleType, WeatherSnapshot,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const FEATURE_COUNT: usize = 10;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "hour",
    "day_of_week",
    "is_holiday",
    "distance_km",
    "vehicle_type",
    "vehicle_load_ratio",
    "temperature",
    "precipitation",
    "wind_speed",
    "air_quality_index",
];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Dates treated as holidays by the `is_holiday` feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn add(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Build the feature vector for a trip departing at `at`.
pub fn assemble(
    route: &Route,
    vehicle: &Vehicle,
    weather: &WeatherSnapshot,
    air_quality: &AirQualitySnapshot,
    at: DateTime<Utc>,
    holidays: &HolidayCalendar,
) -> FeatureVector {
    [
        at.hour() as f64,
        at.weekday().num_days_from_monday() as f64,
        if holidays.contains(at.date_naive()) { 1.0 } else { 0.0 },
        route.total_distance_km,
        vehicle.vehicle_type.feature_code(),
        vehicle.load_ratio(),
        weather.temperature,
        weather.precipitation,
        weather.wind_speed,
        air_quality.aqi,
    ]
}

/// One observed trip: the ten features plus the three targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalExample {
    pub hour: u32,
    pub day_of_week: u32,
    #[serde(default)]
    pub is_holiday: bool,
    pub distance_km: f64,
    pub vehicle_type: VehicleType,
    #[serde(alias = "vehicle_load_ratio")]
    pub load_ratio: f64,
    pub temperature: f64,
    #[serde(default)]
    pub precipitation: f64,
    #[serde(default)]
    pub wind_speed: f64,
    pub air_quality_index: f64,
    /// Minutes of delay attributable to traffic
    pub traffic_delay: f64,
    /// kg CO₂
    pub total_emissions: f64,
    /// Minutes
    pub total_duration: f64,
}

impl HistoricalExample {
    /// Rebuild an example from an assembled feature vector and observed targets.
    pub fn from_features(row: &FeatureVector, traffic_delay: f64, total_emissions: f64, total_duration: f64) -> Self {
        let vehicle_type = VehicleType::KNOWN
            .into_iter()
            .find(|t| t.feature_code() == row[4])
            .unwrap_or(VehicleType::Unknown);
        Self {
            hour: row[0] as u32,
            day_of_week: row[1] as u32,
            is_holiday: row[2] != 0.0,
            distance_km: row[3],
            vehicle_type,
            load_ratio: row[5],
            temperature: row[6],
            precipitation: row[7],
            wind_speed: row[8],
            air_quality_index: row[9],
            traffic_delay,
            total_emissions,
            total_duration,
        }
    }

    pub fn features(&self) -> FeatureVector {
        [
            self.hour as f64,
            self.day_of_week as f64,
            if self.is_holiday { 1.0 } else { 0.0 },
            self.distance_km,
            self.vehicle_type.feature_code(),
            self.load_ratio,
            self.temperature,
            self.precipitation,
            self.wind_speed,
            self.air_quality_index,
        ]
    }

    /// `[traffic_delay, total_emissions, total_duration]`
    pub fn targets(&self) -> [f64; 3] {
        [self.traffic_delay, self.total_emissions, self.total_duration]
    }

    fn check_finite(&self, index: usize) -> EngineResult<()> {
        let bad = self
            .features()
            .iter()
            .zip(FEATURE_NAMES)
            .chain(self.targets().iter().zip(["traffic_delay", "total_emissions", "total_duration"]))
            .find(|(value, _)| !value.is_finite())
            .map(|(_, name)| name);
        match bad {
            Some(name) => Err(EngineError::not_trainable(format!(
                "example {} has a non-finite {}",
                index, name
            ))
            .with_details(serde_json::json!({ "example": index, "field": name }))),
            None => Ok(()),
        }
    }
}

/// Reject an empty batch or one containing non-finite values.
pub fn check_batch(examples: &[HistoricalExample]) -> EngineResult<()> {
    if examples.is_empty() {
        return Err(EngineError::not_trainable("training batch is empty"));
    }
    examples
        .iter()
        .enumerate()
        .try_for_each(|(i, example)| example.check_finite(i))
}
