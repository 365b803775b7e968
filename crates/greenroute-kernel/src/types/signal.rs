//! Externally sourced, time-decaying observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category of a cached signal. Each category has its own expiry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Traffic,
    Weather,
    AirQuality,
    Route,
    Vehicle,
    UserPreferences,
    MlPrediction,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 7] = [
        SignalCategory::Traffic,
        SignalCategory::Weather,
        SignalCategory::AirQuality,
        SignalCategory::Route,
        SignalCategory::Vehicle,
        SignalCategory::UserPreferences,
        SignalCategory::MlPrediction,
    ];

    /// Tag used both in payloads and as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Traffic => "traffic",
            SignalCategory::Weather => "weather",
            SignalCategory::AirQuality => "air_quality",
            SignalCategory::Route => "route",
            SignalCategory::Vehicle => "vehicle",
            SignalCategory::UserPreferences => "user_preferences",
            SignalCategory::MlPrediction => "ml_prediction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cached observation: what it is, where it applies and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub category: SignalCategory,
    pub key: String,
    pub payload: serde_json::Value,
    pub captured_at: DateTime<Utc>,
}

impl Signal {
    pub fn new(category: SignalCategory, key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            category,
            key: key.into(),
            payload,
            captured_at: Utc::now(),
        }
    }
}

fn default_temperature() -> f64 {
    20.0
}

fn default_aqi() -> f64 {
    50.0
}

/// Weather at a location. Absent fields take neutral defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Degrees Celsius
    #[serde(default = "default_temperature", alias = "temp")]
    pub temperature: f64,
    /// Rain volume, mm
    #[serde(default)]
    pub rain: f64,
    /// Snow volume, mm
    #[serde(default)]
    pub snow: f64,
    /// Total precipitation, mm
    #[serde(default)]
    pub precipitation: f64,
    /// m/s
    #[serde(default)]
    pub wind_speed: f64,
    /// Percent
    #[serde(default)]
    pub humidity: f64,
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            rain: 0.0,
            snow: 0.0,
            precipitation: 0.0,
            wind_speed: 0.0,
            humidity: 0.0,
        }
    }
}

impl WeatherSnapshot {
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = celsius;
        self
    }

    pub fn with_rain(mut self, mm: f64) -> Self {
        self.rain = mm;
        self
    }

    pub fn with_snow(mut self, mm: f64) -> Self {
        self.snow = mm;
        self
    }
}

/// Traffic along a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// 0 (free flow) to 100 (standstill)
    #[serde(default)]
    pub congestion_level: f64,
    /// Average speed, km/h
    #[serde(default)]
    pub speed: Option<f64>,
}

impl TrafficSnapshot {
    pub fn with_congestion(level: f64) -> Self {
        Self {
            congestion_level: level,
            speed: None,
        }
    }
}

/// Air quality at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySnapshot {
    #[serde(default = "default_aqi")]
    pub aqi: f64,
    #[serde(default)]
    pub pollutants: HashMap<String, f64>,
}

impl Default for AirQualitySnapshot {
    fn default() -> Self {
        Self {
            aqi: default_aqi(),
            pollutants: HashMap::new(),
        }
    }
}

impl AirQualitySnapshot {
    pub fn with_aqi(aqi: f64) -> Self {
        Self {
            aqi,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tags_round_trip() {
        for category in SignalCategory::ALL {
            assert_eq!(SignalCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(SignalCategory::parse("aqi"), None);
    }

    #[test]
    fn weather_defaults_fill_missing_fields() {
        let weather: WeatherSnapshot = serde_json::from_str(r#"{"temp": -5}"#).unwrap();
        assert_eq!(weather.temperature, -5.0);
        assert_eq!(weather.rain, 0.0);

        let empty: WeatherSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, WeatherSnapshot::default());
    }

    #[test]
    fn air_quality_defaults_to_fifty() {
        let aq: AirQualitySnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(aq.aqi, 50.0);
    }
}
