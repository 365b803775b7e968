use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(&self) -> EngineResult<()> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            return Ok(());
        }
        Err(EngineError::validation(format!("malformed coordinates {}", self))
            .with_details(serde_json::json!({ "lat": self.lat, "lon": self.lon })))
    }

    /// `lat,lon` rendered with `f64`'s `Display`, no rounding.
    ///
    /// Two locations that differ only below the printed precision are still
    /// different keys; `40.0` renders as `40`.
    pub fn key_fragment(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}
