use super::location::Location;
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stops between origin and destination.
pub const MAX_INTERMEDIATE_WAYPOINTS: usize = 10;

/// Route geometry as returned by the routing provider.
///
/// Scoring never mutates a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    /// Origin first, destination last
    pub waypoints: Vec<Location>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        waypoints: Vec<Location>,
        total_distance_km: f64,
        total_duration_min: f64,
    ) -> Self {
        Self {
            id: id.into(),
            waypoints,
            total_distance_km,
            total_duration_min,
            departure_time: None,
        }
    }

    pub fn with_departure(mut self, departure: DateTime<Utc>) -> Self {
        self.departure_time = Some(departure);
        self
    }

    pub fn origin(&self) -> Option<&Location> {
        self.waypoints.first()
    }

    pub fn destination(&self) -> Option<&Location> {
        self.waypoints.last()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.total_distance_km.is_finite() && self.total_distance_km > 0.0) {
            return Err(EngineError::validation(format!(
                "route {} has non-positive distance {}",
                self.id, self.total_distance_km
            )));
        }
        if !(self.total_duration_min.is_finite() && self.total_duration_min > 0.0) {
            return Err(EngineError::validation(format!(
                "route {} has non-positive duration {}",
                self.id, self.total_duration_min
            )));
        }
        if self.waypoints.len() < 2 {
            return Err(EngineError::validation(format!(
                "route {} needs an origin and a destination",
                self.id
            )));
        }
        if self.waypoints.len() - 2 > MAX_INTERMEDIATE_WAYPOINTS {
            return Err(EngineError::validation(format!(
                "maximum of {} waypoints allowed",
                MAX_INTERMEDIATE_WAYPOINTS
            ))
            .with_details(serde_json::json!({ "waypoints": self.waypoints.len() - 2 })));
        }
        for point in &self.waypoints {
            point.validate()?;
        }
        Ok(())
    }
}
