//! Contracts for the external providers the engine consumes.
//!
//! Route geometry and environmental signals come from third-party services;
//! the engine only scores what these providers return.

use crate::error::EngineResult;
use crate::types::{AirQualitySnapshot, Location, Route, TrafficSnapshot, WeatherSnapshot};
use async_trait::async_trait;

/// Routing provider returning geometry, distance and duration.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Provider name used in logs and error details
    fn name(&self) -> &str;

    /// Candidate routes between two points, optionally through waypoints.
    async fn routes(
        &self,
        origin: &Location,
        destination: &Location,
        waypoints: &[Location],
    ) -> EngineResult<Vec<Route>>;
}

/// Weather, traffic and air-quality source.
///
/// Failures should be reported as
/// [`ErrorKind::ExternalSignal`](crate::error::ErrorKind::ExternalSignal).
#[async_trait]
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn weather(&self, at: &Location) -> EngineResult<WeatherSnapshot>;

    async fn traffic(&self, from: &Location, to: &Location) -> EngineResult<TrafficSnapshot>;

    async fn air_quality(&self, at: &Location) -> EngineResult<AirQualitySnapshot>;
}
