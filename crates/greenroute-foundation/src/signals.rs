//! Read-through access to environmental signals
//!
//! [`SignalHub`] checks the [`SignalCache`] first, asks the
//! [`SignalProvider`] on a miss and writes the answer back. The lookups for
//! one route run concurrently.

use crate::cache::SignalCache;
use async_trait::async_trait;
use greenroute_kernel::provider::SignalProvider;
use greenroute_kernel::{
    AirQualitySnapshot, EngineError, EngineResult, ErrorKind, Location, Route, TrafficSnapshot,
    WeatherSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Signals needed to score one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSignals {
    #[serde(default)]
    pub weather: WeatherSnapshot,
    #[serde(default)]
    pub traffic: TrafficSnapshot,
    #[serde(default)]
    pub air_quality: AirQualitySnapshot,
}

pub struct SignalHub {
    cache: Arc<SignalCache>,
    provider: Arc<dyn SignalProvider>,
}

impl SignalHub {
    pub fn new(cache: Arc<SignalCache>, provider: Arc<dyn SignalProvider>) -> Self {
        Self { cache, provider }
    }

    pub fn cache(&self) -> &Arc<SignalCache> {
        &self.cache
    }

    fn provider_error(&self, err: EngineError) -> EngineError {
        if err.is(ErrorKind::ExternalSignal) {
            err
        } else {
            EngineError::external_signal(self.provider.name(), err.message)
        }
    }

    pub async fn weather(&self, at: &Location) -> EngineResult<WeatherSnapshot> {
        if let Some(weather) = self.cache.weather(at).await {
            return Ok(weather);
        }
        debug!("Weather miss for {}, asking {}", at, self.provider.name());
        let weather = self
            .provider
            .weather(at)
            .await
            .map_err(|e| self.provider_error(e))?;
        self.cache.set_weather(at, &weather).await;
        Ok(weather)
    }

    pub async fn traffic(&self, from: &Location, to: &Location) -> EngineResult<TrafficSnapshot> {
        if let Some(traffic) = self.cache.traffic(from, to).await {
            return Ok(traffic);
        }
        debug!("Traffic miss for {} -> {}, asking {}", from, to, self.provider.name());
        let traffic = self
            .provider
            .traffic(from, to)
            .await
            .map_err(|e| self.provider_error(e))?;
        self.cache.set_traffic(from, to, &traffic).await;
        Ok(traffic)
    }

    pub async fn air_quality(&self, at: &Location) -> EngineResult<AirQualitySnapshot> {
        if let Some(aq) = self.cache.air_quality(at).await {
            return Ok(aq);
        }
        debug!("Air quality miss for {}, asking {}", at, self.provider.name());
        let aq = self
            .provider
            .air_quality(at)
            .await
            .map_err(|e| self.provider_error(e))?;
        self.cache.set_air_quality(at, &aq).await;
        Ok(aq)
    }

    /// Weather and air quality at the origin, traffic along origin → destination.
    pub async fn for_route(&self, route: &Route) -> EngineResult<RouteSignals> {
        let (Some(origin), Some(destination)) = (route.origin(), route.destination()) else {
            return Err(EngineError::validation(format!(
                "route {} has no waypoints",
                route.id
            )));
        };
        let (weather, traffic, air_quality) = futures::try_join!(
            self.weather(origin),
            self.traffic(origin, destination),
            self.air_quality(origin),
        )?;
        Ok(RouteSignals {
            weather,
            traffic,
            air_quality,
        })
    }
}

/// Provider answering every lookup with the same snapshots
///
/// Useful for offline scoring and tests. Counts calls and can be switched
/// into a failing mode.
pub struct StaticSignalProvider {
    name: String,
    signals: RouteSignals,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticSignalProvider {
    pub fn new(signals: RouteSignals) -> Self {
        Self {
            name: "static".to_string(),
            signals,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: &T) -> EngineResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::external_signal(&self.name, "service unavailable"));
        }
        Ok(value.clone())
    }
}

#[async_trait]
impl SignalProvider for StaticSignalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn weather(&self, _at: &Location) -> EngineResult<WeatherSnapshot> {
        self.answer(&self.signals.weather)
    }

    async fn traffic(&self, _from: &Location, _to: &Location) -> EngineResult<TrafficSnapshot> {
        self.answer(&self.signals.traffic)
    }

    async fn air_quality(&self, _at: &Location) -> EngineResult<AirQualitySnapshot> {
        self.answer(&self.signals.air_quality)
    }
}
