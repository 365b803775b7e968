//! Shared fixtures for the foundation integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use greenroute_foundation::prediction::HistoricalExample;
use greenroute_kernel::{Location, Route, VehicleType};

pub fn nyc() -> Location {
    Location::new(40.7128, -74.006)
}

pub fn midtown() -> Location {
    Location::new(40.7614, -73.9776)
}

/// A route leaving at 10:00 UTC on a Tuesday.
pub fn route(id: &str, km: f64, minutes: f64) -> Route {
    Route::new(id, vec![nyc(), midtown()], km, minutes)
        .with_departure(Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap())
}

/// Synthetic history where emissions and duration grow with distance.
pub fn history(n: usize) -> Vec<HistoricalExample> {
    (0..n)
        .map(|i| {
            let km = 5.0 + i as f64;
            let vehicle_type = VehicleType::KNOWN[i % VehicleType::KNOWN.len()];
            HistoricalExample {
                hour: (6 + i % 14) as u32,
                day_of_week: (i % 7) as u32,
                is_holiday: false,
                distance_km: km,
                vehicle_type,
                load_ratio: 0.1 * (i % 10) as f64,
                temperature: 10.0 + (i % 20) as f64,
                precipitation: 0.0,
                wind_speed: 2.0,
                air_quality_index: 40.0 + (i % 30) as f64,
                traffic_delay: (i % 6) as f64,
                total_emissions: km * 0.2,
                total_duration: km * 1.5 + (i % 6) as f64,
            }
        })
        .collect()
}
