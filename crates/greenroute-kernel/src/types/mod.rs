//! Domain types shared by the engine components.

pub mod location;
pub mod route;
pub mod signal;
pub mod vehicle;

pub use location::Location;
pub use route::{MAX_INTERMEDIATE_WAYPOINTS, Route};
pub use signal::{
    AirQualitySnapshot, Signal, SignalCategory, TrafficSnapshot, WeatherSnapshot,
};
pub use vehicle::{Vehicle, VehicleType};
