//! Preference resolver
//!
//! Turns user-stated routing preferences into a [`WeightVector`], checks
//! preference sets for conflicts and merges partial updates.

pub mod resolver;
pub mod types;

pub use resolver::{check, derive_weights, merge, validate};
pub use types::{
    PreferencePatch, PreferenceSet, RoutePreference, TimePreference, WeatherPreference,
    WeightVector, DEFAULT_MAX_ROUTE_OPTIONS,
};
