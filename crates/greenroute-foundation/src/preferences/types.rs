use greenroute_kernel::VehicleType;
use serde::{Deserialize, Serialize};

/// What a user wants the route to favour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePreference {
    EcoFriendly,
    Speed,
    CostEffective,
    EvFriendly,
    AvoidTolls,
    AvoidHighways,
    ScenicRoute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherPreference {
    AvoidSnow,
    AvoidRain,
    AvoidExtremeWeather,
    #[default]
    AnyWeather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePreference {
    AvoidPeakHours,
    #[default]
    FlexibleTiming,
    StrictTiming,
}

pub const DEFAULT_MAX_ROUTE_OPTIONS: u32 = 3;

fn default_max_route_options() -> u32 {
    DEFAULT_MAX_ROUTE_OPTIONS
}

/// A user's stated routing preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    pub user_id: String,
    /// Insertion ordered, no duplicates
    #[serde(default)]
    pub route_preferences: Vec<RoutePreference>,
    #[serde(default)]
    pub weather_preference: WeatherPreference,
    #[serde(default)]
    pub time_preference: TimePreference,
    #[serde(default = "default_max_route_options")]
    pub max_route_options: u32,
    #[serde(default)]
    pub preferred_vehicle_types: Option<Vec<VehicleType>>,
    /// Minimum eco score, 0-100
    #[serde(default)]
    pub eco_score_threshold: Option<f64>,
    /// Emissions ceiling, kg CO₂
    #[serde(default)]
    pub max_emissions_threshold: Option<f64>,
    #[serde(default)]
    pub preferred_charging_networks: Option<Vec<String>>,
}

impl PreferenceSet {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            route_preferences: Vec::new(),
            weather_preference: WeatherPreference::default(),
            time_preference: TimePreference::default(),
            max_route_options: DEFAULT_MAX_ROUTE_OPTIONS,
            preferred_vehicle_types: None,
            eco_score_threshold: None,
            max_emissions_threshold: None,
            preferred_charging_networks: None,
        }
    }

    /// Add a route preference, ignoring duplicates.
    pub fn with_preference(mut self, preference: RoutePreference) -> Self {
        if !self.route_preferences.contains(&preference) {
            self.route_preferences.push(preference);
        }
        self
    }

    pub fn with_weather(mut self, preference: WeatherPreference) -> Self {
        self.weather_preference = preference;
        self
    }

    pub fn with_time(mut self, preference: TimePreference) -> Self {
        self.time_preference = preference;
        self
    }

    pub fn with_max_route_options(mut self, options: u32) -> Self {
        self.max_route_options = options;
        self
    }

    pub fn with_eco_score_threshold(mut self, threshold: f64) -> Self {
        self.eco_score_threshold = Some(threshold);
        self
    }

    pub fn with_max_emissions_threshold(mut self, kg: f64) -> Self {
        self.max_emissions_threshold = Some(kg);
        self
    }

    pub fn with_vehicle_types(mut self, types: Vec<VehicleType>) -> Self {
        self.preferred_vehicle_types = Some(types);
        self
    }

    pub fn has(&self, preference: RoutePreference) -> bool {
        self.route_preferences.contains(&preference)
    }

    /// Whether a vehicle class passes the optional allowlist.
    pub fn allows_vehicle(&self, vehicle_type: VehicleType) -> bool {
        self.preferred_vehicle_types
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&vehicle_type))
    }
}

/// Partial [`PreferenceSet`]: `None` fields leave the base untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencePatch {
    pub user_id: Option<String>,
    pub route_preferences: Option<Vec<RoutePreference>>,
    pub weather_preference: Option<WeatherPreference>,
    pub time_preference: Option<TimePreference>,
    pub max_route_options: Option<u32>,
    pub preferred_vehicle_types: Option<Vec<VehicleType>>,
    pub eco_score_threshold: Option<f64>,
    pub max_emissions_threshold: Option<f64>,
    pub preferred_charging_networks: Option<Vec<String>>,
}

impl From<PreferenceSet> for PreferencePatch {
    fn from(set: PreferenceSet) -> Self {
        Self {
            user_id: Some(set.user_id),
            route_preferences: Some(set.route_preferences),
            weather_preference: Some(set.weather_preference),
            time_preference: Some(set.time_preference),
            max_route_options: Some(set.max_route_options),
            preferred_vehicle_types: set.preferred_vehicle_types,
            eco_score_threshold: set.eco_score_threshold,
            max_emissions_threshold: set.max_emissions_threshold,
            preferred_charging_networks: set.preferred_charging_networks,
        }
    }
}

/// Routing weights derived from a [`PreferenceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub distance: f64,
    pub time: f64,
    pub emissions: f64,
    pub cost: f64,
    /// 1.0 is neutral
    pub weather_sensitivity: f64,
    pub eco_friendly: bool,
    pub speed_priority: bool,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub avoid_peak_hours: bool,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            distance: 1.0,
            time: 1.0,
            emissions: 1.0,
            cost: 1.0,
            weather_sensitivity: 1.0,
            eco_friendly: false,
            speed_priority: false,
            avoid_tolls: false,
            avoid_highways: false,
            avoid_peak_hours: false,
        }
    }
}
