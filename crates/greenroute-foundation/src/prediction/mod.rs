//! Prediction engine
//!
//! Bagged regression forests over a fixed ten-feature vector, one per
//! target (traffic delay, emissions, duration), sharing a feature scaler.
//! Supports full training, append-only incremental growth, a
//! dispersion-based confidence per target and bundle persistence.

pub mod bundle;
pub mod engine;
pub mod ensemble;
pub mod features;
pub mod scaler;
pub mod tree;

pub use bundle::{SCALER_ARTIFACT, TrainedModels};
pub use engine::{ConfidenceScores, EngineStatus, ModelState, PredictionEngine, RoutePrediction};
pub use ensemble::{Forest, ForestParams, MemberSummary, Target, dispersion_confidence};
pub use features::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, HistoricalExample, HolidayCalendar,
};
pub use scaler::FeatureScaler;
