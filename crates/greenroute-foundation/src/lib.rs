//! GreenRoute foundation.
//!
//! The engine proper: a fail-open [`cache::SignalCache`] in front of the
//! signal store, the deterministic [`emissions`] model, the [`preferences`]
//! resolver, the tree-ensemble [`prediction`] engine and the
//! [`scoring::ScoringOrchestrator`] that combines them.

// cache module - time-bounded signal storage
pub mod cache;

// emissions module - deterministic CO₂ estimate
pub mod emissions;

// preferences module - weights, validation, merging
pub mod preferences;

// prediction module - bagged regression forests
pub mod prediction;

// signals module - read-through signal lookup
pub mod signals;

// staging module - pending training examples and feedback
pub mod staging;

// scoring module
pub mod scoring;

// config module
pub mod config;

pub use cache::{CacheConfig, CacheStats, InMemorySignalStore, SignalCache, TtlTable};
pub use config::EngineConfig;
pub use emissions::{EmissionsEstimate, EmissionsModel, ReductionSuggestion, SuggestionKind};
pub use prediction::{
    EngineStatus, ForestParams, HistoricalExample, HolidayCalendar, ModelState, PredictionEngine,
    RoutePrediction,
};
pub use preferences::{PreferencePatch, PreferenceSet, WeightVector};
pub use scoring::{
    RankedScore, ScoreBreakdown, ScoringConfig, ScoringOrchestrator, SignalFailurePolicy,
};
pub use signals::{RouteSignals, SignalHub, StaticSignalProvider};
pub use staging::{InMemoryDocumentStore, RouteFeedback, TrainingStage};
