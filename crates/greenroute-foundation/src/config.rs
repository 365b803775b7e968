//! Engine configuration
//!
//! One serde struct covering every tunable of the engine. Every field has a
//! default, so an empty file (or none at all) yields a working engine.

use crate::cache::CacheConfig;
use crate::prediction::{ForestParams, HolidayCalendar};
use crate::scoring::ScoringConfig;
use chrono::NaiveDate;
use greenroute_kernel::EngineResult;
use greenroute_kernel::config::{self, Format};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Prefix for environment overrides, e.g. `GREENROUTE_SCORING__FUEL_PRICE_PER_LITRE`.
pub const ENV_PREFIX: &str = "GREENROUTE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub forest: ForestParams,
    pub scoring: ScoringConfig,
    /// Dates fed to the holiday feature
    pub holidays: Vec<NaiveDate>,
    /// Where the model bundle is persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Load from a file, then apply `GREENROUTE_*` environment overrides.
    pub fn load(path: &str) -> EngineResult<Self> {
        let config: Self = config::load_with_env(path, ENV_PREFIX)?;
        debug!("Loaded engine configuration from {}", path);
        Ok(config)
    }

    /// Parse from a string in the given format.
    pub fn from_str(content: &str, format: Format) -> EngineResult<Self> {
        Ok(config::from_str(content, format)?)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> EngineResult<Self> {
        Ok(config::from_env(ENV_PREFIX)?)
    }

    pub fn holiday_calendar(&self) -> HolidayCalendar {
        HolidayCalendar::from_dates(self.holidays.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::SignalFailurePolicy;
    use greenroute_kernel::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_str("{}", Format::Json).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.scoring.neutral_confidence, 0.5);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = EngineConfig::from_str(
            r#"
holidays = ["2026-12-25", "2027-01-01"]

[cache]
op_timeout_ms = 150

[forest]
n_trees = 40
seed = 7

[scoring]
fuel_price_per_litre = 1.9
signal_failure_policy = "use_defaults"
"#,
            Format::Toml,
        )
        .unwrap();

        assert_eq!(config.cache.op_timeout_ms, 150);
        assert_eq!(config.forest.n_trees, 40);
        assert_eq!(config.forest.growth_trees, 10);
        assert_eq!(config.forest.seed, 7);
        assert_eq!(config.scoring.fuel_price_per_litre, 1.9);
        assert_eq!(config.scoring.driver_cost_per_hour, 25.0);
        assert_eq!(
            config.scoring.signal_failure_policy,
            SignalFailurePolicy::UseDefaults
        );
        let holidays = config.holiday_calendar();
        assert_eq!(holidays.len(), 2);
        assert!(holidays.contains(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()));
    }

    #[test]
    fn load_from_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.yaml");
        fs::write(
            &path,
            "scoring:\n  peak_hour_penalty: 0.5\nmodel_dir: /var/lib/greenroute/models\n",
        )
        .unwrap();

        let config = EngineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.scoring.peak_hour_penalty, 0.5);
        assert_eq!(
            config.model_dir,
            Some(PathBuf::from("/var/lib/greenroute/models"))
        );
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = EngineConfig::load("/nonexistent/engine.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
