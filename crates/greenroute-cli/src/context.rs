//! Shared state for command execution

use crate::output::OutputFormat;
use anyhow::Context;
use greenroute_foundation::EngineConfig;
use greenroute_foundation::prediction::{PredictionEngine, SCALER_ARTIFACT};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL_DIR: &str = "models";

pub struct CliContext {
    pub config: EngineConfig,
    pub output: OutputFormat,
}

impl CliContext {
    /// Load the engine configuration, or fall back to defaults plus env overrides.
    pub fn new(config_path: Option<&Path>, output: OutputFormat) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => {
                let path = path
                    .to_str()
                    .with_context(|| format!("config path {} is not UTF-8", path.display()))?;
                EngineConfig::load(path)?
            }
            None => EngineConfig::from_env()?,
        };
        Ok(Self { config, output })
    }

    /// `--model-dir`, then `model_dir` from config, then `./models`.
    pub fn model_dir(&self, arg: Option<&Path>) -> PathBuf {
        arg.map(Path::to_path_buf)
            .or_else(|| self.config.model_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR))
    }

    /// Whether `dir` holds a saved bundle, judged by its scaler artifact.
    pub fn has_bundle(dir: &Path) -> bool {
        dir.join(SCALER_ARTIFACT).is_file()
    }

    /// A fresh engine configured from the loaded config.
    pub fn engine(&self) -> PredictionEngine {
        PredictionEngine::new(self.config.forest.clone())
            .with_holidays(self.config.holiday_calendar())
    }

    /// An engine restored from `dir`.
    pub fn restored_engine(&self, dir: &Path) -> anyhow::Result<PredictionEngine> {
        let engine = self.engine();
        engine
            .restore(dir)
            .map_err(|report| anyhow::anyhow!("{report:?}"))
            .with_context(|| format!("failed to load models from {}", dir.display()))?;
        Ok(engine)
    }
}

/// Read and decode a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
