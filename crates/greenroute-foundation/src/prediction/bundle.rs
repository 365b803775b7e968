//! Persisted model bundle
//!
//! Four artifacts, always written and read together:
//! `traffic_model.bin`, `emissions_model.bin`, `duration_model.bin` and
//! `scaler.bin`, each bincode encoded. Every artifact is first written under
//! a `.tmp` name; the renames happen only once all four are on disk.

use super::ensemble::{Forest, Target};
use super::scaler::FeatureScaler;
use error_stack::{Report, ResultExt};
use greenroute_kernel::{EngineError, EngineReport, EngineResult, IntoEngineReport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SCALER_ARTIFACT: &str = "scaler.bin";

/// Everything a trained engine needs to predict.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModels {
    pub scaler: FeatureScaler,
    pub traffic: Forest,
    pub emissions: Forest,
    pub duration: Forest,
}

impl TrainedModels {
    pub fn forest(&self, target: Target) -> &Forest {
        match target {
            Target::TrafficDelay => &self.traffic,
            Target::Emissions => &self.emissions,
            Target::Duration => &self.duration,
        }
    }

    pub fn forest_mut(&mut self, target: Target) -> &mut Forest {
        match target {
            Target::TrafficDelay => &mut self.traffic,
            Target::Emissions => &mut self.emissions,
            Target::Duration => &mut self.duration,
        }
    }

    /// Each forest must predict its own target and carry the scaler's fingerprint.
    pub fn verify(&self) -> EngineResult<()> {
        for target in Target::ALL {
            let forest = self.forest(target);
            if forest.target() != target {
                return Err(EngineError::persistence(format!(
                    "{} artifact holds a {} model",
                    target,
                    forest.target()
                )));
            }
            if forest.scaler_id() != self.scaler.id() {
                return Err(EngineError::persistence(format!(
                    "{} model was fitted against a different scaler",
                    target
                ))
                .with_details(json!({
                    "target": target.as_str(),
                    "model_scaler": forest.scaler_id().to_string(),
                    "scaler": self.scaler.id().to_string(),
                })));
            }
        }
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T, name: &str) -> EngineReport<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| EngineError::persistence(format!("encoding {}: {}", name, e)))
        .into_report()
}

fn decode<T: DeserializeOwned>(bytes: &[u8], name: &str) -> EngineReport<T> {
    bincode::deserialize(bytes)
        .map_err(|e| EngineError::persistence(format!("decoding {}: {}", name, e)))
        .into_report()
}

fn tmp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.tmp", name))
}

/// Write the bundle into `dir`, creating it if needed.
pub fn write_bundle(dir: &Path, models: &TrainedModels) -> EngineReport<()> {
    models
        .verify()
        .into_report()
        .attach("refusing to persist an inconsistent model set")?;

    fs::create_dir_all(dir)
        .map_err(EngineError::from)
        .map_err(Report::new)
        .attach(format!("creating {}", dir.display()))?;

    let mut artifacts: Vec<(&str, Vec<u8>)> = Vec::with_capacity(4);
    for target in Target::ALL {
        artifacts.push((target.artifact(), encode(models.forest(target), target.artifact())?));
    }
    artifacts.push((SCALER_ARTIFACT, encode(&models.scaler, SCALER_ARTIFACT)?));

    for (name, bytes) in &artifacts {
        let tmp = tmp_path(dir, name);
        fs::write(&tmp, bytes)
            .map_err(EngineError::from)
            .map_err(Report::new)
            .attach(format!("writing {}", tmp.display()))?;
        debug!("Wrote {} ({} bytes)", tmp.display(), bytes.len());
    }

    for (name, _) in &artifacts {
        fs::rename(tmp_path(dir, name), dir.join(name))
            .map_err(EngineError::from)
            .map_err(Report::new)
            .attach(format!("publishing {}", name))?;
    }

    info!("Persisted model bundle to {}", dir.display());
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> EngineReport<T> {
    let path = dir.join(name);
    let bytes = fs::read(&path)
        .map_err(EngineError::from)
        .map_err(Report::new)
        .attach(format!("reading {}", path.display()))?;
    decode(&bytes, name)
}

/// Read all four artifacts from `dir` and check they belong together.
pub fn read_bundle(dir: &Path) -> EngineReport<TrainedModels> {
    let models = TrainedModels {
        scaler: read_artifact(dir, SCALER_ARTIFACT)?,
        traffic: read_artifact(dir, Target::TrafficDelay.artifact())?,
        emissions: read_artifact(dir, Target::Emissions.artifact())?,
        duration: read_artifact(dir, Target::Duration.artifact())?,
    };
    models
        .verify()
        .into_report()
        .attach(format!("restoring bundle from {}", dir.display()))?;
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::ensemble::ForestParams;
    use crate::prediction::features::{FEATURE_COUNT, FeatureVector};
    use greenroute_kernel::ErrorKind;

    fn models() -> TrainedModels {
        let x: Vec<FeatureVector> = (0..12)
            .map(|i| {
                let mut r = [0.0; FEATURE_COUNT];
                r[3] = i as f64;
                r
            })
            .collect();
        let y: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let scaler = FeatureScaler::fit(&x);
        let params = ForestParams {
            n_trees: 3,
            ..ForestParams::default()
        };
        let scaled = scaler.transform_all(&x);
        TrainedModels {
            traffic: Forest::fit(Target::TrafficDelay, scaler.id(), &scaled, &y, &params),
            emissions: Forest::fit(Target::Emissions, scaler.id(), &scaled, &y, &params),
            duration: Forest::fit(Target::Duration, scaler.id(), &scaled, &y, &params),
            scaler,
        }
    }

    #[test]
    fn round_trip_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let original = models();
        write_bundle(dir.path(), &original).unwrap();

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "duration_model.bin",
                "emissions_model.bin",
                "scaler.bin",
                "traffic_model.bin"
            ]
        );

        assert_eq!(read_bundle(dir.path()).unwrap(), original);
    }

    #[test]
    fn foreign_scaler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), &models()).unwrap();

        let other = models();
        fs::write(
            dir.path().join(SCALER_ARTIFACT),
            bincode::serialize(&other.scaler).unwrap(),
        )
        .unwrap();

        let report = read_bundle(dir.path()).unwrap_err();
        assert_eq!(report.current_context().kind(), ErrorKind::Persistence);
        assert!(report.current_context().message.contains("different scaler"));
    }

    #[test]
    fn missing_artifact_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), &models()).unwrap();
        fs::remove_file(dir.path().join("emissions_model.bin")).unwrap();

        let report = read_bundle(dir.path()).unwrap_err();
        assert!(report.current_context().is(ErrorKind::Persistence));
    }
}
