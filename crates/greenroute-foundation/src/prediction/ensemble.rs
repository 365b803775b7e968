//! Bagged regression forest
//!
//! Growth is append-only: [`Forest::grow`] adds members fitted on a new
//! batch alone and never revisits existing ones, so the ensemble leans
//! toward whichever batches were appended, regardless of their size or age.

use super::features::FeatureVector;
use super::tree::{RegressionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Below this magnitude the member mean is treated as zero.
const MEAN_EPSILON: f64 = 1e-9;

/// What a forest predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    TrafficDelay,
    Emissions,
    Duration,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::TrafficDelay, Target::Emissions, Target::Duration];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::TrafficDelay => "traffic",
            Target::Emissions => "emissions",
            Target::Duration => "duration",
        }
    }

    /// File name of the persisted forest.
    pub fn artifact(&self) -> &'static str {
        match self {
            Target::TrafficDelay => "traffic_model.bin",
            Target::Emissions => "emissions_model.bin",
            Target::Duration => "duration_model.bin",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forest hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Members fitted by a full train
    pub n_trees: usize,
    /// Members appended by each incremental update
    pub growth_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Base seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        let tree = TreeParams::default();
        Self {
            n_trees: 100,
            growth_trees: 10,
            max_depth: tree.max_depth,
            min_samples_split: tree.min_samples_split,
            min_samples_leaf: tree.min_samples_leaf,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }

    fn member_rng(&self, member: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ (member as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Mean of member predictions plus a dispersion-based confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub mean: f64,
    pub std_dev: f64,
    /// `1 - std/mean`, clamped to [0, 1]
    pub confidence: f64,
}

impl MemberSummary {
    pub fn from_predictions(predictions: &[f64]) -> Self {
        if predictions.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                confidence: 0.0,
            };
        }
        let n = predictions.len() as f64;
        let mean = predictions.iter().sum::<f64>() / n;
        let var = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = var.sqrt();
        Self {
            mean,
            std_dev,
            confidence: dispersion_confidence(mean, std_dev),
        }
    }
}

/// `1 - std/|mean|` clamped to [0, 1].
///
/// A zero mean gives full confidence when members agree and none otherwise.
pub fn dispersion_confidence(mean: f64, std_dev: f64) -> f64 {
    if mean.abs() < MEAN_EPSILON {
        return if std_dev < MEAN_EPSILON { 1.0 } else { 0.0 };
    }
    (1.0 - std_dev / mean.abs()).clamp(0.0, 1.0)
}

/// Bagged ensemble of regression trees for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    target: Target,
    /// Fingerprint of the scaler the inputs were standardised with
    scaler_id: Uuid,
    trees: Vec<RegressionTree>,
    examples_seen: usize,
}

impl Forest {
    /// Fit `params.n_trees` members on scaled rows `x`.
    pub fn fit(
        target: Target,
        scaler_id: Uuid,
        x: &[FeatureVector],
        y: &[f64],
        params: &ForestParams,
    ) -> Self {
        let mut forest = Self {
            target,
            scaler_id,
            trees: Vec::with_capacity(params.n_trees),
            examples_seen: 0,
        };
        forest.append(x, y, params.n_trees, params);
        forest
    }

    /// Append `params.growth_trees` members fitted on this batch only.
    pub fn grow(&mut self, x: &[FeatureVector], y: &[f64], params: &ForestParams) {
        self.append(x, y, params.growth_trees, params);
    }

    fn append(&mut self, x: &[FeatureVector], y: &[f64], count: usize, params: &ForestParams) {
        let n = x.len();
        if n == 0 {
            return;
        }
        let tree_params = params.tree_params();
        for _ in 0..count {
            let mut rng = params.member_rng(self.trees.len());
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            self.trees
                .push(RegressionTree::fit(x, y, &sample, &tree_params));
        }
        self.examples_seen += n;
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn scaler_id(&self) -> Uuid {
        self.scaler_id
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn examples_seen(&self) -> usize {
        self.examples_seen
    }

    pub fn member_predictions(&self, row: &FeatureVector) -> Vec<f64> {
        self.trees.iter().map(|tree| tree.predict(row)).collect()
    }

    pub fn predict(&self, row: &FeatureVector) -> MemberSummary {
        MemberSummary::from_predictions(&self.member_predictions(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::features::FEATURE_COUNT;

    fn data(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
        let x: Vec<FeatureVector> = (0..n)
            .map(|i| {
                let mut r = [0.0; FEATURE_COUNT];
                r[3] = i as f64;
                r
            })
            .collect();
        let y = (0..n).map(|i| 2.0 * i as f64 + 5.0).collect();
        (x, y)
    }

    #[test]
    fn fit_then_grow_member_counts() {
        let (x, y) = data(30);
        let params = ForestParams::default();
        let mut forest = Forest::fit(Target::Duration, Uuid::new_v4(), &x, &y, &params);
        assert_eq!(forest.len(), 100);

        forest.grow(&x[..5], &y[..5], &params);
        assert_eq!(forest.len(), 110);
        assert_eq!(forest.examples_seen(), 35);
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let (x, y) = data(20);
        let params = ForestParams {
            n_trees: 8,
            ..ForestParams::default()
        };
        let id = Uuid::new_v4();
        let a = Forest::fit(Target::Emissions, id, &x, &y, &params);
        let b = Forest::fit(Target::Emissions, id, &x, &y, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn predictions_track_the_target() {
        let (x, y) = data(40);
        let forest = Forest::fit(
            Target::TrafficDelay,
            Uuid::new_v4(),
            &x,
            &y,
            &ForestParams::default(),
        );
        let summary = forest.predict(&x[20]);
        assert!((summary.mean - 45.0).abs() < 5.0);
        assert!((0.0..=1.0).contains(&summary.confidence));
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(dispersion_confidence(10.0, 0.0), 1.0);
        assert!((dispersion_confidence(10.0, 2.5) - 0.75).abs() < 1e-12);
        assert_eq!(dispersion_confidence(1.0, 5.0), 0.0);
        assert_eq!(dispersion_confidence(0.0, 0.0), 1.0);
        assert_eq!(dispersion_confidence(0.0, 1.0), 0.0);
        assert!((dispersion_confidence(-4.0, 1.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn artifact_names() {
        let names: Vec<_> = Target::ALL.iter().map(|t| t.artifact()).collect();
        assert_eq!(
            names,
            vec!["traffic_model.bin", "emissions_model.bin", "duration_model.bin"]
        );
    }
}
