//! CART regression tree
//!
//! Nodes live in a flat arena; node 0 is the root. Splits send
//! `row[feature] <= threshold` to the left child.

use super::features::FeatureVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 16,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of samples going left in the sorted order
    left_len: usize,
    sse: f64,
}

impl RegressionTree {
    /// Fit on the rows selected by `sample` (duplicates allowed).
    pub fn fit(x: &[FeatureVector], y: &[f64], sample: &[usize], params: &TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut sample = sample.to_vec();
        if sample.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
            return tree;
        }
        tree.grow(x, y, &mut sample, 0, params);
        tree
    }

    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Grow the subtree for `sample` and return its root index.
    fn grow(
        &mut self,
        x: &[FeatureVector],
        y: &[f64],
        sample: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let id = self.nodes.len();
        let n = sample.len() as f64;
        let mean = sample.iter().map(|&i| y[i]).sum::<f64>() / n;
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth || sample.len() < params.min_samples_split.max(2) {
            return id;
        }

        let parent_sse: f64 = sample.iter().map(|&i| (y[i] - mean).powi(2)).sum();
        if parent_sse <= f64::EPSILON {
            return id;
        }

        let Some(best) = best_split(x, y, sample, params.min_samples_leaf.max(1)) else {
            return id;
        };
        if best.sse >= parent_sse {
            return id;
        }

        sample.sort_by(|&a, &b| x[a][best.feature].total_cmp(&x[b][best.feature]));
        let (left_sample, right_sample) = sample.split_at_mut(best.left_len);
        let left = self.grow(x, y, left_sample, depth + 1, params);
        let right = self.grow(x, y, right_sample, depth + 1, params);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }
}

/// Lowest summed squared error split over every feature and cut point.
fn best_split(
    x: &[FeatureVector],
    y: &[f64],
    sample: &[usize],
    min_leaf: usize,
) -> Option<BestSplit> {
    let n = sample.len();
    if n < 2 * min_leaf {
        return None;
    }
    let total: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();

    let mut best: Option<BestSplit> = None;
    let mut order = sample.to_vec();

    for feature in 0..x.first().map_or(0, |row| row.len()) {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let yi = y[order[k - 1]];
            left_sum += yi;
            left_sq += yi * yi;

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lo = x[order[k - 1]][feature];
            let hi = x[order[k]][feature];
            if lo >= hi {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                best = Some(BestSplit {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    left_len: k,
                    sse,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::features::FEATURE_COUNT;

    fn row(v: f64) -> FeatureVector {
        let mut r = [0.0; FEATURE_COUNT];
        r[3] = v;
        r
    }

    #[test]
    fn learns_a_step() {
        let x: Vec<_> = (0..10).map(|i| row(i as f64)).collect();
        let y: Vec<_> = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();
        let all: Vec<_> = (0..10).collect();

        let tree = RegressionTree::fit(&x, &y, &all, &TreeParams::default());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&row(2.0)), 1.0);
        assert_eq!(tree.predict(&row(4.5)), 1.0);
        assert_eq!(tree.predict(&row(5.0)), 9.0);
        assert_eq!(tree.predict(&row(100.0)), 9.0);
    }

    #[test]
    fn constant_target_is_a_single_leaf() {
        let x: Vec<_> = (0..6).map(|i| row(i as f64)).collect();
        let y = vec![3.0; 6];
        let all: Vec<_> = (0..6).collect();
        let tree = RegressionTree::fit(&x, &y, &all, &TreeParams::default());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&row(42.0)), 3.0);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x: Vec<_> = (0..32).map(|i| row(i as f64)).collect();
        let y: Vec<_> = (0..32).map(|i| i as f64).collect();
        let all: Vec<_> = (0..32).collect();
        let params = TreeParams {
            max_depth: 2,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, &all, &params);
        assert!(tree.leaf_count() <= 4);
    }

    #[test]
    fn bootstrap_duplicates_are_fine() {
        let x: Vec<_> = (0..4).map(|i| row(i as f64)).collect();
        let y = vec![0.0, 0.0, 10.0, 10.0];
        let tree = RegressionTree::fit(&x, &y, &[0, 0, 3, 3], &TreeParams::default());
        assert_eq!(tree.predict(&row(0.0)), 0.0);
        assert_eq!(tree.predict(&row(3.0)), 10.0);
    }
}
