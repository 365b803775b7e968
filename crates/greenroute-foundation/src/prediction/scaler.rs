use super::features::{FEATURE_COUNT, FeatureVector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-feature standardisation: `(x - mean) / std`.
///
/// Every fit gets a fresh fingerprint. Forests record the fingerprint of
/// the scaler they were fitted against so a restored bundle can be checked
/// for a mismatched pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    id: Uuid,
    mean: FeatureVector,
    /// Population standard deviation; zero-variance features use 1.0
    scale: FeatureVector,
    samples: usize,
}

impl FeatureScaler {
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }

        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut scale {
            *s = s.sqrt();
            if *s < f64::EPSILON {
                *s = 1.0;
            }
        }

        Self {
            id: Uuid::new_v4(),
            mean,
            scale,
            samples: rows.len(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn transform_all(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
