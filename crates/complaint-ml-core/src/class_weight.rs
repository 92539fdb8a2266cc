use serde::{Deserialize, Serialize};

use crate::dtype::Float;
use crate::tensor::Tensor;

/// Per-class reweighting applied while fitting a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// Every sample counts once.
    #[default]
    None,
    /// Weight each class by `n_samples / (n_present_classes * class_count)`.
    Balanced,
}

/// Count samples per class label. The result has `max_label + 1` entries.
pub fn class_counts<T: Float>(y: &Tensor<T>) -> Vec<usize> {
    let n_classes = y.data().iter().map(|v| v.to_class()).max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for v in y.data() {
        counts[v.to_class()] += 1;
    }
    counts
}

impl ClassWeight {
    /// Weight of each class index. Classes absent from `y` get weight 0.
    pub fn class_weights<T: Float>(&self, y: &Tensor<T>) -> Vec<f64> {
        let counts = class_counts(y);
        match self {
            ClassWeight::None => counts.iter().map(|&c| if c > 0 { 1.0 } else { 0.0 }).collect(),
            ClassWeight::Balanced => {
                let present = counts.iter().filter(|&&c| c > 0).count() as f64;
                let n = y.numel() as f64;
                counts
                    .iter()
                    .map(|&c| if c > 0 { n / (present * c as f64) } else { 0.0 })
                    .collect()
            }
        }
    }

    /// Weight of each sample, looked up from its class.
    pub fn sample_weights<T: Float>(&self, y: &Tensor<T>) -> Vec<f64> {
        let per_class = self.class_weights(y);
        y.data().iter().map(|v| per_class[v.to_class()]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_class_counts() {
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(class_counts(&y), vec![3, 1]);
        assert!(class_counts(&Tensor::<f64>::from_slice(&[])).is_empty());
    }

    #[test]
    fn test_balanced_weights() {
        // 6 negatives, 2 positives: 8 / (2 * 6) and 8 / (2 * 2)
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let w = ClassWeight::Balanced.class_weights(&y);
        assert_relative_eq!(w[0], 8.0 / 12.0);
        assert_relative_eq!(w[1], 2.0);

        let sw = ClassWeight::Balanced.sample_weights(&y);
        let total: f64 = sw.iter().sum();
        assert_relative_eq!(total, 8.0);
    }

    #[test]
    fn test_no_weighting() {
        let y: Tensor<f64> = Tensor::from_slice(&[1.0, 1.0, 1.0]);
        assert_eq!(ClassWeight::None.class_weights(&y), vec![0.0, 1.0]);
        assert_eq!(ClassWeight::None.sample_weights(&y), vec![1.0, 1.0, 1.0]);
    }
}
