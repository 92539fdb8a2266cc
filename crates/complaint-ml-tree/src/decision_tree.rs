use complaint_ml_core::{Float, SparseMatrix, SparseRow, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

/// How many features to examine at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxFeatures {
    #[default]
    All,
    /// `ceil(sqrt(n_features))`
    Sqrt,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// A node in the decision tree.
#[derive(Debug, Clone)]
enum TreeNode<T: Float> {
    /// Internal node: splits on feature `feature_idx` at `threshold`.
    Split {
        feature_idx: usize,
        threshold: T,
        left: Box<TreeNode<T>>,
        right: Box<TreeNode<T>>,
    },
    /// Leaf: weighted class distribution of the samples that reached it.
    Leaf { proba: Vec<f64> },
}

/// Best split found for one node.
struct SplitCandidate<T> {
    impurity: f64,
    feature: usize,
    threshold: T,
}

/// Decision Tree Classifier using CART (weighted Gini impurity), grown from
/// explicit per-sample weights. Feature values are read from sparse rows, so
/// unstored entries split as zero.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier<T: Float> {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
    tree: Option<TreeNode<T>>,
    pub n_classes: usize,
    n_features: usize,
}

impl<T: Float> DecisionTreeClassifier<T> {
    pub fn new(max_depth: Option<usize>, min_samples_split: usize, min_samples_leaf: usize) -> Self {
        DecisionTreeClassifier {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            min_samples_leaf: min_samples_leaf.max(1),
            max_features: MaxFeatures::All,
            seed: 0,
            tree: None,
            n_classes: 0,
            n_features: 0,
        }
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit with an explicit weight per sample. Zero-weight samples are ignored,
    /// which lets a forest pass bootstrap multiplicities without copying rows.
    pub fn fit_weighted(&mut self, x: &SparseMatrix<T>, y: &Tensor<T>, sample_weight: &[f64]) -> TensorResult<()> {
        let n = x.nrows();
        let p = x.ncols();
        if y.numel() != n || sample_weight.len() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: vec![y.numel(), sample_weight.len()],
            });
        }
        let indices: Vec<usize> = (0..n).filter(|&i| sample_weight[i] > 0.0).collect();
        if indices.is_empty() {
            return Err(TensorError::EmptyTensor);
        }

        self.n_classes = y.data().iter().map(|v| v.to_class()).max().map_or(0, |m| m + 1);
        self.n_features = p;
        let labels: Vec<usize> = y.data().iter().map(|v| v.to_class()).collect();

        let rng = StdRng::seed_from_u64(self.seed);
        let max_features = self.max_features.resolve(p);
        let rows: Vec<SparseRow<'_, T>> = x.rows().collect();
        let mut builder = TreeBuilder {
            params: &*self,
            rows: &rows,
            labels: &labels,
            weights: sample_weight,
            rng,
            max_features,
        };
        let tree = builder.build(&indices, 0);
        self.tree = Some(tree);
        Ok(())
    }

    fn traverse<'a>(&self, node: &'a TreeNode<T>, row: &SparseRow<'_, T>) -> &'a [f64] {
        match node {
            TreeNode::Leaf { proba } => proba,
            TreeNode::Split { feature_idx, threshold, left, right } => {
                if row.get(*feature_idx) <= *threshold {
                    self.traverse(left, row)
                } else {
                    self.traverse(right, row)
                }
            }
        }
    }

    /// Class distribution per row, `[n][n_classes]`.
    pub fn predict_proba(&self, x: &SparseMatrix<T>) -> TensorResult<Vec<Vec<f64>>> {
        let tree = self.tree.as_ref().ok_or(TensorError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(TensorError::ShapeMismatch {
                expected: vec![x.nrows(), self.n_features],
                got: x.shape_vec(),
            });
        }
        Ok(x.rows().map(|row| self.traverse(tree, &row).to_vec()).collect())
    }

    pub fn predict(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let predictions: Vec<T> = self
            .predict_proba(x)?
            .iter()
            .map(|proba| T::from_usize(argmax(proba)))
            .collect();
        Ok(Tensor::from_slice(&predictions))
    }
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|&c| (c / total) * (c / total)).sum::<f64>()
}

struct TreeBuilder<'a, T: Float> {
    params: &'a DecisionTreeClassifier<T>,
    rows: &'a [SparseRow<'a, T>],
    labels: &'a [usize],
    weights: &'a [f64],
    rng: StdRng,
    max_features: usize,
}

impl<'a, T: Float> TreeBuilder<'a, T> {
    fn class_weights(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.params.n_classes];
        for &i in indices {
            counts[self.labels[i]] += self.weights[i];
        }
        counts
    }

    fn leaf(&self, counts: &[f64]) -> TreeNode<T> {
        let total: f64 = counts.iter().sum();
        let proba = counts.iter().map(|&c| if total > 0.0 { c / total } else { 0.0 }).collect();
        TreeNode::Leaf { proba }
    }

    fn build(&mut self, indices: &[usize], depth: usize) -> TreeNode<T> {
        let counts = self.class_weights(indices);
        let total: f64 = counts.iter().sum();
        let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || indices.len() < self.params.min_samples_split {
            return self.leaf(&counts);
        }

        let split = match self.best_split(indices, gini(&counts, total)) {
            Some(split) => split,
            None => return self.leaf(&counts),
        };

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in indices {
            if self.rows[i].get(split.feature) <= split.threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }

        let left_node = self.build(&left, depth + 1);
        let right_node = self.build(&right, depth + 1);
        TreeNode::Split {
            feature_idx: split.feature,
            threshold: split.threshold,
            left: Box::new(left_node),
            right: Box::new(right_node),
        }
    }

    /// Visit features in random order until `max_features` non-constant ones
    /// have been scored, and keep the split with the lowest weighted impurity.
    /// Only features stored for some row of the node can vary within it.
    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<SplitCandidate<T>> {
        let mut features: Vec<usize> = indices
            .iter()
            .flat_map(|&i| self.rows[i].iter().map(|(j, _)| j))
            .collect();
        features.sort_unstable();
        features.dedup();
        features.shuffle(&mut self.rng);

        let n_classes = self.params.n_classes;
        let min_leaf = self.params.min_samples_leaf;
        let mut best: Option<SplitCandidate<T>> = None;
        let mut visited = 0;

        let mut column: Vec<(T, usize)> = Vec::with_capacity(indices.len());
        for feature in features {
            if visited >= self.max_features {
                break;
            }
            column.clear();
            for &i in indices {
                column.push((self.rows[i].get(feature), i));
            }
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            if column.first().map(|c| c.0) == column.last().map(|c| c.0) {
                continue;
            }
            visited += 1;

            let mut left = vec![0.0; n_classes];
            let mut right = vec![0.0; n_classes];
            for &(_, i) in &column {
                right[self.labels[i]] += self.weights[i];
            }
            let total: f64 = right.iter().sum();
            let mut w_left = 0.0;

            for k in 0..column.len() - 1 {
                let i = column[k].1;
                let w = self.weights[i];
                left[self.labels[i]] += w;
                right[self.labels[i]] -= w;
                w_left += w;

                if column[k].0 == column[k + 1].0 {
                    continue;
                }
                let n_left = k + 1;
                if n_left < min_leaf || column.len() - n_left < min_leaf {
                    continue;
                }
                let w_right = total - w_left;
                let impurity = (w_left * gini(&left, w_left) + w_right * gini(&right, w_right)) / total;
                if impurity < parent_impurity && best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(SplitCandidate {
                        impurity,
                        feature,
                        threshold: (column[k].0 + column[k + 1].0) / T::TWO,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> SparseMatrix<f64> {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        SparseMatrix::from_dense(&Tensor::from_vec2d(&rows).unwrap()).unwrap()
    }

    fn fit(tree: &mut DecisionTreeClassifier<f64>, x: &SparseMatrix<f64>, y: &Tensor<f64>) {
        tree.fit_weighted(x, y, &vec![1.0; y.numel()]).unwrap();
    }

    #[test]
    fn test_decision_tree_classifier() {
        let x = column(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);

        let mut tree = DecisionTreeClassifier::new(None, 2, 1);
        fit(&mut tree, &x, &y);
        assert_eq!(tree.predict(&x).unwrap().data(), y.data());
        // the single split sits between 3 and 4
        assert_eq!(tree.predict(&column(&[3.4, 3.6])).unwrap().data(), &[0.0, 1.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = column(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);

        let mut full = DecisionTreeClassifier::new(None, 2, 1);
        fit(&mut full, &x, &y);
        assert_eq!(full.predict(&x).unwrap().data(), y.data());

        let mut stump = DecisionTreeClassifier::new(Some(1), 2, 1);
        fit(&mut stump, &x, &y);
        assert_ne!(stump.predict(&x).unwrap().data(), y.data());
    }

    #[test]
    fn test_sample_weights_shift_leaf_vote() {
        // A single unsplittable node: three negatives, one positive.
        let x: SparseMatrix<f64> = SparseMatrix::zeros(4, 1);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 0.0, 1.0]);

        let mut plain = DecisionTreeClassifier::new(None, 2, 1);
        fit(&mut plain, &x, &y);
        assert_eq!(plain.predict(&x).unwrap().data()[0], 0.0);

        let mut weighted = DecisionTreeClassifier::new(None, 2, 1);
        weighted.fit_weighted(&x, &y, &[1.0, 1.0, 1.0, 3.0]).unwrap();
        let proba = weighted.predict_proba(&x).unwrap();
        approx::assert_relative_eq!(proba[0][0], 0.5);
        approx::assert_relative_eq!(proba[0][1], 0.5);
    }

    #[test]
    fn test_zero_weight_rows_are_ignored() {
        let x = column(&[0.0, 1.0, 2.0]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0, 1.0]);
        let mut tree = DecisionTreeClassifier::new(None, 2, 1);
        tree.fit_weighted(&x, &y, &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(tree.predict(&x).unwrap().data(), &[1.0, 1.0, 1.0]);
        assert!(tree.fit_weighted(&x, &y, &[0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(3000), 55);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
        assert_eq!(MaxFeatures::Count(50).resolve(7), 7);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let tree = DecisionTreeClassifier::<f64>::new(None, 2, 1);
        assert_eq!(tree.predict(&SparseMatrix::zeros(1, 1)).unwrap_err(), TensorError::NotFitted);

        let x = column(&[0.0, 1.0]);
        let mut tree = DecisionTreeClassifier::new(None, 2, 1);
        fit(&mut tree, &x, &Tensor::from_slice(&[0.0, 1.0]));
        assert!(tree.predict(&SparseMatrix::zeros(1, 2)).is_err());
    }
}
