use complaint_ml_core::{ClassWeight, Float, SparseMatrix, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::decision_tree::{argmax, DecisionTreeClassifier, MaxFeatures};

/// Random forest classifier: bagged decision trees with per-split feature
/// subsampling. Predictions average the trees' class distributions.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier<T: Float> {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
    pub bootstrap: bool,
    pub seed: Option<u64>,
    trees: Vec<DecisionTreeClassifier<T>>,
    pub n_classes: usize,
}

impl<T: Float> RandomForestClassifier<T> {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, max_features: MaxFeatures) -> Self {
        RandomForestClassifier {
            n_estimators,
            max_depth,
            min_samples_split: 2,
            max_features,
            class_weight: ClassWeight::None,
            bootstrap: true,
            seed: Some(42),
            trees: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Grow the trees in parallel. Each tree's seed is drawn up front from the
    /// forest RNG, so the result does not depend on thread scheduling.
    pub fn fit(&mut self, x: &SparseMatrix<T>, y: &Tensor<T>) -> TensorResult<()> {
        let n = x.nrows();
        if y.numel() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if n == 0 {
            return Err(TensorError::EmptyTensor);
        }
        if self.n_estimators == 0 {
            return Err(TensorError::InvalidOperation(
                "RandomForestClassifier needs at least one tree".into(),
            ));
        }

        // Class weights come from the full training labels, not each bootstrap.
        let class_weights = self.class_weight.sample_weights(y);
        self.n_classes = y.data().iter().map(|v| v.to_class()).max().map_or(0, |m| m + 1);

        let mut base_rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let tree_seeds: Vec<u64> = (0..self.n_estimators).map(|_| base_rng.gen()).collect();

        let trees = tree_seeds
            .into_par_iter()
            .map(|tree_seed| {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                // Bootstrap sample as per-row multiplicities
                let mut weights = vec![0.0f64; n];
                if self.bootstrap {
                    for _ in 0..n {
                        weights[rng.gen_range(0..n)] += 1.0;
                    }
                } else {
                    weights.iter_mut().for_each(|w| *w = 1.0);
                }
                for (w, cw) in weights.iter_mut().zip(&class_weights) {
                    *w *= cw;
                }

                let mut tree = DecisionTreeClassifier::new(self.max_depth, self.min_samples_split, 1)
                    .with_max_features(self.max_features)
                    .with_seed(rng.gen());
                tree.fit_weighted(x, y, &weights)?;
                Ok(tree)
            })
            .collect::<TensorResult<Vec<_>>>()?;

        self.trees = trees;
        Ok(())
    }

    /// Mean class distribution over all trees, `[n][n_classes]`.
    pub fn predict_proba(&self, x: &SparseMatrix<T>) -> TensorResult<Vec<Vec<f64>>> {
        if self.trees.is_empty() {
            return Err(TensorError::NotFitted);
        }
        let n = x.nrows();
        let mut proba = vec![vec![0.0; self.n_classes]; n];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(x)?) {
                for (a, v) in acc.iter_mut().zip(p) {
                    *a += v;
                }
            }
        }
        let n_trees = self.trees.len() as f64;
        for row in &mut proba {
            row.iter_mut().for_each(|v| *v /= n_trees);
        }
        Ok(proba)
    }

    pub fn predict(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let predictions: Vec<T> = self
            .predict_proba(x)?
            .iter()
            .map(|p| T::from_usize(argmax(p)))
            .collect();
        Ok(Tensor::from_slice(&predictions))
    }
}
