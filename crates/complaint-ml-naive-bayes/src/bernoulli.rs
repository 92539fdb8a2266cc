use complaint_ml_core::{class_counts, Float, SparseMatrix, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;

/// Bernoulli Naive Bayes classifier.
///
/// Features are binarized (`x > binarize` counts as present), so term counts
/// and one-hot indicators both reduce to presence/absence. The threshold must
/// be non-negative so that unstored zeros are always absent.
/// P(x_i | y) follows a Bernoulli distribution with additive smoothing.
#[derive(Debug, Clone)]
pub struct BernoulliNB<T: Float> {
    pub alpha: T,
    pub binarize: T,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,     // log P(x_i=1 | y)
    feature_log_neg_prob: Vec<Vec<f64>>, // log P(x_i=0 | y)
    n_classes: usize,
}

impl<T: Float> BernoulliNB<T> {
    pub fn new(alpha: T) -> Self {
        BernoulliNB {
            alpha,
            binarize: T::ZERO,
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
            feature_log_neg_prob: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn with_binarize(mut self, threshold: T) -> Self {
        self.binarize = threshold;
        self
    }

    pub fn fit(&mut self, x: &SparseMatrix<T>, y: &Tensor<T>) -> TensorResult<()> {
        let n = x.nrows();
        let p = x.ncols();
        if y.numel() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if n == 0 {
            return Err(TensorError::EmptyTensor);
        }
        let alpha = self.alpha.to_f64();
        if alpha <= 0.0 {
            return Err(TensorError::InvalidOperation(
                "BernoulliNB alpha must be positive".into(),
            ));
        }
        if self.binarize < T::ZERO {
            return Err(TensorError::InvalidOperation(
                "BernoulliNB binarize threshold must be non-negative".into(),
            ));
        }

        let counts = class_counts(y);
        self.n_classes = counts.len();
        let mut feature_counts = vec![vec![0.0f64; p]; self.n_classes];

        for (row, label) in x.rows().zip(y.data()) {
            let fc = &mut feature_counts[label.to_class()];
            for (j, v) in row.iter() {
                if v > self.binarize {
                    fc[j] += 1.0;
                }
            }
        }

        // Absent classes get a -inf prior and are never predicted.
        self.class_log_prior = counts
            .iter()
            .map(|&c| (c as f64 / n as f64).ln())
            .collect();

        self.feature_log_prob = Vec::with_capacity(self.n_classes);
        self.feature_log_neg_prob = Vec::with_capacity(self.n_classes);
        for cls in 0..self.n_classes {
            let n_cls = counts[cls] as f64 + 2.0 * alpha;
            let log_p: Vec<f64> = feature_counts[cls]
                .iter()
                .map(|&c| ((c + alpha) / n_cls).ln())
                .collect();
            let log_np: Vec<f64> = feature_counts[cls]
                .iter()
                .map(|&c| ((n_cls - c - alpha) / n_cls).ln())
                .collect();
            self.feature_log_prob.push(log_p);
            self.feature_log_neg_prob.push(log_np);
        }

        Ok(())
    }

    /// Joint log-likelihood of each row under each class, `[n][n_classes]`.
    pub fn predict_log_proba(&self, x: &SparseMatrix<T>) -> TensorResult<Vec<Vec<f64>>> {
        if self.n_classes == 0 {
            return Err(TensorError::NotFitted);
        }
        let n = x.nrows();
        let p = x.ncols();
        if p != self.feature_log_prob[0].len() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, self.feature_log_prob[0].len()],
                got: x.shape_vec(),
            });
        }

        // Start every row from the all-absent score and correct for present features.
        let absent: Vec<f64> = self
            .feature_log_neg_prob
            .iter()
            .zip(&self.class_log_prior)
            .map(|(lnp, prior)| prior + lnp.iter().sum::<f64>())
            .collect();

        let mut results = Vec::with_capacity(n);
        for row in x.rows() {
            let mut scores = absent.clone();
            for (j, v) in row.iter() {
                if v > self.binarize {
                    for (cls, score) in scores.iter_mut().enumerate() {
                        *score += self.feature_log_prob[cls][j] - self.feature_log_neg_prob[cls][j];
                    }
                }
            }
            results.push(scores);
        }
        Ok(results)
    }

    pub fn predict(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let predictions: Vec<T> = self
            .predict_log_proba(x)?
            .iter()
            .map(|scores| {
                let mut best_class = 0;
                let mut best_score = f64::NEG_INFINITY;
                for (cls, &score) in scores.iter().enumerate() {
                    if score > best_score {
                        best_score = score;
                        best_class = cls;
                    }
                }
                T::from_usize(best_class)
            })
            .collect();
        Ok(Tensor::from_slice(&predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(rows: &[Vec<f64>]) -> SparseMatrix<f64> {
        SparseMatrix::from_dense(&Tensor::from_vec2d(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_bernoulli_nb() {
        let x = sparse(&[
            vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0], vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 1.0],
        ]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        let mut model = BernoulliNB::new(0.1);
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        let correct: usize = pred.data().iter().zip(y.data().iter())
            .filter(|(&p, &t)| (p - t).abs() < 0.5)
            .count();
        assert!(correct >= 5, "BernoulliNB accuracy: {}/6", correct);
    }

    #[test]
    fn test_counts_are_binarized() {
        // Term counts above zero behave exactly like presence indicators.
        let counts = sparse(&[
            vec![3.0, 0.0], vec![2.0, 0.0], vec![0.0, 5.0], vec![0.0, 1.0],
        ]);
        let flags = sparse(&[
            vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0],
        ]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 1.0, 1.0]);

        let mut a = BernoulliNB::new(0.1);
        a.fit(&counts, &y).unwrap();
        let mut b = BernoulliNB::new(0.1);
        b.fit(&flags, &y).unwrap();
        assert_eq!(a.predict_log_proba(&counts).unwrap(), b.predict_log_proba(&flags).unwrap());
        assert_eq!(a.predict(&counts).unwrap().data(), y.data());
    }

    #[test]
    fn test_single_class_and_unfitted() {
        let x = sparse(&[vec![1.0], vec![0.0]]);
        let model = BernoulliNB::<f64>::new(0.1);
        assert_eq!(model.predict(&x).unwrap_err(), TensorError::NotFitted);

        let mut model = BernoulliNB::new(0.1);
        model.fit(&x, &Tensor::from_slice(&[1.0, 1.0])).unwrap();
        assert_eq!(model.predict(&x).unwrap().data(), &[1.0, 1.0]);

        let mut negative = BernoulliNB::new(0.1).with_binarize(-0.5);
        assert!(negative.fit(&x, &Tensor::from_slice(&[0.0, 1.0])).is_err());
    }
}
