use complaint_ml_core::{class_counts, ClassWeight, Float, SparseMatrix, SparseRow, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;

/// Logistic regression for binary classification via full-batch gradient descent
/// on the class-weighted, L2-penalized log loss.
///
/// The step size is the inverse of an upper bound on the loss curvature, so
/// no learning rate needs tuning. Each pass touches only the stored entries
/// of the feature matrix plus one dense update of the weights.
#[derive(Debug, Clone)]
pub struct LogisticRegression<T: Float> {
    pub weights: Option<Tensor<T>>,
    pub bias: Option<T>,
    pub max_iter: usize,
    pub tol: T,
    /// Inverse regularization strength.
    pub c: T,
    pub class_weight: ClassWeight,
    /// Iterations run by the last `fit`.
    pub n_iter: usize,
}

impl<T: Float> LogisticRegression<T> {
    pub fn new(max_iter: usize) -> Self {
        LogisticRegression {
            weights: None,
            bias: None,
            max_iter,
            tol: T::from_f64(1e-4),
            c: T::ONE,
            class_weight: ClassWeight::None,
            n_iter: 0,
        }
    }

    pub fn with_c(mut self, c: T) -> Self {
        self.c = c;
        self
    }

    pub fn with_tol(mut self, tol: T) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    fn sigmoid_val(x: T) -> T {
        T::ONE / (T::ONE + (-x).exp())
    }

    fn decision(w: &[T], b: T, row: &SparseRow<'_, T>) -> T {
        b + row.dot_dense(w)
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
        if class_counts(y).iter().filter(|&&c| c > 0).count() < 2 {
            return Err(TensorError::InvalidOperation(
                "LogisticRegression needs samples of both classes".into(),
            ));
        }

        let sw: Vec<T> = self
            .class_weight
            .sample_weights(y)
            .into_iter()
            .map(T::from_f64)
            .collect();
        let n_t = T::from_usize(n);
        let penalty = T::ONE / (self.c * n_t);

        // Curvature bound: sigmoid' <= 1/4, bias input is a constant 1.
        let curvature: T = x
            .rows()
            .zip(&sw)
            .map(|(row, &w)| w * (row.sq_norm() + T::ONE))
            .sum();
        let step = T::ONE / (T::from_f64(0.25) * curvature / n_t + penalty);

        let mut w = vec![T::ZERO; p];
        let mut b = T::ZERO;
        self.n_iter = 0;

        for _iter in 0..self.max_iter {
            self.n_iter += 1;
            let mut dw = vec![T::ZERO; p];
            let mut db = T::ZERO;

            for (i, row) in x.rows().enumerate() {
                let a = Self::sigmoid_val(Self::decision(&w, b, &row));
                let error = sw[i] * (a - y.data()[i]);
                if error == T::ZERO {
                    continue;
                }
                for (j, xj) in row.iter() {
                    dw[j] += error * xj;
                }
                db += error;
            }

            let mut max_grad = T::ZERO;
            for j in 0..p {
                let grad = dw[j] / n_t + penalty * w[j];
                w[j] = w[j] - step * grad;
                max_grad = max_grad.max(grad.abs());
            }
            let grad_b = db / n_t;
            b = b - step * grad_b;
            max_grad = max_grad.max(grad_b.abs());

            if !b.is_finite() || w.iter().any(|v| !v.is_finite()) {
                return Err(TensorError::Diverged(format!(
                    "non-finite weights after {} iterations",
                    self.n_iter
                )));
            }
            if max_grad < self.tol {
                break;
            }
        }

        self.weights = Some(Tensor::new(w, vec![p])?);
        self.bias = Some(b);
        Ok(())
    }

    /// Predict probabilities of the positive class.
    pub fn predict_proba(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let w = self.weights.as_ref().ok_or(TensorError::NotFitted)?;
        let n = x.nrows();
        let p = x.ncols();
        if p != w.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, w.numel()],
                got: x.shape_vec(),
            });
        }
        let b = self.bias.unwrap_or(T::ZERO);

        let proba: Vec<T> = x
            .rows()
            .map(|row| Self::sigmoid_val(Self::decision(w.data(), b, &row)))
            .collect();
        Tensor::new(proba, vec![n])
    }

    /// Predict class labels (threshold = 0.5).
    pub fn predict(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let proba = self.predict_proba(x)?;
        let labels: Vec<T> = proba
            .data()
            .iter()
            .map(|&p| if p >= T::HALF { T::ONE } else { T::ZERO })
            .collect();
        Ok(Tensor::from_slice(&labels))
    }
}
