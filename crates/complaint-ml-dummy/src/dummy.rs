use complaint_ml_core::{class_counts, Float, SparseMatrix, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;

/// Baseline classifier that ignores the features and always predicts the
/// most frequent training class (the "prior" strategy).
#[derive(Debug, Clone, Default)]
pub struct DummyClassifier {
    /// Class frequencies observed during `fit`, indexed by class label.
    pub class_prior: Option<Vec<f64>>,
    majority: Option<usize>,
}

impl DummyClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit<T: Float>(&mut self, x: &SparseMatrix<T>, y: &Tensor<T>) -> TensorResult<()> {
        let n = x.nrows();
        if n != y.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if n == 0 {
            return Err(TensorError::EmptyTensor);
        }

        let counts = class_counts(y);
        // ties go to the lowest class label
        let majority = counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (c, &k)| if k > best.1 { (c, k) } else { best })
            .0;
        self.class_prior = Some(counts.iter().map(|&k| k as f64 / n as f64).collect());
        self.majority = Some(majority);
        Ok(())
    }

    pub fn predict<T: Float>(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let majority = self.majority.ok_or(TensorError::NotFitted)?;
        let n = x.nrows();
        Ok(Tensor::from_slice(&vec![T::from_usize(majority); n]))
    }
}
