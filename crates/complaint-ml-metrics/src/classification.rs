use complaint_ml_core::{Float, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;

fn check_lengths<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> TensorResult<()> {
    if y_true.numel() != y_pred.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: y_true.shape_vec(),
            got: y_pred.shape_vec(),
        });
    }
    Ok(())
}

/// Compute accuracy: fraction of correct predictions. Empty input scores 0.
pub fn accuracy<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let n = y_true.numel();
    if n == 0 {
        return Ok(0.0);
    }
    let correct: usize = y_true
        .data()
        .iter()
        .zip(y_pred.data().iter())
        .filter(|(&a, &b)| a.to_class() == b.to_class())
        .count();
    Ok(correct as f64 / n as f64)
}

/// True positives, false positives and false negatives for one class.
fn tp_fp_fn<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>, class: usize) -> (usize, usize, usize) {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.data().iter().zip(y_pred.data().iter()) {
        match (t.to_class() == class, p.to_class() == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    (tp, fp, fn_)
}

/// Precision for a specific class. No positive predictions scores 0.
pub fn precision_class<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    class: usize,
) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let (tp, fp, _) = tp_fp_fn(y_true, y_pred, class);
    Ok(if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 })
}

/// Recall for a specific class. No samples of the class scores 0.
pub fn recall_class<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    class: usize,
) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let (tp, _, fn_) = tp_fp_fn(y_true, y_pred, class);
    Ok(if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 })
}

/// F1 score for a specific class.
pub fn f1_score_class<T: Float>(
    y_true: &Tensor<T>,
    y_pred: &Tensor<T>,
    class: usize,
) -> TensorResult<f64> {
    let p = precision_class(y_true, y_pred, class)?;
    let r = recall_class(y_true, y_pred, class)?;
    Ok(if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) })
}
