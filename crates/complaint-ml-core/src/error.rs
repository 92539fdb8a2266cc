use thiserror::Error;

/// Errors raised by matrix operations and by estimators while fitting or
/// predicting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Row {index} out of bounds for axis {axis} of length {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Axis {axis} does not exist in a {ndim}-dimensional tensor")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// `predict` was called before a successful `fit`.
    #[error("Model not fitted")]
    NotFitted,

    /// Parameters became non-finite during optimization.
    #[error("Training diverged: {0}")]
    Diverged(String),

    #[error("Empty input")]
    EmptyTensor,
}

pub type TensorResult<T> = Result<T, TensorError>;
