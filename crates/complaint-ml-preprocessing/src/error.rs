use complaint_ml_core::TensorError;
use complaint_ml_data::DataError;
use thiserror::Error;

/// Errors raised while fitting or applying a preprocessing plan.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Column classification does not match the input table.
    #[error("Preprocessing configuration error: {0}")]
    Configuration(String),

    #[error("Cannot fit preprocessing on an empty table")]
    EmptyInput,

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

pub type PreprocessResult<T> = Result<T, PreprocessError>;
