use complaint_ml_core::TensorError;
use complaint_ml_data::DataError;
use complaint_ml_preprocessing::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    /// The estimator could not be fit or could not predict.
    #[error("Estimator failed: {0}")]
    Estimator(#[from] TensorError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Invalid cross-validation setup: {0}")]
    InvalidFolds(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
