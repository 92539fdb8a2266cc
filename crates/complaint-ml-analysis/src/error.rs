use complaint_ml_data::DataError;
use complaint_ml_io::ReportError;
use complaint_ml_metrics::UnknownMetric;
use complaint_ml_preprocessing::PreprocessError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure classes of an analysis run.
///
/// `Configuration` and `NotFound` abort the run. `FitFailure` is scoped to a
/// single model; the runner reports it and carries on with the others.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No usable rows: {0}")]
    EmptyInput(String),

    #[error("Model '{model}' failed: {reason}")]
    FitFailure { model: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl From<DataError> for AnalysisError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(path) => AnalysisError::NotFound(path),
            DataError::Io(e) => AnalysisError::Io(e),
            DataError::Csv(e) => AnalysisError::Csv(e),
            other => AnalysisError::Configuration(other.to_string()),
        }
    }
}

impl From<PreprocessError> for AnalysisError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::EmptyInput => {
                AnalysisError::EmptyInput("preprocessing received an empty table".into())
            }
            PreprocessError::Data(e) => e.into(),
            other => AnalysisError::Configuration(other.to_string()),
        }
    }
}

impl From<ReportError> for AnalysisError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(path) => AnalysisError::NotFound(path),
            ReportError::Io(e) => AnalysisError::Io(e),
            ReportError::Csv(e) => AnalysisError::Csv(e),
            ReportError::Json(e) => AnalysisError::Configuration(format!("malformed JSON config: {}", e)),
        }
    }
}

impl From<UnknownMetric> for AnalysisError {
    fn from(err: UnknownMetric) -> Self {
        AnalysisError::Configuration(err.to_string())
    }
}
