pub mod error;
pub mod pipeline;
pub mod cross_validation;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Estimator, EstimatorSpec, FittedPipeline, Pipeline};
pub use cross_validation::{cross_validate, stratified_k_fold, CvResults, CvSplit, FoldScore};
