use complaint_ml_core::Tensor;
use complaint_ml_data::{LabeledData, Table};
use complaint_ml_metrics::{Metric, MetricsRecord};
use complaint_ml_pipeline::{cross_validate, Pipeline, PipelineError};
use complaint_ml_preprocessing::{PreprocessError, PreprocessingPlan};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{AnalysisError, AnalysisResult};
use crate::registry::ClassifierSpec;

/// Per-fold wall-clock times, in fold order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldTimings {
    pub fit: Vec<Duration>,
    pub score: Vec<Duration>,
}

impl FoldTimings {
    pub fn mean_fit(&self) -> Duration {
        mean_duration(&self.fit)
    }

    pub fn mean_score(&self) -> Duration {
        mean_duration(&self.score)
    }
}

fn mean_duration(times: &[Duration]) -> Duration {
    if times.is_empty() {
        return Duration::ZERO;
    }
    times.iter().sum::<Duration>() / times.len() as u32
}

/// Outcome of cross-validating one model.
#[derive(Debug, Clone)]
pub struct TrainingResult {
    pub name: String,
    /// Fold means, rounded to three decimals, in request order.
    pub metrics: MetricsRecord,
    /// The composed pipeline, still unfitted.
    pub pipeline: Pipeline,
    pub timings: FoldTimings,
}

/// Cross-validate `spec` behind the shared preprocessing `plan`.
///
/// The pipeline is returned unfitted; fitting on the whole training split is
/// left to [`crate::evaluate`].
pub fn train_model(
    name: &str,
    spec: &ClassifierSpec,
    x_train: &Table,
    y_train: &Tensor<f64>,
    plan: &PreprocessingPlan,
    metrics: &[Metric],
    cv_folds: usize,
) -> AnalysisResult<TrainingResult> {
    if x_train.n_rows() == 0 {
        return Err(AnalysisError::EmptyInput(format!(
            "cannot train '{}' on an empty training matrix",
            name
        )));
    }
    let data = LabeledData::new(x_train.clone(), y_train.clone())
        .map_err(|e| AnalysisError::Configuration(e.to_string()))?;
    if metrics.is_empty() {
        return Err(AnalysisError::Configuration("no metrics requested".into()));
    }
    plan.validate(x_train)?;
    spec.validate()?;

    let pipeline = Pipeline::new(plan.clone(), Arc::new(spec.clone()));
    info!(model = name, rows = data.len(), folds = cv_folds, "Cross-validating");
    let start = Instant::now();
    let cv = cross_validate(&pipeline, &data, metrics, cv_folds).map_err(|e| fold_error(name, e))?;

    let timings = FoldTimings {
        fit: cv.folds.iter().map(|f| f.fit_time).collect(),
        score: cv.folds.iter().map(|f| f.score_time).collect(),
    };
    let metrics = cv.mean.rounded();
    info!(
        model = name,
        elapsed = ?start.elapsed(),
        mean_fit = ?timings.mean_fit(),
        mean_score = ?timings.mean_score(),
        "Cross-validation finished"
    );
    debug!(model = name, ?metrics, "Fold means");

    Ok(TrainingResult {
        name: name.to_string(),
        metrics,
        pipeline,
        timings,
    })
}

/// Setup problems are fatal for the run; anything else is this model's failure.
fn fold_error(model: &str, err: PipelineError) -> AnalysisError {
    match err {
        PipelineError::InvalidFolds(reason) => AnalysisError::Configuration(reason),
        PipelineError::Preprocess(PreprocessError::Configuration(reason)) => {
            AnalysisError::Configuration(reason)
        }
        other => AnalysisError::FitFailure {
            model: model.to_string(),
            reason: other.to_string(),
        },
    }
}
