use complaint_ml_core::{SparseMatrix, Tensor};
use complaint_ml_core::error::TensorResult;
use complaint_ml_data::Table;
use complaint_ml_preprocessing::{FittedPlan, PreprocessingPlan};
use std::fmt;
use std::sync::Arc;

use crate::error::PipelineResult;

/// Trait for supervised estimators over encoded feature matrices.
pub trait Estimator: Send + Sync {
    fn fit(&mut self, x: &SparseMatrix<f64>, y: &Tensor<f64>) -> TensorResult<()>;
    fn predict(&self, x: &SparseMatrix<f64>) -> TensorResult<Tensor<f64>>;
}

/// Immutable description of an estimator: builds a fresh unfitted instance
/// every time a pipeline is fitted, so folds never share model state.
pub trait EstimatorSpec: fmt::Debug + Send + Sync {
    fn build(&self) -> Box<dyn Estimator>;
}

/// An unfitted pipeline: a preprocessing plan followed by an estimator.
#[derive(Debug, Clone)]
pub struct Pipeline {
    plan: PreprocessingPlan,
    estimator: Arc<dyn EstimatorSpec>,
}

/// A pipeline whose plan and estimator have both been fitted.
pub struct FittedPipeline {
    plan: Arc<FittedPlan>,
    estimator: Box<dyn Estimator>,
}

impl Pipeline {
    pub fn new(plan: PreprocessingPlan, estimator: Arc<dyn EstimatorSpec>) -> Self {
        Pipeline { plan, estimator }
    }

    pub fn plan(&self) -> &PreprocessingPlan {
        &self.plan
    }

    /// Fit the plan on `x`, then the estimator on the transformed matrix.
    pub fn fit(&self, x: &Table, y: &Tensor<f64>) -> PipelineResult<FittedPipeline> {
        let fitted_plan = Arc::new(self.plan.fit(x)?);
        let matrix = fitted_plan.transform(x)?;
        self.fit_with_plan(fitted_plan, &matrix, y)
    }

    /// Fit only the estimator, reusing an already fitted plan and the
    /// matrix it produced for the training rows.
    pub fn fit_with_plan(
        &self,
        plan: Arc<FittedPlan>,
        matrix: &SparseMatrix<f64>,
        y: &Tensor<f64>,
    ) -> PipelineResult<FittedPipeline> {
        let mut estimator = self.estimator.build();
        estimator.fit(matrix, y)?;
        Ok(FittedPipeline { plan, estimator })
    }
}

impl FittedPipeline {
    /// Transform a raw table and predict labels.
    pub fn predict(&self, x: &Table) -> PipelineResult<Tensor<f64>> {
        let matrix = self.plan.transform(x)?;
        self.predict_matrix(&matrix)
    }

    /// Predict from a matrix already produced by this pipeline's plan.
    pub fn predict_matrix(&self, matrix: &SparseMatrix<f64>) -> PipelineResult<Tensor<f64>> {
        Ok(self.estimator.predict(matrix)?)
    }
}

impl fmt::Debug for FittedPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedPipeline")
            .field("n_features", &self.plan.n_features())
            .finish_non_exhaustive()
    }
}
