use complaint_ml_core::SparseMatrix;
use complaint_ml_data::LabeledData;
use complaint_ml_metrics::{Metric, MetricsRecord};
use complaint_ml_pipeline::{Pipeline, PipelineResult};
use complaint_ml_preprocessing::{FittedPlan, PreprocessResult, PreprocessingPlan};
use std::sync::Arc;
use tracing::{info, warn};

/// Held-out result of one model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    /// Test-split scores, rounded to three decimals.
    Scored(MetricsRecord),
    Failed { reason: String },
}

impl ModelOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ModelOutcome::Failed { .. })
    }
}

/// Test-split scores, one column per model.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub metrics: Vec<Metric>,
    pub columns: Vec<(String, ModelOutcome)>,
}

impl Scorecard {
    pub fn outcome(&self, model: &str) -> Option<&ModelOutcome> {
        self.columns.iter().find(|(name, _)| name == model).map(|(_, o)| o)
    }

    /// Score of `model` on `metric`; `None` if unknown or failed.
    pub fn get(&self, model: &str, metric: Metric) -> Option<f64> {
        match self.outcome(model)? {
            ModelOutcome::Scored(record) => record.get(metric),
            ModelOutcome::Failed { .. } => None,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(name, _)| name.as_str())
    }
}

/// A plan fitted on the training split with both splits already transformed.
struct PreparedPlan {
    fitted: Arc<FittedPlan>,
    train: SparseMatrix<f64>,
    test: SparseMatrix<f64>,
}

fn prepare(plan: &PreprocessingPlan, train: &LabeledData, test: &LabeledData) -> PreprocessResult<PreparedPlan> {
    let fitted = Arc::new(plan.fit(&train.features)?);
    let train_matrix = fitted.transform(&train.features)?;
    let test_matrix = fitted.transform(&test.features)?;
    info!(features = fitted.n_features(), "Fitted shared preprocessing");
    Ok(PreparedPlan {
        fitted,
        train: train_matrix,
        test: test_matrix,
    })
}

fn fit_and_score(
    pipeline: &Pipeline,
    prepared: &PreparedPlan,
    train: &LabeledData,
    test: &LabeledData,
    metrics: &[Metric],
) -> PipelineResult<MetricsRecord> {
    let fitted = pipeline.fit_with_plan(Arc::clone(&prepared.fitted), &prepared.train, &train.labels)?;
    let predictions = fitted.predict_matrix(&prepared.test)?;
    Ok(MetricsRecord::score(metrics, &test.labels, &predictions)?.rounded())
}

/// Fit every pipeline on the whole training split and score it on the test
/// split with hard predictions.
///
/// Pipelines with equal preprocessing plans share one fitted plan. A model
/// that cannot be fit or scored is reported as failed and the rest still run.
pub fn evaluate(
    pipelines: &[(String, Pipeline)],
    train: &LabeledData,
    test: &LabeledData,
    metrics: &[Metric],
) -> Scorecard {
    let mut prepared: Vec<(&PreprocessingPlan, Result<PreparedPlan, String>)> = Vec::new();
    let mut columns = Vec::with_capacity(pipelines.len());

    for (name, pipeline) in pipelines {
        let idx = match prepared.iter().position(|(plan, _)| *plan == pipeline.plan()) {
            Some(idx) => idx,
            None => {
                let entry = prepare(pipeline.plan(), train, test).map_err(|e| e.to_string());
                if let Err(reason) = &entry {
                    warn!(%reason, "Shared preprocessing failed; dependent models are marked failed");
                }
                prepared.push((pipeline.plan(), entry));
                prepared.len() - 1
            }
        };

        let outcome = match &prepared[idx].1 {
            Err(reason) => ModelOutcome::Failed {
                reason: format!("preprocessing failed: {}", reason),
            },
            Ok(plan) => match fit_and_score(pipeline, plan, train, test, metrics) {
                Ok(record) => {
                    info!(model = %name, ?record, "Scored on test split");
                    ModelOutcome::Scored(record)
                }
                Err(e) => {
                    warn!(model = %name, error = %e, "Held-out evaluation failed");
                    ModelOutcome::Failed { reason: e.to_string() }
                }
            },
        };
        columns.push((name.clone(), outcome));
    }

    Scorecard {
        metrics: metrics.to_vec(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{default_models, ClassifierSpec, LogisticParams};
    use crate::trainer::tests::{toy_data, toy_plan};
    use complaint_ml_data::Table;

    const METRICS: [Metric; 2] = [Metric::Accuracy, Metric::Recall];

    fn split() -> (LabeledData, LabeledData) {
        let (x, y) = toy_data();
        let data = LabeledData::new(x, y).unwrap();
        let train: Vec<usize> = (0..32).collect();
        let test: Vec<usize> = (32..40).collect();
        (data.select(&train).unwrap(), data.select(&test).unwrap())
    }

    fn pipelines() -> Vec<(String, Pipeline)> {
        default_models()
            .into_iter()
            .map(|m| (m.name, Pipeline::new(toy_plan(), Arc::new(m.classifier))))
            .collect()
    }

    #[test]
    fn test_scores_every_model() {
        let (train, test) = split();
        let card = evaluate(&pipelines(), &train, &test, &METRICS);

        assert_eq!(card.columns.len(), 5);
        assert_eq!(card.failed().count(), 0);
        // test rows 32..40 hold two positives
        assert_eq!(card.get("dummy", Metric::Recall), Some(0.0));
        assert_eq!(card.get("dummy", Metric::Accuracy), Some(0.75));
        assert_eq!(card.get("bayes", Metric::Recall), Some(1.0));
        assert_eq!(card, evaluate(&pipelines(), &train, &test, &METRICS));
    }

    #[test]
    fn test_failure_is_isolated() {
        // a single-class training split breaks logistic regression only
        let zeros: Vec<usize> = (0..40).filter(|i| i % 4 != 0).collect();
        let (x, y) = toy_data();
        let all = LabeledData::new(x, y).unwrap();
        let single_class = all.select(&zeros[..20]).unwrap();
        let test = all.select(&zeros[20..]).unwrap();

        let models = vec![
            ("dummy".to_string(), Pipeline::new(toy_plan(), Arc::new(ClassifierSpec::Dummy))),
            (
                "logreg".to_string(),
                Pipeline::new(
                    toy_plan(),
                    Arc::new(ClassifierSpec::LogisticRegression(LogisticParams::default())),
                ),
            ),
        ];
        let card = evaluate(&models, &single_class, &test, &METRICS);
        assert_eq!(card.get("dummy", Metric::Accuracy), Some(1.0));
        assert!(card.outcome("logreg").unwrap().is_failed());
        assert_eq!(card.failed().collect::<Vec<_>>(), vec!["logreg"]);
    }

    #[test]
    fn test_plan_failure_fails_dependents() {
        let (train, test) = split();
        let broken = PreprocessingPlan::new(vec!["missing".into()], None, vec![], 10);
        let models = vec![
            ("dummy".to_string(), Pipeline::new(broken.clone(), Arc::new(ClassifierSpec::Dummy))),
            ("also".to_string(), Pipeline::new(broken, Arc::new(ClassifierSpec::Dummy))),
            ("ok".to_string(), Pipeline::new(toy_plan(), Arc::new(ClassifierSpec::Dummy))),
        ];
        let card = evaluate(&models, &train, &test, &METRICS);
        assert_eq!(card.failed().collect::<Vec<_>>(), vec!["dummy", "also"]);
        assert!(card.get("ok", Metric::Accuracy).is_some());
    }

    #[test]
    fn test_unseen_test_categories_do_not_fail() {
        let (train, test) = split();
        let columns: Vec<(&str, Vec<&str>)> = vec![
            ("noise", vec!["zzz"; 8]),
            ("notes", vec!["brand new words"; 8]),
            ("signal", vec!["medium"; 8]),
        ];
        let unseen = LabeledData::new(Table::from_str_columns(&columns).unwrap(), test.labels.clone()).unwrap();
        let card = evaluate(&pipelines(), &train, &unseen, &METRICS);
        assert_eq!(card.failed().count(), 0);
    }
}
