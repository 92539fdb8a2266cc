use complaint_ml_data::{
    class_balance, column_summary, load_complaints, prepare_dataset, train_test_split, ColumnSummary, Table,
};
use complaint_ml_metrics::MetricsRecord;
use complaint_ml_pipeline::Pipeline;
use std::time::Instant;
use tracing::{info, warn};

use crate::compare::{compare, Comparison};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::evaluate::{evaluate, ModelOutcome, Scorecard};
use crate::report::write_reports;
use crate::trainer::{train_model, TrainingResult};

/// Everything one run produced, before it is written out.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub label: String,
    /// Label value counts of the loaded table.
    pub class_balance: Vec<(String, usize)>,
    pub column_summary: Vec<ColumnSummary>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Models that cross-validated, in registry order.
    pub training: Vec<TrainingResult>,
    /// `(model, reason)` for models whose cross-validation failed.
    pub failures: Vec<(String, String)>,
    pub comparison: Comparison,
    pub scorecard: Scorecard,
}

/// Load the configured file, run the analysis and write every artifact to
/// the output directory.
pub fn run_analysis(config: &AnalysisConfig) -> AnalysisResult<AnalysisReport> {
    config.validate()?;
    let start = Instant::now();
    let table = load_complaints(&config.data_path, config.row_limit, config.skip_rows)?;
    let report = run_on_table(config, &table)?;
    let paths = write_reports(&report, &config.output_dir)?;
    info!(
        elapsed = ?start.elapsed(),
        results = %paths.results.display(),
        test_results = %paths.test_results.display(),
        "Analysis finished"
    );
    Ok(report)
}

/// Run the analysis on an already loaded table. Nothing is written.
pub fn run_on_table(config: &AnalysisConfig, table: &Table) -> AnalysisResult<AnalysisReport> {
    config.validate()?;
    let schema = &config.schema;

    let balance = class_balance(table, &schema.label)?;
    let summary = column_summary(table);
    let data = prepare_dataset(table, &schema.label, &schema.positive_label, &schema.excluded)?;
    if data.is_empty() {
        return Err(AnalysisError::EmptyInput(format!(
            "no rows left after dropping missing '{}' labels and incomplete records",
            schema.label
        )));
    }
    let (train, test) = train_test_split(&data, config.test_size, config.split_seed)?;

    let plan = schema.plan();
    let mut training = Vec::new();
    let mut failures = Vec::new();
    for model in &config.models {
        match train_model(
            &model.name,
            &model.classifier,
            &train.features,
            &train.labels,
            &plan,
            &config.metrics,
            config.cv_folds,
        ) {
            Ok(result) => training.push(result),
            Err(AnalysisError::FitFailure { model, reason }) => {
                warn!(%model, %reason, "Cross-validation failed; model left out of the comparison");
                failures.push((model, reason));
            }
            Err(e) => return Err(e),
        }
    }

    let scored: Vec<(String, MetricsRecord)> = training
        .iter()
        .map(|r| (r.name.clone(), r.metrics.clone()))
        .collect();
    let comparison = compare(&scored)?;

    let pipelines: Vec<(String, Pipeline)> = training
        .iter()
        .map(|r| (r.name.clone(), r.pipeline.clone()))
        .collect();
    let evaluated = evaluate(&pipelines, &train, &test, &config.metrics);
    let scorecard = merge_failures(config, evaluated, &failures);

    Ok(AnalysisReport {
        label: schema.label.clone(),
        class_balance: balance,
        column_summary: summary,
        train_rows: train.len(),
        test_rows: test.len(),
        training,
        failures,
        comparison,
        scorecard,
    })
}

/// Put models that failed cross-validation back into the scorecard as
/// failed columns, keeping registry order.
fn merge_failures(config: &AnalysisConfig, mut evaluated: Scorecard, failures: &[(String, String)]) -> Scorecard {
    let columns = config
        .models
        .iter()
        .filter_map(|model| {
            if let Some(pos) = evaluated.columns.iter().position(|(name, _)| *name == model.name) {
                return Some(evaluated.columns.swap_remove(pos));
            }
            failures.iter().find(|(name, _)| *name == model.name).map(|(name, reason)| {
                (
                    name.clone(),
                    ModelOutcome::Failed {
                        reason: format!("cross-validation failed: {}", reason),
                    },
                )
            })
        })
        .collect();
    Scorecard {
        metrics: evaluated.metrics,
        columns,
    }
}
