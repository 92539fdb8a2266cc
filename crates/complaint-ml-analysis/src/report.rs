use complaint_ml_io::{format_score, write_class_balance, write_column_summary, write_table};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::compare::{ComparisonTable, LongFormRow, SCORE_PREFIX};
use crate::error::AnalysisResult;
use crate::evaluate::{ModelOutcome, Scorecard};
use crate::runner::AnalysisReport;

/// Cell written for a model that could not be evaluated.
pub const FAILED_CELL: &str = "failed";

/// Where each artifact of a run was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub results: PathBuf,
    pub model_performance: PathBuf,
    pub test_results: PathBuf,
    pub class_imbalance: PathBuf,
    pub unique_counts: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        ReportPaths {
            results: dir.join("results.csv"),
            model_performance: dir.join("model_performance.csv"),
            test_results: dir.join("test_results.csv"),
            class_imbalance: dir.join("class_imbalance.csv"),
            unique_counts: dir.join("unique_counts.csv"),
        }
    }
}

fn header(models: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(String::new()).chain(models).collect()
}

/// Header and rows of the wide cross-validation table.
pub fn comparison_rows(table: &ComparisonTable) -> (Vec<String>, Vec<Vec<String>>) {
    let rows = table
        .row_labels()
        .into_iter()
        .zip(&table.values)
        .map(|(label, values)| std::iter::once(label).chain(values.iter().map(|&v| format_score(v))).collect())
        .collect();
    (header(table.models.iter().cloned()), rows)
}

/// `Metric,Model,Score` rows for charting.
pub fn long_form_rows(rows: &[LongFormRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| vec![r.metric.to_string(), r.model.clone(), format_score(r.score)])
        .collect()
}

/// Header and rows of the held-out scorecard; failed models read `failed`.
pub fn scorecard_rows(card: &Scorecard) -> (Vec<String>, Vec<Vec<String>>) {
    let rows = card
        .metrics
        .iter()
        .map(|metric| {
            let mut row = vec![format!("{}{}", SCORE_PREFIX, metric)];
            row.extend(card.columns.iter().map(|(_, outcome)| match outcome {
                ModelOutcome::Scored(record) => record.get(*metric).map_or_else(String::new, format_score),
                ModelOutcome::Failed { .. } => FAILED_CELL.to_string(),
            }));
            row
        })
        .collect();
    (header(card.columns.iter().map(|(name, _)| name.clone())), rows)
}

/// Write every artifact of `report` into `output_dir`, replacing old files.
pub fn write_reports(report: &AnalysisReport, output_dir: &Path) -> AnalysisResult<ReportPaths> {
    let paths = ReportPaths::in_dir(output_dir);

    let (headers, rows) = comparison_rows(&report.comparison.wide);
    write_table(&paths.results, &headers, &rows)?;
    write_table(
        &paths.model_performance,
        &["Metric", "Model", "Score"],
        &long_form_rows(&report.comparison.long),
    )?;
    let (headers, rows) = scorecard_rows(&report.scorecard);
    write_table(&paths.test_results, &headers, &rows)?;
    write_class_balance(&paths.class_imbalance, &report.label, &report.class_balance)?;
    write_column_summary(&paths.unique_counts, &report.column_summary)?;

    info!(dir = %output_dir.display(), "Wrote analysis artifacts");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use complaint_ml_metrics::{Metric, MetricsRecord};

    fn card() -> Scorecard {
        Scorecard {
            metrics: vec![Metric::Accuracy, Metric::Recall],
            columns: vec![
                (
                    "dummy".into(),
                    ModelOutcome::Scored(MetricsRecord::new(vec![(Metric::Accuracy, 0.7), (Metric::Recall, 0.0)])),
                ),
                ("svc".into(), ModelOutcome::Failed { reason: "diverged".into() }),
            ],
        }
    }

    #[test]
    fn test_scorecard_rows_mark_failures() {
        let (headers, rows) = scorecard_rows(&card());
        assert_eq!(headers, vec!["", "dummy", "svc"]);
        assert_eq!(rows[0], vec!["test_accuracy", "0.700", "failed"]);
        assert_eq!(rows[1], vec!["test_recall", "0.000", "failed"]);
    }

    #[test]
    fn test_comparison_and_long_rows() {
        let cmp = compare(&[
            ("dummy".to_string(), MetricsRecord::new(vec![(Metric::F1, 0.0)])),
            ("bayes".to_string(), MetricsRecord::new(vec![(Metric::F1, 0.4567)])),
        ])
        .unwrap();
        let (headers, rows) = comparison_rows(&cmp.wide);
        assert_eq!(headers, vec!["", "dummy", "bayes"]);
        assert_eq!(rows, vec![vec!["test_f1", "0.000", "0.457"]]);
        assert_eq!(long_form_rows(&cmp.long)[1], vec!["f1", "bayes", "0.457"]);
    }
}
