use complaint_ml_metrics::{Metric, MetricsRecord};

use crate::error::{AnalysisError, AnalysisResult};

/// Prefix of cross-validated score rows.
pub const SCORE_PREFIX: &str = "test_";

/// Metrics as rows, models as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub metrics: Vec<Metric>,
    pub models: Vec<String>,
    /// `values[metric][model]`
    pub values: Vec<Vec<f64>>,
}

impl ComparisonTable {
    /// Row labels, `test_<metric>`.
    pub fn row_labels(&self) -> Vec<String> {
        self.metrics.iter().map(|m| format!("{}{}", SCORE_PREFIX, m)).collect()
    }

    pub fn get(&self, metric: Metric, model: &str) -> Option<f64> {
        let row = self.metrics.iter().position(|m| *m == metric)?;
        let col = self.models.iter().position(|m| m == model)?;
        Some(self.values[row][col])
    }
}

/// One `(metric, model, score)` observation for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct LongFormRow {
    pub metric: Metric,
    pub model: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub wide: ComparisonTable,
    /// Model-major: all metrics of the first model, then the next.
    pub long: Vec<LongFormRow>,
}

/// Line up per-model metric records side by side.
///
/// Metric order follows the first record; every record must carry the same
/// metric set.
pub fn compare(results: &[(String, MetricsRecord)]) -> AnalysisResult<Comparison> {
    let metrics = results.first().map(|(_, r)| r.metrics()).unwrap_or_default();
    let models: Vec<String> = results.iter().map(|(name, _)| name.clone()).collect();

    let mut values = vec![Vec::with_capacity(results.len()); metrics.len()];
    let mut long = Vec::with_capacity(results.len() * metrics.len());
    for (name, record) in results {
        if record.len() != metrics.len() {
            return Err(AnalysisError::Configuration(format!(
                "model '{}' reports {} metrics, expected {}",
                name,
                record.len(),
                metrics.len()
            )));
        }
        for (row, metric) in metrics.iter().enumerate() {
            let score = record.get(*metric).ok_or_else(|| {
                AnalysisError::Configuration(format!("model '{}' has no {} score", name, metric))
            })?;
            values[row].push(score);
            long.push(LongFormRow {
                metric: *metric,
                model: name.clone(),
                score,
            });
        }
    }

    Ok(Comparison {
        wide: ComparisonTable {
            metrics,
            models,
            values,
        },
        long,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(acc: f64, rec: f64) -> MetricsRecord {
        MetricsRecord::new(vec![(Metric::Accuracy, acc), (Metric::Recall, rec)])
    }

    #[test]
    fn test_wide_and_long_shapes() {
        let results = vec![
            ("dummy".to_string(), record(0.8, 0.0)),
            ("logreg".to_string(), record(0.7, 0.6)),
            ("bayes".to_string(), record(0.75, 0.4)),
        ];
        let cmp = compare(&results).unwrap();

        assert_eq!(cmp.wide.models, vec!["dummy", "logreg", "bayes"]);
        assert_eq!(cmp.wide.row_labels(), vec!["test_accuracy", "test_recall"]);
        assert_eq!(cmp.wide.values, vec![vec![0.8, 0.7, 0.75], vec![0.0, 0.6, 0.4]]);
        assert_eq!(cmp.wide.get(Metric::Recall, "logreg"), Some(0.6));

        assert_eq!(cmp.long.len(), 6);
        assert_eq!(cmp.long[1], LongFormRow { metric: Metric::Recall, model: "dummy".into(), score: 0.0 });
        assert_eq!(cmp.long[2].model, "logreg");
    }

    #[test]
    fn test_mismatched_metric_sets() {
        let results = vec![
            ("dummy".to_string(), record(0.8, 0.0)),
            ("svc".to_string(), MetricsRecord::new(vec![(Metric::Accuracy, 0.9)])),
        ];
        assert!(matches!(compare(&results), Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn test_no_models() {
        let cmp = compare(&[]).unwrap();
        assert!(cmp.wide.models.is_empty());
        assert!(cmp.long.is_empty());
    }
}
