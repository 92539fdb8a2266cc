use complaint_ml_core::{Float, Tensor};
use complaint_ml_core::error::TensorResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::classification::{accuracy, f1_score_class, precision_class, recall_class};

/// Class whose precision, recall and F1 are reported.
pub const POSITIVE_CLASS: usize = 1;

pub const DEFAULT_METRICS: [Metric; 4] = [Metric::Accuracy, Metric::Recall, Metric::Precision, Metric::F1];

/// A named scoring function over hard predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Accuracy,
    Recall,
    Precision,
    #[serde(alias = "f1_score")]
    F1,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown metric '{0}' (expected accuracy, recall, precision or f1)")]
pub struct UnknownMetric(pub String);

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Recall => "recall",
            Metric::Precision => "precision",
            Metric::F1 => "f1",
        }
    }

    /// Score predictions; recall, precision and F1 are for [`POSITIVE_CLASS`].
    pub fn score<T: Float>(&self, y_true: &Tensor<T>, y_pred: &Tensor<T>) -> TensorResult<f64> {
        match self {
            Metric::Accuracy => accuracy(y_true, y_pred),
            Metric::Recall => recall_class(y_true, y_pred, POSITIVE_CLASS),
            Metric::Precision => precision_class(y_true, y_pred, POSITIVE_CLASS),
            Metric::F1 => f1_score_class(y_true, y_pred, POSITIVE_CLASS),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accuracy" => Ok(Metric::Accuracy),
            "recall" => Ok(Metric::Recall),
            "precision" => Ok(Metric::Precision),
            "f1" | "f1_score" => Ok(Metric::F1),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// Round to three decimal places, halves to even (`0.0625` becomes `0.062`).
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round_ties_even() / 1000.0
}

/// Metric values keyed by metric, in the order the metrics were requested.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsRecord {
    entries: Vec<(Metric, f64)>,
}

impl MetricsRecord {
    pub fn new(entries: Vec<(Metric, f64)>) -> Self {
        MetricsRecord { entries }
    }

    /// Score every metric on one set of predictions.
    pub fn score<T: Float>(metrics: &[Metric], y_true: &Tensor<T>, y_pred: &Tensor<T>) -> TensorResult<Self> {
        let entries = metrics
            .iter()
            .map(|m| Ok((*m, m.score(y_true, y_pred)?)))
            .collect::<TensorResult<Vec<_>>>()?;
        Ok(MetricsRecord { entries })
    }

    /// Per-metric mean over several records (e.g. cross-validation folds).
    /// Metrics missing from a record are skipped for that record.
    pub fn mean(metrics: &[Metric], records: &[MetricsRecord]) -> Self {
        let entries = metrics
            .iter()
            .map(|m| {
                let values: Vec<f64> = records.iter().filter_map(|r| r.get(*m)).collect();
                let mean = if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                };
                (*m, mean)
            })
            .collect();
        MetricsRecord { entries }
    }

    /// Same record with every value rounded to three decimals.
    pub fn rounded(&self) -> Self {
        MetricsRecord {
            entries: self.entries.iter().map(|&(m, v)| (m, round3(v))).collect(),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.entries.iter().find(|(m, _)| *m == metric).map(|&(_, v)| v)
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.entries.iter().map(|&(m, _)| m).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Metric, f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric() {
        assert_eq!("accuracy".parse::<Metric>().unwrap(), Metric::Accuracy);
        assert_eq!(" F1 ".parse::<Metric>().unwrap(), Metric::F1);
        assert_eq!("f1_score".parse::<Metric>().unwrap(), Metric::F1);
        assert!("roc_auc".parse::<Metric>().is_err());
        assert_eq!(Metric::Precision.to_string(), "precision");
    }

    #[test]
    fn test_record_keeps_request_order() {
        let y_true: Tensor<f64> = Tensor::from_slice(&[1.0, 0.0, 1.0, 0.0]);
        let y_pred: Tensor<f64> = Tensor::from_slice(&[1.0, 0.0, 0.0, 0.0]);
        let metrics = [Metric::F1, Metric::Accuracy];
        let rec = MetricsRecord::score(&metrics, &y_true, &y_pred).unwrap();
        assert_eq!(rec.metrics(), vec![Metric::F1, Metric::Accuracy]);
        assert_eq!(rec.get(Metric::Accuracy), Some(0.75));
        assert_eq!(rec.get(Metric::Recall), None);
    }

    #[test]
    fn test_mean_and_rounding() {
        let metrics = [Metric::Recall];
        let folds = vec![
            MetricsRecord::new(vec![(Metric::Recall, 1.0 / 3.0)]),
            MetricsRecord::new(vec![(Metric::Recall, 0.5)]),
        ];
        let mean = MetricsRecord::mean(&metrics, &folds).rounded();
        assert_eq!(mean.get(Metric::Recall), Some(0.417));
        assert_eq!(round3(0.66666), 0.667);
    }

    #[test]
    fn test_round3_halves_to_even() {
        assert_eq!(round3(0.0625), 0.062);
        assert_eq!(round3(0.1875), 0.188);
        assert_eq!(round3(1.0), 1.0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DEFAULT_METRICS).unwrap();
        assert_eq!(json, r#"["accuracy","recall","precision","f1"]"#);
    }
}
