use complaint_ml_core::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::error::{DataError, DataResult};
use crate::table::{Table, Value};

/// Feature table paired with its binary label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledData {
    pub features: Table,
    pub labels: Tensor<f64>,
}

impl LabeledData {
    pub fn new(features: Table, labels: Tensor<f64>) -> DataResult<Self> {
        if features.n_rows() != labels.numel() {
            return Err(DataError::InvalidArgument(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.numel()
            )));
        }
        Ok(LabeledData { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subset of rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> DataResult<LabeledData> {
        let features = self.features.select_rows(indices)?;
        let labels = self
            .labels
            .select_rows(indices)
            .map_err(|e| DataError::InvalidArgument(e.to_string()))?;
        Ok(LabeledData { features, labels })
    }
}

/// Turn a loaded complaints table into model-ready features and labels.
///
/// Rows without a label are discarded, the label becomes 1.0 for
/// `positive_label` and 0.0 otherwise, the `excluded` columns are removed,
/// and any row still holding a missing cell is dropped.
pub fn prepare_dataset<S: AsRef<str>>(
    table: &Table,
    label: &str,
    positive_label: &str,
    excluded: &[S],
) -> DataResult<LabeledData> {
    let label_col = table.require_column(label)?;

    let labelled: Vec<usize> = (0..table.n_rows())
        .filter(|&i| !label_col[i].is_missing())
        .collect();
    let features = table.drop_columns(&[label]).drop_columns(excluded);

    let keep: Vec<usize> = labelled
        .into_iter()
        .filter(|&i| !features.row_has_missing(i))
        .collect();

    let labels: Vec<f64> = keep
        .iter()
        .map(|&i| match &label_col[i] {
            Value::Text(s) if s == positive_label => 1.0,
            Value::Number(v) if v.to_string() == positive_label => 1.0,
            _ => 0.0,
        })
        .collect();
    let features = features.select_rows(&keep)?;

    info!(
        input_rows = table.n_rows(),
        kept_rows = keep.len(),
        feature_columns = features.n_cols(),
        positives = labels.iter().filter(|&&v| v > 0.5).count(),
        "Prepared labelled dataset"
    );
    LabeledData::new(features, Tensor::from_slice(&labels))
}

/// Shuffle with a fixed seed and split off `test_ratio` of the rows.
///
/// Returns `(train, test)`. The test size is rounded up.
pub fn train_test_split(
    data: &LabeledData,
    test_ratio: f64,
    seed: u64,
) -> DataResult<(LabeledData, LabeledData)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(DataError::InvalidArgument(format!(
            "test ratio must lie in (0, 1), got {}",
            test_ratio
        )));
    }
    let n = data.len();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((n as f64 * test_ratio).ceil() as usize).min(n);
    let (test_idx, train_idx) = indices.split_at(test_size);

    let train = data.select(train_idx)?;
    let test = data.select(test_idx)?;
    info!(train_rows = train.len(), test_rows = test.len(), seed, "Split dataset");
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Table {
        Table::from_str_columns(&[
            ("product", vec!["Mortgage", "Credit card", "Mortgage", "", "Student loan"]),
            ("tags", vec!["", "", "Older American", "", ""]),
            ("consumer_disputed", vec!["No", "Yes", "", "No", "Yes"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_prepare_filters_and_encodes() {
        let data = prepare_dataset(&raw(), "consumer_disputed", "Yes", &["tags"]).unwrap();
        // row 2 has no label, row 3 has a missing product
        assert_eq!(data.len(), 3);
        assert_eq!(data.labels.data(), &[0.0, 1.0, 1.0]);
        assert_eq!(data.features.column_names(), &["product".to_string()]);
        assert!(!data.features.has_column("consumer_disputed"));
    }

    #[test]
    fn test_prepare_requires_label() {
        let err = prepare_dataset(&raw(), "missing", "Yes", &[] as &[&str]).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(_)));
    }

    #[test]
    fn test_prepare_can_empty_out() {
        let t = Table::from_str_columns(&[("consumer_disputed", vec!["", ""])]).unwrap();
        let data = prepare_dataset(&t, "consumer_disputed", "Yes", &[] as &[&str]).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_train_test_split() {
        let n = 10;
        let ids: Vec<Value> = (0..n).map(|i| Value::Number(i as f64)).collect();
        let features = Table::new(vec!["id".into()], vec![ids]).unwrap();
        let labels: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let data = LabeledData::new(features, Tensor::from_slice(&labels)).unwrap();

        let (train, test) = train_test_split(&data, 0.25, 123).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);

        // labels stay aligned with their rows
        for part in [&train, &test] {
            let ids = part.features.column("id").unwrap();
            for (i, v) in ids.iter().enumerate() {
                let id = v.as_number().unwrap() as usize;
                assert_eq!(part.labels.data()[i], (id % 2) as f64);
            }
        }

        let (train2, _) = train_test_split(&data, 0.25, 123).unwrap();
        assert_eq!(train, train2);
        assert!(train_test_split(&data, 1.0, 1).is_err());
    }
}
