use complaint_ml_core::SparseMatrix;
use complaint_ml_data::Value;
use std::collections::HashMap;

use crate::error::{PreprocessError, PreprocessResult};

/// Encode one categorical column as indicator columns.
///
/// Categories are the sorted distinct values seen by [`OneHotEncoder::fit`].
/// A column with exactly two levels keeps only the indicator of the second
/// level. Values not seen at fit time, and missing cells, encode as all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
    category_to_idx: HashMap<String, usize>,
    binary: bool,
}

impl OneHotEncoder {
    /// Fit the encoder on the cells of one column.
    pub fn fit(values: &[Value]) -> Self {
        let mut unique: Vec<String> = values
            .iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect();
        unique.sort();
        unique.dedup();
        let category_to_idx = unique
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        OneHotEncoder {
            binary: unique.len() == 2,
            categories: unique,
            category_to_idx,
        }
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        if self.binary {
            1
        } else {
            self.categories.len()
        }
    }

    /// Output column names, `<column>_<category>`.
    pub fn feature_names(&self, column: &str) -> Vec<String> {
        let kept = if self.binary { &self.categories[1..] } else { &self.categories[..] };
        kept.iter().map(|c| format!("{}_{}", column, c)).collect()
    }

    fn output_index(&self, value: &Value) -> Option<usize> {
        if value.is_missing() {
            return None;
        }
        let idx = *self.category_to_idx.get(&value.to_string())?;
        match (self.binary, idx) {
            (true, 1) => Some(0),
            (true, _) => None,
            (false, i) => Some(i),
        }
    }

    /// Encode cells into an `n × width` indicator matrix with at most one
    /// entry per row.
    pub fn transform(&self, values: &[Value]) -> PreprocessResult<SparseMatrix<f64>> {
        let rows: Vec<Vec<(usize, f64)>> = values
            .iter()
            .map(|v| self.output_index(v).map(|j| (j, 1.0)).into_iter().collect())
            .collect();
        SparseMatrix::from_rows(rows, self.width()).map_err(PreprocessError::from)
    }
}
