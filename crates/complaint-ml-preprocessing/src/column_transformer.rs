use complaint_ml_core::SparseMatrix;
use complaint_ml_data::Table;
use std::collections::HashSet;
use tracing::debug;

use crate::encoder::OneHotEncoder;
use crate::error::{PreprocessError, PreprocessResult};
use crate::text::CountVectorizer;

/// Column-typed preprocessing recipe: which columns are one-hot encoded,
/// which one is term-counted, and which are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessingPlan {
    pub categorical: Vec<String>,
    pub text: Option<String>,
    pub drop: Vec<String>,
    pub max_features: usize,
}

/// A plan fitted on one training table. Applied unchanged to any table with
/// the same columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPlan {
    plan: PreprocessingPlan,
    encoders: Vec<OneHotEncoder>,
    vectorizer: Option<CountVectorizer>,
}

impl PreprocessingPlan {
    pub fn new(
        categorical: Vec<String>,
        text: Option<String>,
        drop: Vec<String>,
        max_features: usize,
    ) -> Self {
        PreprocessingPlan {
            categorical,
            text,
            drop,
            max_features,
        }
    }

    fn declared(&self) -> impl Iterator<Item = &String> {
        self.categorical.iter().chain(self.text.iter()).chain(self.drop.iter())
    }

    /// Check that every column of `table` is declared exactly once and every
    /// declared column exists.
    pub fn validate(&self, table: &Table) -> PreprocessResult<()> {
        let mut seen = HashSet::new();
        for name in self.declared() {
            if !seen.insert(name.as_str()) {
                return Err(PreprocessError::Configuration(format!(
                    "column '{}' is declared more than once",
                    name
                )));
            }
            if !table.has_column(name) {
                return Err(PreprocessError::Configuration(format!(
                    "declared column '{}' is not in the feature table",
                    name
                )));
            }
        }
        if let Some(name) = table.column_names().iter().find(|n| !seen.contains(n.as_str())) {
            return Err(PreprocessError::Configuration(format!(
                "column '{}' is not classified as categorical, text or drop",
                name
            )));
        }
        if self.max_features == 0 {
            return Err(PreprocessError::Configuration(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Learn categories and vocabulary from a training table.
    pub fn fit(&self, table: &Table) -> PreprocessResult<FittedPlan> {
        self.validate(table)?;
        if table.is_empty() {
            return Err(PreprocessError::EmptyInput);
        }

        let encoders = self
            .categorical
            .iter()
            .map(|name| Ok(OneHotEncoder::fit(table.require_column(name)?)))
            .collect::<PreprocessResult<Vec<_>>>()?;
        let vectorizer = match &self.text {
            Some(name) => Some(CountVectorizer::fit(
                table.require_column(name)?,
                self.max_features,
            )?),
            None => None,
        };

        let fitted = FittedPlan {
            plan: self.clone(),
            encoders,
            vectorizer,
        };
        debug!(
            rows = table.n_rows(),
            features = fitted.n_features(),
            "Fitted preprocessing plan"
        );
        Ok(fitted)
    }
}

impl FittedPlan {
    pub fn plan(&self) -> &PreprocessingPlan {
        &self.plan
    }

    /// Width of the transformed matrix.
    pub fn n_features(&self) -> usize {
        self.encoders.iter().map(OneHotEncoder::width).sum::<usize>()
            + self.vectorizer.as_ref().map_or(0, CountVectorizer::width)
    }

    /// Output column names: one-hot blocks in declaration order, then terms.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .plan
            .categorical
            .iter()
            .zip(&self.encoders)
            .flat_map(|(col, enc)| enc.feature_names(col))
            .collect();
        if let Some(v) = &self.vectorizer {
            names.extend(v.vocabulary.iter().cloned());
        }
        names
    }

    /// Encode a table into a sparse `n_rows × n_features` matrix. Each row
    /// stores at most one entry per categorical column plus its distinct terms.
    pub fn transform(&self, table: &Table) -> PreprocessResult<SparseMatrix<f64>> {
        self.plan.validate(table)?;

        let mut blocks = Vec::with_capacity(self.encoders.len() + 1);
        for (name, enc) in self.plan.categorical.iter().zip(&self.encoders) {
            blocks.push(enc.transform(table.require_column(name)?)?);
        }
        if let (Some(name), Some(v)) = (&self.plan.text, &self.vectorizer) {
            blocks.push(v.transform(table.require_column(name)?)?);
        }
        if blocks.is_empty() {
            return Ok(SparseMatrix::zeros(table.n_rows(), 0));
        }
        let refs: Vec<&SparseMatrix<f64>> = blocks.iter().collect();
        let matrix = SparseMatrix::hstack(&refs)?;
        debug!(
            rows = matrix.nrows(),
            features = matrix.ncols(),
            nnz = matrix.nnz(),
            density = matrix.density(),
            "Transformed table"
        );
        Ok(matrix)
    }
}
