use complaint_ml_data::RowLimit;
use complaint_ml_metrics::{Metric, DEFAULT_METRICS};
use complaint_ml_preprocessing::PreprocessingPlan;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResult};
use crate::registry::{default_models, ClassifierSpec};

/// Which columns play which role in the complaints table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    pub label: String,
    /// Label value counted as the positive (disputed) class.
    pub positive_label: String,
    /// Identifier and date columns removed before modelling.
    pub excluded: Vec<String>,
    pub categorical: Vec<String>,
    pub text: Option<String>,
    pub drop: Vec<String>,
    pub max_features: usize,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        DatasetSchema {
            label: "consumer_disputed".into(),
            positive_label: "Yes".into(),
            excluded: owned(&["date_received", "zip_code", "tags", "date_sent_to_company", "complaint_id"]),
            categorical: owned(&[
                "product",
                "sub_product",
                "issue",
                "sub_issue",
                "company_public_response",
                "company",
                "state",
                "company_response_to_consumer",
                "timely_response",
            ]),
            text: Some("consumer_complaint_narrative".into()),
            drop: owned(&["consumer_consent_provided", "submitted_via"]),
            max_features: 3000,
        }
    }
}

impl DatasetSchema {
    /// The preprocessing plan shared by every model.
    pub fn plan(&self) -> PreprocessingPlan {
        PreprocessingPlan::new(
            self.categorical.clone(),
            self.text.clone(),
            self.drop.clone(),
            self.max_features,
        )
    }
}

/// One registry entry: a report name and its classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub classifier: ClassifierSpec,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, classifier: ClassifierSpec) -> Self {
        ModelConfig {
            name: name.into(),
            classifier,
        }
    }
}

/// Everything one analysis run needs. Built once by the entry point and
/// passed down explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    #[serde(serialize_with = "serialize_row_limit", deserialize_with = "deserialize_row_limit")]
    pub row_limit: RowLimit,
    pub skip_rows: usize,
    pub test_size: f64,
    pub split_seed: u64,
    pub cv_folds: usize,
    pub metrics: Vec<Metric>,
    pub schema: DatasetSchema,
    pub models: Vec<ModelConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            data_path: PathBuf::from("data/complaints.csv"),
            output_dir: PathBuf::from("results"),
            row_limit: RowLimit::All,
            skip_rows: 0,
            test_size: 0.2,
            split_seed: 123,
            cv_folds: 5,
            metrics: DEFAULT_METRICS.to_vec(),
            schema: DatasetSchema::default(),
            models: default_models(),
        }
    }
}

impl AnalysisConfig {
    /// Read a (possibly partial) JSON config; absent fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        let config: AnalysisConfig = complaint_ml_io::load_json(path)?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AnalysisError::Configuration(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(AnalysisError::Configuration(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.metrics.is_empty() {
            return Err(AnalysisError::Configuration("no metrics requested".into()));
        }
        let mut seen_metrics = HashSet::new();
        if let Some(m) = self.metrics.iter().find(|m| !seen_metrics.insert(**m)) {
            return Err(AnalysisError::Configuration(format!("metric '{}' requested twice", m)));
        }
        if self.models.is_empty() {
            return Err(AnalysisError::Configuration("no models configured".into()));
        }
        let mut seen_models = HashSet::new();
        for model in &self.models {
            if !seen_models.insert(model.name.as_str()) {
                return Err(AnalysisError::Configuration(format!(
                    "model name '{}' used twice",
                    model.name
                )));
            }
            model.classifier.validate()?;
        }
        if self.schema.max_features == 0 {
            return Err(AnalysisError::Configuration("max_features must be at least 1".into()));
        }
        Ok(())
    }
}

fn serialize_row_limit<S: Serializer>(limit: &RowLimit, serializer: S) -> Result<S::Ok, S::Error> {
    match limit {
        RowLimit::All => serializer.serialize_str("all"),
        RowLimit::Count(n) => serializer.serialize_u64(*n as u64),
    }
}

fn deserialize_row_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RowLimit, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Count(n) => Ok(RowLimit::Count(n)),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
