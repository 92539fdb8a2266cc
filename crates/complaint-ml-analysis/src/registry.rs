use complaint_ml_core::error::TensorResult;
use complaint_ml_core::{ClassWeight, SparseMatrix, Tensor};
use complaint_ml_dummy::DummyClassifier;
use complaint_ml_linear::LogisticRegression;
use complaint_ml_naive_bayes::BernoulliNB;
use complaint_ml_pipeline::{Estimator, EstimatorSpec};
use complaint_ml_svm::{Gamma, SVC};
use complaint_ml_tree::{MaxFeatures, RandomForestClassifier};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub max_iter: usize,
    pub c: f64,
    pub tol: f64,
    pub class_weight: ClassWeight,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            max_iter: 1000,
            c: 1.0,
            tol: 1e-4,
            class_weight: ClassWeight::Balanced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesParams {
    pub alpha: f64,
    pub binarize: f64,
}

impl Default for BayesParams {
    fn default() -> Self {
        BayesParams {
            alpha: 0.1,
            binarize: 0.0,
        }
    }
}

/// RBF width: `"scale"` or `{"value": g}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GammaSetting {
    #[default]
    Scale,
    Value(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcParams {
    pub c: f64,
    pub gamma: GammaSetting,
    pub max_passes: usize,
    pub max_iter: usize,
    pub seed: u64,
    pub class_weight: ClassWeight,
}

impl Default for SvcParams {
    fn default() -> Self {
        SvcParams {
            c: 1.0,
            gamma: GammaSetting::Scale,
            max_passes: 10,
            max_iter: 1000,
            seed: 123,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Features examined per split: `"all"`, `"sqrt"` or `{"count": k}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSubset {
    All,
    #[default]
    Sqrt,
    Count(usize),
}

impl From<FeatureSubset> for MaxFeatures {
    fn from(subset: FeatureSubset) -> Self {
        match subset {
            FeatureSubset::All => MaxFeatures::All,
            FeatureSubset::Sqrt => MaxFeatures::Sqrt,
            FeatureSubset::Count(k) => MaxFeatures::Count(k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub max_features: FeatureSubset,
    pub seed: u64,
    pub class_weight: ClassWeight,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            max_features: FeatureSubset::Sqrt,
            seed: 123,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Which classifier family to train and with which hyperparameters.
///
/// Serialized with a `kind` tag, e.g. `{"kind": "svc", "c": 2.0}`; omitted
/// fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// Always predicts the majority training class.
    Dummy,
    LogisticRegression(LogisticParams),
    BernoulliNb(BayesParams),
    Svc(SvcParams),
    RandomForest(ForestParams),
}

impl ClassifierSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierSpec::Dummy => "dummy",
            ClassifierSpec::LogisticRegression(_) => "logistic_regression",
            ClassifierSpec::BernoulliNb(_) => "bernoulli_nb",
            ClassifierSpec::Svc(_) => "svc",
            ClassifierSpec::RandomForest(_) => "random_forest",
        }
    }

    /// Reject hyperparameters no model could be fit with.
    pub fn validate(&self) -> AnalysisResult<()> {
        let problem = match self {
            ClassifierSpec::Dummy => None,
            ClassifierSpec::LogisticRegression(p) => {
                if p.max_iter == 0 {
                    Some("max_iter must be at least 1".to_string())
                } else if !(p.c > 0.0) {
                    Some(format!("C must be positive, got {}", p.c))
                } else if !(p.tol > 0.0) {
                    Some(format!("tol must be positive, got {}", p.tol))
                } else {
                    None
                }
            }
            ClassifierSpec::BernoulliNb(p) => {
                if !(p.alpha > 0.0) {
                    Some(format!("alpha must be positive, got {}", p.alpha))
                } else if !(p.binarize >= 0.0) {
                    Some(format!("binarize must be non-negative, got {}", p.binarize))
                } else {
                    None
                }
            }
            ClassifierSpec::Svc(p) => {
                if !(p.c > 0.0) {
                    Some(format!("C must be positive, got {}", p.c))
                } else if p.max_passes == 0 || p.max_iter == 0 {
                    Some("max_passes and max_iter must be at least 1".to_string())
                } else if matches!(p.gamma, GammaSetting::Value(g) if !(g > 0.0)) {
                    Some("gamma must be positive".to_string())
                } else {
                    None
                }
            }
            ClassifierSpec::RandomForest(p) => {
                if p.n_estimators == 0 {
                    Some("n_estimators must be at least 1".to_string())
                } else if p.max_depth == Some(0) {
                    Some("max_depth must be at least 1".to_string())
                } else if p.max_features == FeatureSubset::Count(0) {
                    Some("max_features count must be at least 1".to_string())
                } else {
                    None
                }
            }
        };
        match problem {
            Some(reason) => Err(AnalysisError::Configuration(format!("{}: {}", self.kind(), reason))),
            None => Ok(()),
        }
    }

    /// A fresh, unfitted classifier.
    pub fn classifier(&self) -> Classifier {
        match self {
            ClassifierSpec::Dummy => Classifier::Dummy(DummyClassifier::new()),
            ClassifierSpec::LogisticRegression(p) => Classifier::Logistic(
                LogisticRegression::new(p.max_iter)
                    .with_c(p.c)
                    .with_tol(p.tol)
                    .with_class_weight(p.class_weight),
            ),
            ClassifierSpec::BernoulliNb(p) => {
                Classifier::Bayes(BernoulliNB::new(p.alpha).with_binarize(p.binarize))
            }
            ClassifierSpec::Svc(p) => {
                let gamma = match p.gamma {
                    GammaSetting::Scale => Gamma::Scale,
                    GammaSetting::Value(g) => Gamma::Value(g),
                };
                Classifier::Svc(
                    SVC::new(p.c, gamma, p.max_passes)
                        .with_max_iter(p.max_iter)
                        .with_seed(p.seed)
                        .with_class_weight(p.class_weight),
                )
            }
            ClassifierSpec::RandomForest(p) => Classifier::Forest(
                RandomForestClassifier::new(p.n_estimators, p.max_depth, p.max_features.into())
                    .with_seed(p.seed)
                    .with_class_weight(p.class_weight),
            ),
        }
    }
}

impl EstimatorSpec for ClassifierSpec {
    fn build(&self) -> Box<dyn Estimator> {
        Box::new(self.classifier())
    }
}

/// The classifier families a pipeline can end in.
#[derive(Debug, Clone)]
pub enum Classifier {
    Dummy(DummyClassifier),
    Logistic(LogisticRegression<f64>),
    Bayes(BernoulliNB<f64>),
    Svc(SVC<f64>),
    Forest(RandomForestClassifier<f64>),
}

impl Estimator for Classifier {
    fn fit(&mut self, x: &SparseMatrix<f64>, y: &Tensor<f64>) -> TensorResult<()> {
        match self {
            Classifier::Dummy(m) => m.fit(x, y),
            Classifier::Logistic(m) => m.fit(x, y),
            Classifier::Bayes(m) => m.fit(x, y),
            Classifier::Svc(m) => m.fit(x, y),
            Classifier::Forest(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &SparseMatrix<f64>) -> TensorResult<Tensor<f64>> {
        match self {
            Classifier::Dummy(m) => m.predict(x),
            Classifier::Logistic(m) => m.predict(x),
            Classifier::Bayes(m) => m.predict(x),
            Classifier::Svc(m) => m.predict(x),
            Classifier::Forest(m) => m.predict(x),
        }
    }
}

/// The five baseline models, in report order.
pub fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig::new("dummy", ClassifierSpec::Dummy),
        ModelConfig::new("logreg", ClassifierSpec::LogisticRegression(LogisticParams::default())),
        ModelConfig::new("bayes", ClassifierSpec::BernoulliNb(BayesParams::default())),
        ModelConfig::new("svc", ClassifierSpec::Svc(SvcParams::default())),
        ModelConfig::new("random forest", ClassifierSpec::RandomForest(ForestParams::default())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (SparseMatrix<f64>, Tensor<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let positive = i % 3 == 0;
            rows.push(if positive { vec![1.0, 0.0] } else { vec![0.0, 1.0] });
            labels.push(if positive { 1.0 } else { 0.0 });
        }
        let x = SparseMatrix::from_dense(&Tensor::from_vec2d(&rows).unwrap()).unwrap();
        (x, Tensor::from_slice(&labels))
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let spec: ClassifierSpec = serde_json::from_str(r#"{"kind": "svc", "c": 2.0}"#).unwrap();
        match spec {
            ClassifierSpec::Svc(p) => {
                assert_eq!(p.c, 2.0);
                assert_eq!(p.gamma, GammaSetting::Scale);
                assert_eq!(p.seed, 123);
                assert_eq!(p.class_weight, ClassWeight::Balanced);
            }
            other => panic!("unexpected spec {:?}", other),
        }

        let spec: ClassifierSpec =
            serde_json::from_str(r#"{"kind": "random_forest", "max_features": {"count": 3}}"#).unwrap();
        assert_eq!(
            spec,
            ClassifierSpec::RandomForest(ForestParams {
                max_features: FeatureSubset::Count(3),
                ..ForestParams::default()
            })
        );

        let dummy: ClassifierSpec = serde_json::from_str(r#"{"kind": "dummy"}"#).unwrap();
        assert_eq!(dummy, ClassifierSpec::Dummy);
        assert!(serde_json::from_str::<ClassifierSpec>(r#"{"kind": "knn"}"#).is_err());
    }

    #[test]
    fn test_every_default_model_fits() {
        let (x, y) = separable();
        for model in default_models() {
            model.classifier.validate().unwrap();
            let mut est = model.classifier.build();
            est.fit(&x, &y).unwrap();
            let pred = est.predict(&x).unwrap();
            assert_eq!(pred.numel(), 12, "{}", model.name);
            if model.name != "dummy" {
                assert_eq!(pred.data(), y.data(), "{}", model.name);
            }
        }
    }

    #[test]
    fn test_default_names() {
        let names: Vec<String> = default_models().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["dummy", "logreg", "bayes", "svc", "random forest"]);
    }

    #[test]
    fn test_validate_rejects_bad_hyperparameters() {
        let bad = ClassifierSpec::LogisticRegression(LogisticParams {
            c: 0.0,
            ..LogisticParams::default()
        });
        assert!(matches!(bad.validate(), Err(AnalysisError::Configuration(_))));

        let bad = ClassifierSpec::Svc(SvcParams {
            gamma: GammaSetting::Value(-1.0),
            ..SvcParams::default()
        });
        assert!(bad.validate().is_err());

        let bad = ClassifierSpec::BernoulliNb(BayesParams {
            binarize: -1.0,
            ..BayesParams::default()
        });
        assert!(bad.validate().is_err());

        let bad = ClassifierSpec::RandomForest(ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        });
        assert!(bad.validate().is_err());
    }
}
