//! # complaint-ml
//!
//! Predicts whether a consumer complaint will be disputed by comparing
//! baseline classifiers under one shared preprocessing plan.
//!
//! ## Modules
//!
//! - **core**: dense label tensors, sparse feature matrices, the `Float` trait, class weights
//! - **data**: complaints CSV loading, label preparation, train/test split, summaries
//! - **preprocessing**: one-hot encoding, term counts, the column plan
//! - **dummy**: majority-class baseline
//! - **linear**: logistic regression
//! - **naive_bayes**: Bernoulli naive Bayes
//! - **svm**: RBF support vector classifier
//! - **tree**: decision tree and random forest
//! - **metrics**: accuracy, precision, recall, F1 and the `Metric` scorer set
//! - **pipeline**: plan + estimator pipelines, stratified cross-validation
//! - **io**: CSV report tables and JSON files
//! - **analysis**: model registry, training, comparison, held-out evaluation

/// Core tensor engine.
pub use complaint_ml_core as core;

/// Loading and preparing complaint tables.
pub use complaint_ml_data as data;

/// Column-wise feature preprocessing.
pub use complaint_ml_preprocessing as preprocessing;

/// Majority-class baseline.
pub use complaint_ml_dummy as dummy;

/// Linear models.
pub use complaint_ml_linear as linear;

/// Naive Bayes classifiers.
pub use complaint_ml_naive_bayes as naive_bayes;

/// Support vector machines.
pub use complaint_ml_svm as svm;

/// Tree-based models.
pub use complaint_ml_tree as tree;

/// Evaluation metrics.
pub use complaint_ml_metrics as metrics;

/// Pipeline API.
pub use complaint_ml_pipeline as pipeline;

/// Report I/O.
pub use complaint_ml_io as io;

/// The model-comparison harness.
pub use complaint_ml_analysis as analysis;

pub use complaint_ml_analysis::{run_analysis, AnalysisConfig, AnalysisError, AnalysisReport};
