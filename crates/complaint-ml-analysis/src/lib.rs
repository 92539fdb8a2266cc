pub mod error;
pub mod config;
pub mod registry;
pub mod trainer;
pub mod compare;
pub mod evaluate;
pub mod report;
pub mod runner;

pub use error::{AnalysisError, AnalysisResult};
pub use config::{AnalysisConfig, DatasetSchema, ModelConfig};
pub use registry::{default_models, Classifier, ClassifierSpec};
pub use trainer::{train_model, FoldTimings, TrainingResult};
pub use compare::{compare, Comparison, ComparisonTable, LongFormRow};
pub use evaluate::{evaluate, ModelOutcome, Scorecard};
pub use report::{write_reports, ReportPaths};
pub use runner::{run_analysis, run_on_table, AnalysisReport};
