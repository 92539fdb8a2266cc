pub mod classification;
pub mod scorer;

pub use classification::*;
pub use scorer::{round3, Metric, MetricsRecord, UnknownMetric, DEFAULT_METRICS, POSITIVE_CLASS};
