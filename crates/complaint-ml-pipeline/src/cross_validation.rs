use complaint_ml_core::{Float, Tensor};
use complaint_ml_data::LabeledData;
use complaint_ml_metrics::{Metric, MetricsRecord};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Pipeline;

/// A single train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Scores and timings of one fold.
#[derive(Debug, Clone)]
pub struct FoldScore {
    pub fold_idx: usize,
    pub metrics: MetricsRecord,
    pub fit_time: Duration,
    pub score_time: Duration,
}

/// Per-fold results plus their per-metric mean.
#[derive(Debug, Clone)]
pub struct CvResults {
    pub folds: Vec<FoldScore>,
    pub mean: MetricsRecord,
}

/// Stratified k-fold without shuffling.
///
/// Samples of each class (in ascending label order) are dealt to the folds
/// round-robin, continuing where the previous class stopped, so every fold
/// gets close to the overall class ratio and fold sizes differ by at most one.
pub fn stratified_k_fold(y: &Tensor<f64>, n_splits: usize) -> PipelineResult<Vec<CvSplit>> {
    let n = y.numel();
    if n_splits < 2 {
        return Err(PipelineError::InvalidFolds(format!(
            "need at least 2 folds, got {}",
            n_splits
        )));
    }
    if n < n_splits {
        return Err(PipelineError::InvalidFolds(format!(
            "cannot split {} samples into {} folds",
            n, n_splits
        )));
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, v) in y.data().iter().enumerate() {
        by_class.entry(v.to_class()).or_default().push(i);
    }
    for (class, members) in &by_class {
        if members.len() < n_splits {
            warn!(class, members = members.len(), n_splits, "Class has fewer members than folds");
        }
    }

    let mut assignment = vec![0usize; n];
    let mut next = 0usize;
    for members in by_class.values() {
        for &i in members {
            assignment[i] = next % n_splits;
            next += 1;
        }
    }

    Ok((0..n_splits)
        .map(|fold_idx| {
            let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                (0..n).partition(|&i| assignment[i] == fold_idx);
            CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            }
        })
        .collect())
}

fn run_fold(pipeline: &Pipeline, data: &LabeledData, split: &CvSplit, metrics: &[Metric]) -> PipelineResult<FoldScore> {
    let train = data.select(&split.train_indices)?;
    let test = data.select(&split.test_indices)?;

    let start = Instant::now();
    let fitted = pipeline.fit(&train.features, &train.labels)?;
    let fit_time = start.elapsed();

    let start = Instant::now();
    let predictions = fitted.predict(&test.features)?;
    let metrics = MetricsRecord::score(metrics, &test.labels, &predictions)?;
    let score_time = start.elapsed();

    debug!(fold = split.fold_idx, ?fit_time, ?score_time, "Fold finished");
    Ok(FoldScore {
        fold_idx: split.fold_idx,
        metrics,
        fit_time,
        score_time,
    })
}

/// Fit a fresh copy of the pipeline on each fold's training rows and score
/// it on the held-out rows. Folds run in parallel; results are reported in
/// fold order and the mean is not rounded.
pub fn cross_validate(
    pipeline: &Pipeline,
    data: &LabeledData,
    metrics: &[Metric],
    n_splits: usize,
) -> PipelineResult<CvResults> {
    let splits = stratified_k_fold(&data.labels, n_splits)?;
    let folds = splits
        .par_iter()
        .map(|split| run_fold(pipeline, data, split, metrics))
        .collect::<PipelineResult<Vec<_>>>()?;

    let records: Vec<MetricsRecord> = folds.iter().map(|f| f.metrics.clone()).collect();
    let mean = MetricsRecord::mean(metrics, &records);
    Ok(CvResults { folds, mean })
}
