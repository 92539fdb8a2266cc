//! complaint-ml CLI
//!
//! Trains the baseline classifiers on a complaints CSV and writes the
//! comparison and held-out tables.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use complaint_ml::analysis::report::{comparison_rows, scorecard_rows, ReportPaths};
use complaint_ml::data::{parse_skip_rows, RowLimit};
use complaint_ml::metrics::Metric;
use complaint_ml::{run_analysis, AnalysisConfig, AnalysisError};

#[derive(Parser, Debug)]
#[command(name = "complaint-ml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare baseline classifiers for predicting disputed complaints", long_about = None)]
struct Cli {
    /// JSON config; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Complaints CSV
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory for the result tables
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rows to read: "all" or a count
    #[arg(long)]
    rows: Option<String>,

    /// Data rows to skip after the header
    #[arg(long)]
    skip_rows: Option<String>,

    /// Fraction of rows held out for testing
    #[arg(long)]
    test_size: Option<f64>,

    /// Seed of the train/test shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Cross-validation folds
    #[arg(long)]
    cv_folds: Option<usize>,

    /// Comma-separated metrics (accuracy, recall, precision, f1)
    #[arg(long, value_delimiter = ',')]
    metrics: Option<Vec<String>>,

    /// Comma-separated subset of configured model names to run
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn into_config(self) -> Result<AnalysisConfig, AnalysisError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(rows) = self.rows {
            config.row_limit = rows.parse::<RowLimit>()?;
        }
        if let Some(skip) = self.skip_rows {
            config.skip_rows = parse_skip_rows(&skip)?;
        }
        if let Some(test_size) = self.test_size {
            config.test_size = test_size;
        }
        if let Some(seed) = self.seed {
            config.split_seed = seed;
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if let Some(metrics) = self.metrics {
            config.metrics = metrics
                .iter()
                .map(|m| m.parse::<Metric>())
                .collect::<Result<_, _>>()?;
        }
        if let Some(names) = self.models {
            if let Some(unknown) = names.iter().find(|n| !config.models.iter().any(|m| &m.name == *n)) {
                return Err(AnalysisError::Configuration(format!("unknown model '{}'", unknown)));
            }
            config.models.retain(|m| names.contains(&m.name));
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_table(title: &str, (headers, rows): (Vec<String>, Vec<Vec<String>>)) {
    println!("\n{}", title);
    let widths: Vec<usize> = (0..headers.len())
        .map(|c| {
            rows.iter()
                .map(|r| r.get(c).map_or(0, String::len))
                .chain(std::iter::once(headers[c].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    for row in std::iter::once(&headers).chain(rows.iter()) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>width$}", cell, width = w))
            .collect();
        println!("  {}", line.join("  "));
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "complaint_ml=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let print_config = cli.print_config;
    let config = cli.into_config().context("invalid configuration")?;

    if print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    if !config.data_path.is_file() {
        bail!("data file {} does not exist", config.data_path.display());
    }

    info!(data = %config.data_path.display(), models = config.models.len(), "Starting analysis");
    let report = run_analysis(&config).context("analysis failed")?;

    print_table("Cross-validation (mean over folds)", comparison_rows(&report.comparison.wide));
    print_table("Held-out test split", scorecard_rows(&report.scorecard));
    for (model, reason) in &report.failures {
        println!("\n{} failed: {}", model, reason);
    }

    let paths = ReportPaths::in_dir(&config.output_dir);
    println!("\nWrote {} and {}", paths.results.display(), paths.test_results.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_from(args: &[&str]) -> Result<AnalysisConfig, AnalysisError> {
        let argv = std::iter::once("complaint-ml").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_no_flags_gives_defaults() {
        assert_eq!(config_from(&[]).unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_flags_override_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"split_seed": 7, "cv_folds": 3, "row_limit": 500, "test_size": 0.3}"#).unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = config_from(&[
            "--config", &path,
            "--seed", "9",
            "--rows", "all",
            "--skip-rows", "10",
            "--metrics", "recall,f1_score",
            "--models", "dummy,bayes",
        ])
        .unwrap();
        assert_eq!(config.split_seed, 9);
        assert_eq!(config.row_limit, RowLimit::All);
        assert_eq!(config.skip_rows, 10);
        assert_eq!(config.metrics, vec![Metric::Recall, Metric::F1]);
        // untouched by flags
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.test_size, 0.3);

        let names: Vec<&str> = config.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["dummy", "bayes"]);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let err = config_from(&["--models", "dummy,knn"]).unwrap_err();
        match err {
            AnalysisError::Configuration(msg) => assert!(msg.contains("knn"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_row_arguments() {
        assert!(matches!(config_from(&["--rows=-5"]), Err(AnalysisError::Configuration(_))));
        assert!(matches!(config_from(&["--rows", "lots"]), Err(AnalysisError::Configuration(_))));
        assert!(matches!(config_from(&["--skip-rows", "x"]), Err(AnalysisError::Configuration(_))));
        assert_eq!(config_from(&["--rows", "250"]).unwrap().row_limit, RowLimit::Count(250));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        assert!(config_from(&["--test-size", "1.5"]).is_err());
        assert!(config_from(&["--cv-folds", "1"]).is_err());
        assert!(config_from(&["--metrics", "auc"]).is_err());
        assert!(Cli::try_parse_from(["complaint-ml", "--seed", "abc"]).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let err = config_from(&["--config", "no/such/config.json"]).unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound(_)));
    }
}
