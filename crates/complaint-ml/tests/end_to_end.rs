use complaint_ml::analysis::report::{scorecard_rows, write_reports};
use complaint_ml::analysis::{default_models, run_on_table, DatasetSchema};
use complaint_ml::data::{prepare_dataset, train_test_split, Table, Value};
use complaint_ml::metrics::{round3, Metric, DEFAULT_METRICS};
use complaint_ml::AnalysisConfig;

const ROWS: usize = 1000;

/// 70% undisputed, 30% disputed. Features lean towards the label without
/// determining it.
fn synthetic_complaints() -> Table {
    let products = ["Mortgage", "Credit card", "Student loan", "Debt collection"];
    let states = ["CA", "NY", "TX", "FL", "WA", "IL"];
    let responses = ["Closed with explanation", "Closed with monetary relief", "In progress"];
    let disputed_words = ["fraud", "refund", "unauthorized", "denied", "ignored"];
    let routine_words = ["payment", "statement", "account", "balance", "escrow"];

    let mut product = Vec::with_capacity(ROWS);
    let mut state = Vec::with_capacity(ROWS);
    let mut response = Vec::with_capacity(ROWS);
    let mut narrative = Vec::with_capacity(ROWS);
    let mut label = Vec::with_capacity(ROWS);
    for i in 0..ROWS {
        let disputed = i % 10 < 3;
        let hint = (i * 7) % 11 < 7;
        product.push(products[if disputed && hint { 1 } else { (i * 3) % 4 }]);
        state.push(states[(i * 5) % 6]);
        response.push(responses[if disputed && hint { 0 } else { (i / 3) % 3 }]);
        let words = if disputed == hint { &disputed_words } else { &routine_words };
        narrative.push(format!(
            "the {} on my {} was {}",
            words[i % 5],
            routine_words[(i / 5) % 5],
            words[(i / 7) % 5]
        ));
        label.push(if disputed { "Yes" } else { "No" });
    }

    let text = |values: Vec<String>| values.into_iter().map(Value::Text).collect::<Vec<_>>();
    let owned = |values: Vec<&str>| values.into_iter().map(String::from).collect::<Vec<_>>();
    Table::new(
        vec![
            "complaint_id".into(),
            "product".into(),
            "state".into(),
            "company_response_to_consumer".into(),
            "consumer_complaint_narrative".into(),
            "consumer_disputed".into(),
        ],
        vec![
            (0..ROWS).map(|i| Value::Number(i as f64)).collect(),
            text(owned(product)),
            text(owned(state)),
            text(owned(response)),
            text(narrative),
            text(owned(label)),
        ],
    )
    .unwrap()
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        schema: DatasetSchema {
            excluded: vec!["complaint_id".into()],
            categorical: vec![
                "product".into(),
                "state".into(),
                "company_response_to_consumer".into(),
            ],
            drop: vec![],
            max_features: 100,
            ..DatasetSchema::default()
        },
        models: default_models(),
        ..AnalysisConfig::default()
    }
}

#[test]
fn baseline_matches_test_majority() {
    let table = synthetic_complaints();
    let config = config();
    let report = run_on_table(&config, &table).unwrap();

    assert_eq!(report.class_balance, vec![("No".to_string(), 700), ("Yes".to_string(), 300)]);
    assert_eq!(report.train_rows, 800);
    assert_eq!(report.test_rows, 200);
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    // same split the runner made
    let data = prepare_dataset(&table, "consumer_disputed", "Yes", &["complaint_id"]).unwrap();
    let (_, test) = train_test_split(&data, config.test_size, config.split_seed).unwrap();
    let negatives = test.labels.data().iter().filter(|&&v| v == 0.0).count();
    let majority = round3(negatives as f64 / test.len() as f64);

    assert_eq!(report.scorecard.get("dummy", Metric::Recall), Some(0.0));
    assert_eq!(report.scorecard.get("dummy", Metric::Accuracy), Some(majority));
    assert_eq!(report.comparison.wide.get(Metric::Recall, "dummy"), Some(0.0));
}

#[test]
fn tables_have_expected_shape() {
    let report = run_on_table(&config(), &synthetic_complaints()).unwrap();
    let models = default_models().len();
    let metrics = DEFAULT_METRICS.len();

    assert_eq!(report.comparison.wide.models.len(), models);
    assert_eq!(report.comparison.wide.values.len(), metrics);
    assert!(report.comparison.wide.values.iter().all(|row| row.len() == models));
    assert_eq!(report.comparison.long.len(), models * metrics);

    for (name, record) in report.training.iter().map(|r| (&r.name, &r.metrics)) {
        assert_eq!(record.metrics(), DEFAULT_METRICS.to_vec(), "{}", name);
        assert!(record.iter().all(|&(_, v)| (0.0..=1.0).contains(&v)), "{}", name);
    }

    let (headers, rows) = scorecard_rows(&report.scorecard);
    assert_eq!(headers.len(), models + 1);
    assert_eq!(rows.len(), metrics);
    assert_eq!(rows[0][0], "test_accuracy");
}

#[test]
fn rerun_writes_identical_artifacts() {
    let table = synthetic_complaints();
    let config = config();
    let first = run_on_table(&config, &table).unwrap();
    let second = run_on_table(&config, &table).unwrap();
    assert_eq!(first.comparison, second.comparison);
    assert_eq!(first.scorecard, second.scorecard);

    let dir = tempfile::tempdir().unwrap();
    let a = write_reports(&first, &dir.path().join("a")).unwrap();
    let b = write_reports(&second, &dir.path().join("b")).unwrap();
    for (x, y) in [
        (&a.results, &b.results),
        (&a.model_performance, &b.model_performance),
        (&a.test_results, &b.test_results),
        (&a.class_imbalance, &b.class_imbalance),
        (&a.unique_counts, &b.unique_counts),
    ] {
        assert_eq!(std::fs::read(x).unwrap(), std::fs::read(y).unwrap(), "{}", x.display());
    }
}
