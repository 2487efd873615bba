use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use cellwise_model::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// One run in the NASA cleaned layout: several samples per cycle, voltage
/// sagging and temperature rising as the cell ages.
fn write_run(dir: &Path, name: &str, cycles: u32) {
    let mut csv = String::from(
        "Voltage_measured,Current_measured,Temperature_measured,Current_charge,Voltage_charge,Time,cycle\n",
    );
    for cycle in 1..=cycles {
        for step in 0..4 {
            let c = cycle as f64;
            let s = step as f64;
            writeln!(
                csv,
                "{:.4},{:.4},{:.3},-2.0,3.0,{:.1},{}",
                4.2 - c * 0.002 - s * 0.05,
                -2.0 + s * 0.01,
                24.0 + c * 0.05 + s * 0.2,
                s * 600.0,
                cycle
            )
            .unwrap();
        }
    }
    fs::write(dir.join(name), csv).unwrap();
}

fn quick_options() -> TrainOptions {
    TrainOptions {
        n_estimators: 12,
        ..TrainOptions::default()
    }
}

#[test]
fn logs_to_persisted_model() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "B0005.csv", 60);
    write_run(data.path(), "B0006.csv", 40);
    fs::write(data.path().join("B0007.csv"), "garbage without header shape\n").unwrap();

    let aggregator = FeatureAggregator::new(IngestOptions::default());
    let set = aggregator.load_or_synthesize(data.path());

    assert_eq!(set.len(), 100);
    assert_eq!(set.source, DataSource::Logs { files: 3, runs: 2 });

    let first = &set.rows[0];
    assert_eq!(first.cycle, 1);
    assert_eq!(first.rul, 59);
    assert_eq!(first.time_max, Some(1800.0));

    let model = RulModel::train(&set, &quick_options()).unwrap();
    assert_eq!(model.metadata().test_rows, 20);
    assert!(model.metadata().evaluation.rmse.is_finite());

    let artifact = TempDir::new().unwrap();
    let path = artifact.path().join("battery_model.bin");
    model.persist(&path).unwrap();
    let loaded = RulModel::load(&path).unwrap();

    for sample in [
        [4.1, -2.0, 25.0, 10.0],
        [3.9, -1.98, 27.5, 45.0],
        [3.7, -2.0, 25.0, 900.0],
    ] {
        assert_eq!(loaded.predict(&sample), model.predict(&sample));
    }
}

#[test]
fn rul_labels_count_down_within_each_run() {
    let data = TempDir::new().unwrap();
    write_run(data.path(), "a.csv", 25);
    write_run(data.path(), "b.csv", 10);

    let set = FeatureAggregator::new(IngestOptions::default())
        .aggregate_dir(data.path())
        .unwrap();

    let (run_a, run_b) = set.rows.split_at(25);
    for run in [run_a, run_b] {
        for pair in run.windows(2) {
            assert!(pair[0].cycle < pair[1].cycle);
            assert!(pair[0].rul >= pair[1].rul);
        }
        assert_eq!(run.last().unwrap().rul, 0);
    }
    assert_eq!(run_b[0].rul, 9);
}

#[test]
fn empty_directory_trains_on_synthetic_data() {
    let data = TempDir::new().unwrap();
    let set = FeatureAggregator::new(IngestOptions::default()).load_or_synthesize(data.path());

    assert_eq!(set.len(), 1000);
    assert!(set.rows.iter().all(|r| r.rul <= 1500));

    let model = RulModel::train(&set, &quick_options()).unwrap();
    assert_eq!(model.metadata().train_rows, 800);
    assert_eq!(model.metadata().test_rows, 200);

    let young = model.predict(&[4.15, -2.0, 25.0, 100.0]);
    let old = model.predict(&[3.75, -2.0, 33.0, 900.0]);
    assert!(young > old, "expected {young} > {old}");
}

#[test]
fn missing_model_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    match RulModel::load(dir.path().join("battery_model.bin")) {
        Err(ModelError::NotFound { path }) => assert!(path.ends_with("battery_model.bin")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
