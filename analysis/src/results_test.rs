use crate::{
    duration::{DurationError, TimeUnit},
    results::{
        load_mode_frame, load_policy_frame, ExperimentWriter, LoadError, PolicyRecord,
        ResultFrame, Sample,
    },
};
use std::{fs, time::Duration};
use tempfile::tempdir;

fn sample(series: &str, facet: Option<&str>, x: f64, y: f64) -> Sample {
    Sample {
        series: series.to_owned(),
        facet: facet.map(str::to_owned),
        marker: None,
        x,
        y,
    }
}

#[test]
pub fn policy_frame_converts_durations() {
    let directory = tempdir().unwrap();
    let path = directory.path().join("duckdb-serial_10.csv");
    fs::write(
        &path,
        "Policy,TestCase,TransactionCount,Duration\n\
         duckdb-serial,Select Scan,2,1.5ms\n\
         duckdb-serial,Select Scan,3,800µs\n\
         duckdb-serial,Long Update,2,1m0.5s\n",
    )
    .unwrap();

    let frame = load_policy_frame(&path, TimeUnit::Milliseconds).unwrap();
    let samples = frame.iter().collect::<Vec<_>>();

    assert_eq!(frame.len(), 3);
    assert_eq!(samples[0].series, "duckdb-serial");
    assert_eq!(samples[0].facet.as_deref(), Some("Select Scan"));
    assert_eq!(samples[0].x, 2.0);
    assert!((samples[0].y - 1.5).abs() < 1e-9);
    assert!((samples[1].y - 0.8).abs() < 1e-9);
    assert!((samples[2].y - 60_500.0).abs() < 1e-6);
    assert_eq!(frame.facets(), vec!["Select Scan", "Long Update"]);
}

#[test]
pub fn bad_duration_names_file_and_record() {
    let directory = tempdir().unwrap();
    let path = directory.path().join("cold-neondb_5.csv");
    fs::write(
        &path,
        "Policy,TestCase,TransactionCount,Duration\n\
         cold-neondb,Select Scan,2,1.2s\n\
         cold-neondb,Select Scan,3,fast\n",
    )
    .unwrap();

    match load_policy_frame(&path, TimeUnit::Seconds) {
        Err(LoadError::Duration {
            path: error_path,
            record,
            source,
        }) => {
            assert_eq!(error_path, path);
            assert_eq!(record, 2);
            assert!(matches!(source, DurationError::InvalidNumber { .. }));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
pub fn malformed_rows_fail_to_load() {
    let directory = tempdir().unwrap();
    let path = directory.path().join("serial-snapshot_10.csv");
    fs::write(
        &path,
        "Policy,TestCase,TransactionCount,Duration\n\
         serial-snapshot,Select Scan,many,1s\n",
    )
    .unwrap();

    assert!(matches!(
        load_policy_frame(&path, TimeUnit::Seconds),
        Err(LoadError::Csv { .. })
    ));
    assert!(matches!(
        load_policy_frame(&directory.path().join("missing.csv"), TimeUnit::Seconds),
        Err(LoadError::Csv { .. })
    ));
}

#[test]
pub fn mode_frame_groups_by_execution_mode() {
    let directory = tempdir().unwrap();
    let path = directory.path().join("experiment_results-dbcount=1000.csv");
    fs::write(
        &path,
        "TransactionType,ExecutionMode,TransactionCount,ElapsedTime\n\
         short,serial,10,0.25\n\
         short,parallel,10,0.10\n\
         long,serial,25,1.50\n",
    )
    .unwrap();

    let frame = load_mode_frame(&path, TimeUnit::Milliseconds).unwrap();

    assert_eq!(frame.series(), vec!["serial", "parallel"]);
    assert_eq!(frame.markers(), vec!["short", "long"]);
    assert!(frame.facets().is_empty());
    assert!((frame.max_y().unwrap() - 1500.0).abs() < 1e-9);
}

#[test]
pub fn concat_keeps_order_and_bounds() {
    let first = ResultFrame::new(vec![
        sample("cold-neondb", Some("Select Scan"), 2.0, 1.0),
        sample("cold-neondb", Some("Long Update"), 4.0, 3.0),
    ]);
    let second = ResultFrame::new(vec![sample("prewarm-neondb", Some("Select Join"), 9.0, 0.5)]);

    let frame = ResultFrame::concat([first, second, ResultFrame::default()]);

    assert_eq!(frame.len(), 3);
    assert_eq!(frame.series(), vec!["cold-neondb", "prewarm-neondb"]);
    assert_eq!(
        frame.facets(),
        vec!["Select Scan", "Long Update", "Select Join"]
    );
    assert_eq!(frame.max_y(), Some(3.0));
    assert_eq!(frame.x_bounds(), Some((2.0, 9.0)));

    let empty = ResultFrame::default();
    assert!(empty.is_empty());
    assert_eq!(empty.max_y(), None);
    assert_eq!(empty.x_bounds(), None);
}

#[test]
pub fn writer_output_loads_back() {
    let directory = tempdir().unwrap();
    let mut writer = ExperimentWriter::create(directory.path(), "duckdb-parallel", 10).unwrap();

    writer
        .log_duration("Select Scan", 2, Duration::from_micros(1_500))
        .unwrap();
    writer
        .log(&PolicyRecord {
            policy: "duckdb-parallel".to_owned(),
            test_case: "Long Update".to_owned(),
            transaction_count: 3,
            duration: "2m30s".to_owned(),
        })
        .unwrap();

    let path = writer.path().to_path_buf();
    drop(writer);

    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("duckdb-parallel_10_"));
    assert!(file_name.ends_with(".csv"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("Policy,TestCase,TransactionCount,Duration\n"));
    assert!(content.contains("duckdb-parallel,Select Scan,2,1.5ms\n"));

    let frame = load_policy_frame(&path, TimeUnit::Seconds).unwrap();
    let durations = frame.iter().map(|sample| sample.y).collect::<Vec<_>>();

    assert_eq!(frame.len(), 2);
    assert!((durations[0] - 0.0015).abs() < 1e-12);
    assert!((durations[1] - 150.0).abs() < 1e-9);
}

#[test]
pub fn empty_experiment_has_header() {
    let directory = tempdir().unwrap();
    let writer = ExperimentWriter::create(directory.path(), "serial-snapshot", 2).unwrap();
    let path = writer.path().to_path_buf();
    drop(writer);

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Policy,TestCase,TransactionCount,Duration\n"
    );
    assert!(load_policy_frame(&path, TimeUnit::Seconds)
        .unwrap()
        .is_empty());
}
