use crate::collector::{csv_matcher, csv_pattern, latest_csv};
use std::{
    fs::{self, File},
    path::Path,
    time::{Duration, SystemTime},
};
use tempfile::tempdir;

fn touch(directory: &Path, name: &str, age: u64) {
    let path = directory.join(name);
    fs::write(&path, "Policy,TestCase,TransactionCount,Duration\n").unwrap();

    let modified = SystemTime::now() - Duration::from_secs(age);
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[test]
pub fn picks_newest_matching_file() {
    let directory = tempdir().unwrap();
    touch(directory.path(), "duckdb-serial_10_2024-01-01_10-00-00.csv", 300);
    touch(directory.path(), "duckdb-serial_10_2024-01-02_10-00-00.csv", 10);
    touch(directory.path(), "duckdb-serial_50_2023-12-31_10-00-00.csv", 100);
    // newer, but not a match for the policy
    touch(directory.path(), "duckdb-parallel_10_2024-01-03_10-00-00.csv", 1);

    let latest = latest_csv("duckdb-serial", directory.path()).unwrap();

    assert_eq!(
        latest,
        Some(
            directory
                .path()
                .join("duckdb-serial_10_2024-01-02_10-00-00.csv")
        )
    );
}

#[test]
pub fn equal_times_prefer_greater_path() {
    let directory = tempdir().unwrap();
    touch(directory.path(), "cold-neondb_a.csv", 60);
    touch(directory.path(), "cold-neondb_b.csv", 60);

    let first = directory.path().join("cold-neondb_a.csv");
    let second = directory.path().join("cold-neondb_b.csv");
    let modified = fs::metadata(&first).unwrap().modified().unwrap();
    File::options()
        .write(true)
        .open(&second)
        .unwrap()
        .set_modified(modified)
        .unwrap();

    assert_eq!(
        latest_csv("cold-neondb", directory.path()).unwrap(),
        Some(second)
    );
}

#[test]
pub fn ignores_other_extensions_and_subdirectories() {
    let directory = tempdir().unwrap();
    touch(directory.path(), "serial-snapshot_10.txt", 1);
    touch(directory.path(), ".serial-snapshot_hidden.csv", 1);
    fs::create_dir(directory.path().join("serial-snapshot_old.csv")).unwrap();
    fs::create_dir(directory.path().join("nested")).unwrap();
    touch(&directory.path().join("nested"), "serial-snapshot_10.csv", 1);

    assert_eq!(latest_csv("serial-snapshot", directory.path()).unwrap(), None);
}

#[test]
pub fn missing_directory_is_empty() {
    let directory = tempdir().unwrap();
    let missing = directory.path().join("results");

    assert_eq!(latest_csv("cold-neondb", &missing).unwrap(), None);
}

#[test]
pub fn prefix_is_taken_literally() {
    assert_eq!(csv_pattern("duckdb-serial"), "duckdb-serial*.csv");

    let matcher = csv_matcher("exp[1]").unwrap();
    assert!(matcher.is_match("exp[1]_2024.csv"));
    assert!(!matcher.is_match("exp1_2024.csv"));
}
