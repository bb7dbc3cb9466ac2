use crate::duration::{format_duration, parse_duration, DurationError, TimeUnit};
use chrono::Local;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info};

/// header written by the benchmark harness for every policy experiment
pub const POLICY_HEADER: [&str; 4] = ["Policy", "TestCase", "TransactionCount", "Duration"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read results from {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to convert duration of record {record} in {path:?}")]
    Duration {
        path: PathBuf,
        record: usize,
        #[source]
        source: DurationError,
    },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write results")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush results")]
    Io(#[from] std::io::Error),
}

/// A single row of a policy experiment
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyRecord {
    pub policy: String,
    pub test_case: String,
    pub transaction_count: u64,
    pub duration: String,
}

/// A single row of the older serial/ parallel execution experiments, elapsed time in seconds
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ModeRecord {
    pub transaction_type: String,
    pub execution_mode: String,
    pub transaction_count: u64,
    pub elapsed_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// colour group, e.g., the policy
    pub series: String,
    /// panel of a facet grid, e.g., the test case
    pub facet: Option<String>,
    /// marker shape group
    pub marker: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Ordered set of samples making up one figure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFrame {
    samples: Vec<Sample>,
}

impl ResultFrame {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// join multiple frames, keeping the order of frames and their rows
    pub fn concat<I: IntoIterator<Item = ResultFrame>>(frames: I) -> Self {
        Self {
            samples: frames
                .into_iter()
                .flat_map(|frame| frame.samples)
                .collect_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn max_y(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|sample| sample.y)
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        match self
            .samples
            .iter()
            .map(|sample| sample.x)
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(x) => Some((x, x)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// facet values in order of first appearance
    pub fn facets(&self) -> Vec<&str> {
        self.samples
            .iter()
            .filter_map(|sample| sample.facet.as_deref())
            .unique()
            .collect_vec()
    }

    /// series names in order of first appearance
    pub fn series(&self) -> Vec<&str> {
        self.samples
            .iter()
            .map(|sample| sample.series.as_str())
            .unique()
            .collect_vec()
    }

    /// marker groups in order of first appearance
    pub fn markers(&self) -> Vec<&str> {
        self.samples
            .iter()
            .filter_map(|sample| sample.marker.as_deref())
            .unique()
            .collect_vec()
    }
}

impl FromIterator<Sample> for ResultFrame {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn reader(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a policy experiment, durations are converted to `unit`
pub fn load_policy_frame(path: &Path, unit: TimeUnit) -> Result<ResultFrame, LoadError> {
    let mut samples = Vec::new();

    for (index, result) in reader(path)?.deserialize::<PolicyRecord>().enumerate() {
        let record = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let y = parse_duration(&record.duration, unit).map_err(|source| LoadError::Duration {
            path: path.to_path_buf(),
            record: index + 1,
            source,
        })?;

        samples.push(Sample {
            series: record.policy,
            facet: Some(record.test_case),
            marker: None,
            x: record.transaction_count as f64,
            y,
        });
    }

    debug!(path = ?path, samples = samples.len(), "Loaded policy results");

    Ok(ResultFrame::new(samples))
}

/// Load a serial/ parallel execution experiment, elapsed times are converted to `unit`
pub fn load_mode_frame(path: &Path, unit: TimeUnit) -> Result<ResultFrame, LoadError> {
    let samples = reader(path)?
        .deserialize::<ModeRecord>()
        .map(|result| {
            result
                .map(|record| Sample {
                    series: record.execution_mode,
                    facet: None,
                    marker: Some(record.transaction_type),
                    x: record.transaction_count as f64,
                    y: unit.from_seconds(record.elapsed_time),
                })
                .map_err(|source| LoadError::Csv {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(path = ?path, samples = samples.len(), "Loaded execution mode results");

    Ok(ResultFrame::new(samples))
}

/// Writes the results of one policy experiment, one file per run
pub struct ExperimentWriter {
    policy: String,
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ExperimentWriter {
    /// create `<policy>_<max_in_flight>_<timestamp>.csv` in `directory` and write the header
    pub fn create(
        directory: &Path,
        policy: &str,
        max_in_flight: usize,
    ) -> Result<Self, WriteError> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = directory.join(format!("{policy}_{max_in_flight}_{timestamp}.csv"));

        // header is written by hand so that an experiment without rows is still readable
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&path)?;
        writer.write_record(POLICY_HEADER)?;
        writer.flush()?;

        info!(path = ?path, "Writing results");

        Ok(Self {
            policy: policy.to_owned(),
            path,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&mut self, record: &PolicyRecord) -> Result<(), WriteError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;

        Ok(())
    }

    /// log a measurement of this writer's policy
    pub fn log_duration(
        &mut self,
        test_case: &str,
        transaction_count: u64,
        duration: Duration,
    ) -> Result<(), WriteError> {
        let record = PolicyRecord {
            policy: self.policy.clone(),
            test_case: test_case.to_owned(),
            transaction_count,
            duration: format_duration(duration),
        };

        info!(
            policy = %record.policy,
            test_case = %record.test_case,
            transaction_count = record.transaction_count,
            duration = %record.duration,
            "Recorded measurement"
        );

        self.log(&record)
    }
}
