//! Raw log ingestion.
//!
//! Each CSV file holds one battery run sampled per timestamp. Rows are grouped
//! by cycle and reduced to means (voltage, current, temperature) and a max
//! (elapsed time). Blank cells are ignored; files with non-numeric cells are
//! logged and skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dataset::{DataSource, TrainingSet};
use crate::error::{IngestionError, NoDataAvailable};
use crate::labels::{label_run, CycleAggregate};
use crate::synthetic;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Upper bound on files read per ingestion, in sorted path order.
    pub max_files: usize,
    pub synthetic_samples: usize,
    pub synthetic_seed: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_files: 50,
            synthetic_samples: synthetic::DEFAULT_SAMPLES,
            synthetic_seed: synthetic::DEFAULT_SEED,
        }
    }
}

const CYCLE_NAMES: &[&str] = &["cycle"];
const VOLTAGE_NAMES: &[&str] = &["voltage_measured", "voltage"];
const CURRENT_NAMES: &[&str] = &["current_measured", "current"];
const TEMPERATURE_NAMES: &[&str] = &["temperature_measured", "temperature"];
const TIME_NAMES: &[&str] = &["time"];

/// Header positions of the columns we read.
#[derive(Debug, Clone, Copy)]
struct Columns {
    cycle: usize,
    voltage: usize,
    current: usize,
    temperature: usize,
    time: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, IngestionError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str], column: &'static str| {
            find(names).ok_or_else(|| IngestionError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
        };

        Ok(Self {
            cycle: require(CYCLE_NAMES, "cycle")?,
            voltage: require(VOLTAGE_NAMES, "voltage")?,
            current: require(CURRENT_NAMES, "current")?,
            temperature: require(TEMPERATURE_NAMES, "temperature")?,
            time: find(TIME_NAMES),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Blank cells are left out of their column only.
#[derive(Debug, Default)]
struct Accumulator {
    voltage: Mean,
    current: Mean,
    temperature: Mean,
    time_max: Option<f64>,
}

impl Accumulator {
    fn push(
        &mut self,
        voltage: Option<f64>,
        current: Option<f64>,
        temperature: Option<f64>,
        time: Option<f64>,
    ) {
        self.voltage.push(voltage);
        self.current.push(current);
        self.temperature.push(temperature);
        if let Some(t) = time {
            self.time_max = Some(self.time_max.map_or(t, |m| m.max(t)));
        }
    }

    /// `None` when a feature column was blank for the whole cycle.
    fn finish(self, cycle: u32) -> Option<CycleAggregate> {
        Some(CycleAggregate {
            cycle,
            voltage_mean: self.voltage.value()?,
            current_mean: self.current.value()?,
            temperature_mean: self.temperature.value()?,
            time_max: self.time_max,
        })
    }
}

/// Cell parser bound to one file, for error reporting.
struct RecordParser<'a> {
    path: &'a Path,
    record: &'a StringRecord,
}

impl RecordParser<'_> {
    fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn invalid(&self, column: &'static str, value: &str) -> IngestionError {
        IngestionError::InvalidValue {
            path: self.path.to_path_buf(),
            line: self.line(),
            column,
            value: value.to_string(),
        }
    }

    /// A blank cell is `None`; anything else must be a finite number.
    fn number(&self, idx: usize, column: &'static str) -> Result<Option<f64>, IngestionError> {
        let raw = self.record.get(idx).unwrap_or("");
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.invalid(column, raw)),
        }
    }

    fn cycle(&self, idx: usize) -> Result<Option<u32>, IngestionError> {
        let Some(value) = self.number(idx, "cycle")? else {
            return Ok(None);
        };
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            let raw = self.record.get(idx).unwrap_or("");
            return Err(self.invalid("cycle", raw));
        }
        Ok(Some(value as u32))
    }
}

pub struct FeatureAggregator {
    options: IngestOptions,
}

impl FeatureAggregator {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Collapse one log file into per-cycle aggregates, ordered by cycle.
    pub fn aggregate_file(&self, path: &Path) -> Result<Vec<CycleAggregate>, IngestionError> {
        let read_err = |source: csv::Error| IngestionError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader.headers().map_err(read_err)?.clone();
        let columns = Columns::resolve(&headers, path)?;

        let mut groups: BTreeMap<u32, Accumulator> = BTreeMap::new();
        let mut record = StringRecord::new();

        while reader.read_record(&mut record).map_err(read_err)? {
            let parser = RecordParser {
                path,
                record: &record,
            };
            let Some(cycle) = parser.cycle(columns.cycle)? else {
                continue;
            };
            let voltage = parser.number(columns.voltage, "voltage")?;
            let current = parser.number(columns.current, "current")?;
            let temperature = parser.number(columns.temperature, "temperature")?;
            let time = match columns.time {
                Some(idx) => parser.number(idx, "time")?,
                None => None,
            };

            groups
                .entry(cycle)
                .or_default()
                .push(voltage, current, temperature, time);
        }

        let run: Vec<CycleAggregate> = groups
            .into_iter()
            .filter_map(|(cycle, acc)| {
                let aggregate = acc.finish(cycle);
                if aggregate.is_none() {
                    debug!(
                        file = %path.display(),
                        cycle,
                        "Dropping cycle with a blank feature column"
                    );
                }
                aggregate
            })
            .collect();

        if run.is_empty() {
            return Err(IngestionError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(run)
    }

    /// CSV files in `dir`, sorted, capped at `max_files`.
    fn csv_files(&self, dir: &Path) -> Result<Vec<PathBuf>, NoDataAvailable> {
        if !dir.is_dir() {
            return Err(NoDataAvailable::MissingDirectory(dir.to_path_buf()));
        }

        let entries =
            fs::read_dir(dir).map_err(|e| NoDataAvailable::Unreadable(dir.to_path_buf(), e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(NoDataAvailable::NoFiles(dir.to_path_buf()));
        }
        if files.len() > self.options.max_files {
            debug!(
                found = files.len(),
                limit = self.options.max_files,
                "Limiting raw log files"
            );
            files.truncate(self.options.max_files);
        }
        Ok(files)
    }

    /// Ingest every usable run in `dir`. Each run is labelled on its own
    /// before the rows are concatenated.
    pub fn aggregate_dir(&self, dir: &Path) -> Result<TrainingSet, NoDataAvailable> {
        let files = self.csv_files(dir)?;

        let mut rows = Vec::new();
        let mut runs = 0;

        for path in &files {
            match self.aggregate_file(path) {
                Ok(run) => {
                    debug!(file = %path.display(), cycles = run.len(), "Aggregated run");
                    rows.extend(label_run(run));
                    runs += 1;
                }
                Err(e) => warn!("Skipping log file: {}", e),
            }
        }

        if rows.is_empty() {
            return Err(NoDataAvailable::NoUsableRows(files.len()));
        }

        info!(files = files.len(), runs, rows = rows.len(), "Ingested raw logs");
        Ok(TrainingSet::new(
            rows,
            DataSource::Logs {
                files: files.len(),
                runs,
            },
        ))
    }

    /// Ingest `dir`, or generate synthetic rows when it yields nothing.
    pub fn load_or_synthesize(&self, dir: impl AsRef<Path>) -> TrainingSet {
        match self.aggregate_dir(dir.as_ref()) {
            Ok(set) => set,
            Err(reason) => {
                warn!(
                    "No usable raw data ({}); generating {} synthetic samples",
                    reason, self.options.synthetic_samples
                );
                self.synthesize()
            }
        }
    }

    pub fn synthesize(&self) -> TrainingSet {
        let rows = synthetic::generate(self.options.synthetic_samples, self.options.synthetic_seed);
        TrainingSet::new(
            rows,
            DataSource::Synthetic {
                samples: self.options.synthetic_samples,
            },
        )
    }
}
