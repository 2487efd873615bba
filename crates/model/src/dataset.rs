use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::Features;

/// One charge/discharge cycle of one battery run, with its RUL label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFeatureRow {
    pub cycle: u32,
    pub voltage_mean: f64,
    pub current_mean: f64,
    pub temperature_mean: f64,
    /// Longest elapsed time seen in the cycle. Absent for synthetic rows and
    /// logs without a time column.
    pub time_max: Option<f64>,
    pub rul: u32,
}

impl CycleFeatureRow {
    pub fn features(&self) -> Features {
        [
            self.voltage_mean,
            self.current_mean,
            self.temperature_mean,
            self.cycle as f64,
        ]
    }
}

/// Where a training set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Logs { files: usize, runs: usize },
    Synthetic { samples: usize },
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Logs { files, runs } => {
                write!(f, "{} runs from {} log files", runs, files)
            }
            DataSource::Synthetic { samples } => write!(f, "{} synthetic samples", samples),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub rows: Vec<CycleFeatureRow>,
    pub source: DataSource,
}

impl TrainingSet {
    pub fn new(rows: Vec<CycleFeatureRow>, source: DataSource) -> Self {
        Self { rows, source }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Shuffle with `seed` and split into `(train, test)`. The test side gets
    /// `ceil(len * test_ratio)` rows.
    pub fn split(&self, test_ratio: f64, seed: u64) -> (Vec<CycleFeatureRow>, Vec<CycleFeatureRow>) {
        let n = self.rows.len();
        let n_test = ((n as f64) * test_ratio).ceil().min(n as f64) as usize;

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let (test_idx, train_idx) = order.split_at(n_test);
        let pick = |idx: &[usize]| -> Vec<CycleFeatureRow> {
            idx.iter().map(|&i| self.rows[i].clone()).collect()
        };
        (pick(train_idx), pick(test_idx))
    }
}
