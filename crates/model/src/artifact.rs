//! The trained RUL model and its on-disk artifact.
//!
//! Artifact layout: 4 magic bytes, bincode `u32` format version, bincode
//! encoded [`RulModel`]. The model is immutable once trained or loaded.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use cellwise_protocol::SensorReading;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{CycleFeatureRow, DataSource, TrainingSet};
use crate::error::ModelError;
use crate::forest::{ForestParams, RandomForest};
use crate::metrics::{r2_score, rmse, Evaluation};
use crate::Features;

/// Bump when the encoded layout of [`RulModel`] changes.
pub const FORMAT_VERSION: u32 = 1;

const MAGIC: [u8; 4] = *b"CWRL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub n_estimators: usize,
    pub seed: u64,
    pub test_ratio: f64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        let forest = ForestParams::default();
        Self {
            n_estimators: forest.n_estimators,
            seed: forest.seed,
            test_ratio: 0.2,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
        }
    }
}

impl TrainOptions {
    fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidOptions(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(ModelError::InvalidOptions(format!(
                "test_ratio must be between 0 and 1, got {}",
                self.test_ratio
            )));
        }
        if self.max_depth == Some(0) {
            return Err(ModelError::InvalidOptions(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Unix timestamp (seconds) of training.
    pub trained_at: i64,
    pub source: DataSource,
    pub train_rows: usize,
    pub test_rows: usize,
    pub params: ForestParams,
    /// Held-out metrics from training. Not a deployment gate.
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulModel {
    forest: RandomForest,
    metadata: ModelMetadata,
}

impl RulModel {
    /// Split, fit and evaluate. Any successfully fitted model is returned
    /// regardless of its score.
    pub fn train(set: &TrainingSet, options: &TrainOptions) -> Result<Self, ModelError> {
        options.validate()?;

        let (train, test) = set.split(options.test_ratio, options.seed);
        if train.is_empty() || test.is_empty() {
            return Err(ModelError::InsufficientData { rows: set.len() });
        }

        info!(
            train_rows = train.len(),
            test_rows = test.len(),
            estimators = options.n_estimators,
            source = %set.source,
            "Training random forest"
        );

        let x: Vec<Features> = train.iter().map(CycleFeatureRow::features).collect();
        let y: Vec<f64> = train.iter().map(|r| r.rul as f64).collect();
        let forest = RandomForest::fit(&x, &y, options.forest_params());

        let evaluation = evaluate_forest(&forest, &test);

        let model = Self {
            forest,
            metadata: ModelMetadata {
                trained_at: Utc::now().timestamp(),
                source: set.source,
                train_rows: train.len(),
                test_rows: test.len(),
                params: options.forest_params(),
                evaluation,
            },
        };

        info!(
            r2 = model.metadata.evaluation.r2,
            rmse = model.metadata.evaluation.rmse,
            "Model trained"
        );
        Ok(model)
    }

    pub fn evaluate(&self, rows: &[CycleFeatureRow]) -> Evaluation {
        evaluate_forest(&self.forest, rows)
    }

    /// Raw RUL estimate for `[voltage, current, temperature, cycle]`.
    pub fn predict(&self, features: &Features) -> f64 {
        self.forest.predict(features)
    }

    pub fn predict_reading(&self, reading: &SensorReading) -> f64 {
        self.predict(&reading.features())
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&MAGIC)?;
        bincode::serialize_into(&mut writer, &FORMAT_VERSION).map_err(ModelError::Encode)?;
        bincode::serialize_into(&mut writer, self).map_err(ModelError::Encode)?;
        writer.flush()?;

        debug!(path = %path.display(), "Model persisted");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ModelError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ModelError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let corrupt = |reason: String| ModelError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| corrupt(format!("unreadable header: {}", e)))?;
        if magic != MAGIC {
            return Err(corrupt("not a cellwise model file".to_string()));
        }

        let version: u32 = bincode::deserialize_from(&mut reader)
            .map_err(|e| corrupt(format!("unreadable format version: {}", e)))?;
        if version != FORMAT_VERSION {
            return Err(ModelError::IncompatibleFormat {
                path: path.to_path_buf(),
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let model: Self = bincode::deserialize_from(&mut reader).map_err(|e| corrupt(e.to_string()))?;
        debug!(path = %path.display(), trees = model.forest.n_trees(), "Model loaded");
        Ok(model)
    }
}

fn evaluate_forest(forest: &RandomForest, rows: &[CycleFeatureRow]) -> Evaluation {
    let actual: Vec<f64> = rows.iter().map(|r| r.rul as f64).collect();
    let predicted: Vec<f64> = rows.iter().map(|r| forest.predict(&r.features())).collect();
    Evaluation {
        r2: r2_score(&actual, &predicted),
        rmse: rmse(&actual, &predicted),
        samples: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;
    use tempfile::TempDir;

    fn small_set() -> TrainingSet {
        TrainingSet::new(
            synthetic::generate(120, 7),
            DataSource::Synthetic { samples: 120 },
        )
    }

    fn quick_options() -> TrainOptions {
        TrainOptions {
            n_estimators: 8,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn test_train_records_metadata() {
        let model = RulModel::train(&small_set(), &quick_options()).unwrap();
        let meta = model.metadata();

        assert_eq!(meta.train_rows, 96);
        assert_eq!(meta.test_rows, 24);
        assert_eq!(meta.evaluation.samples, 24);
        assert_eq!(meta.params.n_estimators, 8);
        assert_eq!(meta.source, DataSource::Synthetic { samples: 120 });
        assert!(meta.evaluation.r2 > 0.9, "r2 was {}", meta.evaluation.r2);
    }

    #[test]
    fn test_insufficient_data() {
        let set = TrainingSet::new(
            synthetic::generate(1, 7),
            DataSource::Synthetic { samples: 1 },
        );
        assert!(matches!(
            RulModel::train(&set, &quick_options()),
            Err(ModelError::InsufficientData { rows: 1 })
        ));
    }

    #[test]
    fn test_invalid_options() {
        let zero_trees = TrainOptions {
            n_estimators: 0,
            ..TrainOptions::default()
        };
        assert!(matches!(
            RulModel::train(&small_set(), &zero_trees),
            Err(ModelError::InvalidOptions(_))
        ));

        let bad_ratio = TrainOptions {
            test_ratio: 1.0,
            ..quick_options()
        };
        assert!(matches!(
            RulModel::train(&small_set(), &bad_ratio),
            Err(ModelError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_persist_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("battery_model.bin");
        let model = RulModel::train(&small_set(), &quick_options()).unwrap();

        model.persist(&path).unwrap();
        let loaded = RulModel::load(&path).unwrap();

        assert_eq!(loaded, model);
        let sample = [3.7, -2.0, 25.0, 900.0];
        assert_eq!(loaded.predict(&sample), model.predict(&sample));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = RulModel::load(dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
        assert!(err.to_string().contains("cellwise train"));
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not a model").unwrap();

        assert!(matches!(
            RulModel::load(&path),
            Err(ModelError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_other_format_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(&(FORMAT_VERSION + 1)).unwrap());
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            RulModel::load(&path),
            Err(ModelError::IncompatibleFormat { found, .. }) if found == FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn test_load_truncated_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(&FORMAT_VERSION).unwrap());
        bytes.extend([1, 2, 3]);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            RulModel::load(&path),
            Err(ModelError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let a = RulModel::train(&small_set(), &quick_options()).unwrap();
        let b = RulModel::train(&small_set(), &quick_options()).unwrap();
        let sample = [3.9, -2.0, 27.0, 300.0];
        assert_eq!(a.predict(&sample), b.predict(&sample));
        assert_eq!(a.predict(&sample), a.predict(&sample));
    }
}
