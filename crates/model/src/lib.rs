//! Training and inference core for battery remaining-useful-life estimation.
//!
//! The pipeline runs in three stages:
//!
//! - [`FeatureAggregator`] reads raw per-timestamp CSV logs and collapses each
//!   file (one battery run) into one row per charge/discharge cycle, falling
//!   back to [`synthetic`] data when nothing usable is found.
//! - [`label_run`] derives the RUL label of each row from the run's final cycle.
//! - [`RulModel`] fits a [`RandomForest`] on the rows, reports held-out
//!   metrics, and round-trips through a binary artifact file.
//!
//! # Example
//!
//! ```no_run
//! use cellwise_model::{FeatureAggregator, IngestOptions, RulModel, TrainOptions};
//!
//! let set = FeatureAggregator::new(IngestOptions::default()).load_or_synthesize("dataset/data");
//! let model = RulModel::train(&set, &TrainOptions::default())?;
//! model.persist("models/battery_model.bin")?;
//!
//! let loaded = RulModel::load("models/battery_model.bin")?;
//! let rul = loaded.predict(&[3.7, -2.0, 25.0, 900.0]);
//! # Ok::<(), cellwise_model::ModelError>(())
//! ```

mod artifact;
mod dataset;
mod error;
mod forest;
mod ingest;
mod labels;
mod metrics;
pub mod synthetic;

pub use artifact::{ModelMetadata, RulModel, TrainOptions, FORMAT_VERSION};
pub use dataset::{CycleFeatureRow, DataSource, TrainingSet};
pub use error::{IngestionError, ModelError, NoDataAvailable};
pub use forest::{ForestParams, RandomForest};
pub use ingest::{FeatureAggregator, IngestOptions};
pub use labels::{label_run, CycleAggregate};
pub use metrics::{r2_score, rmse, Evaluation};

pub use cellwise_protocol::FEATURE_COUNT;

/// One model input row: voltage, current, temperature, cycle.
pub type Features = [f64; FEATURE_COUNT];
