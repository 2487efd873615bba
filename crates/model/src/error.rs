use std::path::PathBuf;

/// A raw log file that could not be turned into cycle rows. Recovered by
/// skipping the file.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}:{line}: invalid value '{value}' in column '{column}'", .path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("{}: no data rows", .path.display())]
    Empty { path: PathBuf },
}

/// Why ingestion produced nothing. Recovered by the synthetic fallback and
/// never returned from [`crate::FeatureAggregator::load_or_synthesize`].
#[derive(Debug, thiserror::Error)]
pub enum NoDataAvailable {
    #[error("raw data directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("raw data directory {} is unreadable: {}", .0.display(), .1)]
    Unreadable(PathBuf, #[source] std::io::Error),

    #[error("no CSV files found in {}", .0.display())]
    NoFiles(PathBuf),

    #[error("none of the {0} CSV files produced usable rows")]
    NoUsableRows(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("No trained model found at {}. Run `cellwise train` first.", .path.display())]
    NotFound { path: PathBuf },

    #[error("Not enough data to train: {rows} rows leaves an empty train or test split")]
    InsufficientData { rows: usize },

    #[error("Invalid training options: {0}")]
    InvalidOptions(String),

    #[error("Model file {} has format version {found}, expected {expected}. Retrain the model.", .path.display())]
    IncompatibleFormat {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Model file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to encode model: {0}")]
    Encode(#[source] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
