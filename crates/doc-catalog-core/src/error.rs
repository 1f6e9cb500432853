use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Destination store already exists: {}", .0.display())]
    StoreConflict(PathBuf),

    #[error("Cancelled")]
    Cancelled,
}

/// Why a single file was passed over during the walk or hashing.
///
/// Skips are non-fatal: they are logged, counted, and reported in aggregate
/// at the end of a run. They never abort the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PermissionDenied,
    NotFound,
    Other(io::ErrorKind),
}

impl From<&io::Error> for SkipReason {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => SkipReason::PermissionDenied,
            io::ErrorKind::NotFound => SkipReason::NotFound,
            kind => SkipReason::Other(kind),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PermissionDenied => write!(f, "permission denied"),
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::Other(kind) => write!(f, "{}", kind),
        }
    }
}
