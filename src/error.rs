use std::path::PathBuf;

/// Error taxonomy for the reapportionment pipeline.
///
/// Malformed inputs surface immediately to the caller that tried to build the
/// index or load the record table. Anything that goes wrong inside a worker
/// escalates to a batch-level `ChunkFailure` rather than being swallowed, so a
/// partially-reapportioned table can never ship.
#[derive(Debug, thiserror::Error)]
pub enum ReapportionError {
    #[error("malformed crosswalk {path:?}: {reason}")]
    MalformedCrosswalk { path: PathBuf, reason: String },

    #[error("malformed record table {path:?}: {reason}")]
    MalformedRecords { path: PathBuf, reason: String },

    #[error("chunk processing failed: {0}")]
    ChunkFailure(String),

    #[error("invalid config {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReapportionError {
    pub fn malformed_crosswalk(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedCrosswalk {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_records(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedRecords {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReapportionError>;
