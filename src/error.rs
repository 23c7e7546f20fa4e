// =============================================================================
// Core error type
// =============================================================================
//
// Only operations that depend on an external resource can fail outright.
// Malformed rows, short series and degenerate numerics never surface here;
// they degrade to skipped items or uncalculated fields.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("instrument feed unavailable at {path}: {source}")]
    FeedUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported candle interval: {0}")]
    UnsupportedInterval(String),

    #[error("failed to export instrument snapshot to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
