use std::path::PathBuf;

use covdb_core::CovdbError;

/// Errors surfaced by worker operations.
///
/// Per-record API failures never appear here; the refresh engine folds them
/// into a reset or delete outcome.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Domain(#[from] CovdbError),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
