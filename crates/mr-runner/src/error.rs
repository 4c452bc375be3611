//! Error types for mr-runner

use mr_core::CoreError;
use mr_db::DbError;
use thiserror::Error;

/// Errors that abort a migration run
#[derive(Error, Debug)]
pub enum RunError {
    /// Checkpoint store could not be read (R001)
    #[error("[R001] Cannot read checkpoint for group '{group}': {source}")]
    CheckpointRead {
        group: String,
        #[source]
        source: CoreError,
    },

    /// Pending scripts could not be determined (R002)
    #[error("[R002] Cannot select scripts for group '{group}': {source}")]
    Selection {
        group: String,
        #[source]
        source: CoreError,
    },

    /// The connection failed while a script was running (R003)
    #[error("[R003] Database connection lost while running '{file}' in group '{group}': {source}")]
    Connection {
        group: String,
        file: String,
        #[source]
        source: DbError,
    },
}

/// Result type alias for RunError
pub type RunResult<T> = Result<T, RunError>;
