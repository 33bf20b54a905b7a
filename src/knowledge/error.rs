//! Knowledge store error types.

use std::path::PathBuf;

/// Errors that can occur during knowledge store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Failed to open or create database.
    #[error("Failed to open knowledge store at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to execute SQL.
    #[error("Knowledge store query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Some inserts of a bulk append failed; the rest were committed.
    #[error("Stored {stored} of {} knowledge records ({failed} failed)", .stored + .failed)]
    PartialWrite { stored: usize, failed: usize },

    /// Refused to store a record without content.
    #[error("Knowledge content is empty")]
    EmptyContent,

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,

    /// Failed to create parent directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
