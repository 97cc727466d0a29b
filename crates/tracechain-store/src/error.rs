//! Error types for store operations.

use thiserror::Error;
use tracechain_core::BatchId;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error while preparing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Journal backend error.
    #[error("journal error: {0}")]
    Journal(#[from] tracechain_journal::JournalError),
    /// No record with this identifier.
    #[error("evidence record {0} not found")]
    NotFound(BatchId),
    /// A blocking write task failed to complete.
    #[error("store task failed: {0}")]
    Task(String),
    /// Other error.
    #[error("{0}")]
    Other(String),
}
