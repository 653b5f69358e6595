//! Queue error types
//!
//! Defines the errors that can occur while accepting snapshots and paging views.

use thiserror::Error;

/// Errors that can occur in the queue layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    /// Payload was valid JSON but not a list of records
    #[error("Snapshot is not a list (got {0})")]
    NotAList(&'static str),

    /// An element of the snapshot is not a valid patient record
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Payload could not be parsed as JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Requested page lies outside `[1, total_pages]`
    #[error("Page {requested} is out of range (1..={total_pages})")]
    PageOutOfRange { requested: u32, total_pages: u32 },
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::InvalidJson(err.to_string())
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
