//! Error types for datebook operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatebookError {
    /// The persisted slot could not be read. Read paths recover from this
    /// locally; it only surfaces from the raw storage API.
    #[error("Storage read error: {0}")]
    StorageRead(String),

    /// The storage medium rejected a write (capacity, permissions, ...).
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatebookError>;
