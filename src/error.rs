//! Error types for device sync sessions

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Copying the database between the device and scratch storage failed
    #[error("{0}")]
    TransferFailure(String),

    /// Parsing the local database copy failed
    #[error("Database load failed: {0}")]
    LoadFailure(String),

    /// No unused device path could be allocated for a new file
    #[error("No unused filename available on device for {0}")]
    PathAllocationFailure(String),

    /// Streaming a file's bytes failed
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// Operation not permitted in the session's current state
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Session already started for device {0}")]
    AlreadyStarted(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
