//! Persistence error types.

use thiserror::Error;

/// Errors that can occur while saving or loading snapshots
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store could not be read or written
    #[error("snapshot store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization to JSON failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The stored blob is not a valid snapshot
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}
