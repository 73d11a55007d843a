//! Error types for the autofill core library.

use thiserror::Error;

/// Errors that can occur at the engine boundary.
///
/// Lookup misses inside the engine (unknown forms, unknown records) are not
/// errors; those operations no-op by contract. This enum covers failures of
/// the JSON boundary itself: wire payloads, config blobs and FFI input.
#[derive(Error, Debug, Clone)]
pub enum AutofillError {
    /// Error serializing/deserializing JSON
    #[error("JSON error: {0}")]
    JsonError(String),

    /// General error
    #[error("Error: {0}")]
    General(String),
}

impl From<serde_json::Error> for AutofillError {
    fn from(err: serde_json::Error) -> Self {
        AutofillError::JsonError(err.to_string())
    }
}

/// Result type alias for engine boundary operations.
pub type AutofillResult<T> = Result<T, AutofillError>;
