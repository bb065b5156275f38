//! Error types for mcdb
//!
//! Provides a unified error type for building and reading containers.
//! Absence of a key is not an error: lookups return `Option`.

use thiserror::Error;

/// Result type alias using McdbError
pub type Result<T> = std::result::Result<T, McdbError>;

/// Unified error type for mcdb operations
#[derive(Debug, Error)]
pub enum McdbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Container Errors
    // -------------------------------------------------------------------------
    /// Container failed structural validation, or a record/slot points
    /// outside the bounds it must lie in.
    #[error("Invalid container format: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    /// A key, value or the container as a whole exceeds format limits.
    #[error("Value out of range: {0}")]
    Value(String),

    /// API misuse: double finish, add after finish, lookup_next without
    /// a prior lookup_first.
    #[error("Invalid state: {0}")]
    State(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// Malformed `+klen,dlen:key->data` input.
    #[error("Malformed input at record {record}: {reason}")]
    Input { record: u64, reason: String },
}

impl McdbError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        McdbError::Format(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        McdbError::State(msg.into())
    }
}
