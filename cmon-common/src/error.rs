//! Common error types for Court Monitor

use thiserror::Error;

/// Common result type for Court Monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Court Monitor crates
#[derive(Error, Debug)]
pub enum Error {
    /// Local, recoverable input problem (e.g. completing an order without a date)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network or backend failure; surfaced as retryable, never retried automatically
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// Referenced case, order or profile is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would duplicate a row the user already has (e.g. a case number)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (corrupt row, serialization failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input rejected by a domain rule before anything is persisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Entering `completed` requires a completion date
    #[error("completion date is required to mark an order as completed")]
    MissingCompletionDate,

    /// Unknown enum value on the wire
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// Required free-text field left blank
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

impl Error {
    /// True when the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientIo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_io_is_retryable() {
        assert!(Error::TransientIo("webhook timed out".to_string()).is_retryable());
        assert!(!Error::Conflict("case PIL/1/2025".to_string()).is_retryable());
        assert!(!Error::Validation(ValidationError::MissingCompletionDate).is_retryable());
    }
}
