//! Store error types.

use thiserror::Error;

/// Store operation errors.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Lookup, update, or delete target absent
    #[error("Character with id {id} not found")]
    RecordNotFound { id: i64 },

    /// Search produced zero matching rows
    #[error("no characters matched the search")]
    NoMatches,

    /// Search called without any terms
    #[error("at least one search term required")]
    MissingSearchTerm,

    /// Pagination parameter outside the valid range
    #[error("'{param}' must be at least 1")]
    InvalidPagination { param: &'static str },

    /// Field not part of the table schema
    #[error("Field '{field}' is not a column of the table")]
    UnknownField { field: String },

    /// Insert left a schema column without a value
    #[error("Missing value for column '{field}'")]
    MissingField { field: String },

    /// Request value that cannot be stored in a CSV cell
    #[error("Unsupported value for field '{field}': expected a string or number")]
    UnsupportedValue { field: String },

    /// Store entered the degraded state after a failed load
    #[error("no data available")]
    Unavailable,

    /// Backing file unreadable after the retry budget was exhausted
    #[error("Failed to load backing file: {0}")]
    Load(String),

    /// Backing file content inconsistent with the expected layout
    #[error("Malformed backing file: {0}")]
    Malformed(String),

    /// I/O error during write-back
    #[error("I/O error: {0}")]
    Io(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIo(String),
}
