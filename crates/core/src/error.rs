//! Error types for the OHLCV loader.

use std::fmt;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the OHLCV loader.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid required setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file missing or unparseable.
    #[error("Source read error: {0}")]
    SourceRead(String),

    /// Source has fewer columns than the canonical schema.
    #[error("Schema mismatch: source has {found} columns, expected at least {expected}")]
    SchemaMismatch { found: usize, expected: usize },

    /// A single row could not be coerced into a canonical record.
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// Database connection could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Destination table could not be created.
    #[error("Provision error: {0}")]
    Provision(String),

    /// Batch insert or commit failed.
    #[error("Insert error: {0}")]
    Insert(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a source read error.
    pub fn source_read(msg: impl Into<String>) -> Self {
        Error::SourceRead(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a provisioning error.
    pub fn provision(msg: impl Into<String>) -> Self {
        Error::Provision(msg.into())
    }

    /// Create an insert error.
    pub fn insert(msg: impl Into<String>) -> Self {
        Error::Insert(msg.into())
    }

    /// Whether this error terminates the process with a non-zero status.
    ///
    /// A failed insert is reported but does not change the exit status.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Insert(_))
    }
}

/// Why a single row failed coercion.
///
/// This is a per-row outcome, returned as a value and absorbed by the
/// coercer under the skip policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    /// Zero-based data row index within the batch.
    pub row: usize,
    /// Canonical field name.
    pub field: &'static str,
    /// Raw cell value.
    pub value: String,
    /// Reason the value was rejected.
    pub reason: String,
}

impl CoercionError {
    /// Create a coercion error for one field of one row.
    pub fn new(
        row: usize,
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: cannot coerce field '{}' from '{}': {}",
            self.row, self.field, self.value, self.reason
        )
    }
}

impl std::error::Error for CoercionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_not_fatal() {
        assert!(!Error::insert("disk full").is_fatal());
        assert!(Error::config("missing CSV_FILE").is_fatal());
        assert!(Error::SchemaMismatch { found: 4, expected: 6 }.is_fatal());
    }

    #[test]
    fn test_coercion_error_display() {
        let err = CoercionError::new(3, "volume", "abc", "not an integer");
        assert_eq!(
            err.to_string(),
            "row 3: cannot coerce field 'volume' from 'abc': not an integer"
        );

        let wrapped: Error = err.into();
        assert!(matches!(wrapped, Error::Coercion(ref e) if e.field == "volume"));
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = Error::SchemaMismatch { found: 5, expected: 6 };
        assert_eq!(
            err.to_string(),
            "Schema mismatch: source has 5 columns, expected at least 6"
        );
    }
}
