//! Common error types for the compensation engine

use thiserror::Error;

/// Common result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by all engine components.
///
/// `Validation`, `MatrixNotFound`, and `FileFormat` are expected business
/// outcomes surfaced to the caller; the rest are infrastructure failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input; names the offending field
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field that failed validation (e.g. "performance rating")
        field: String,
        /// Human-readable description of the violation
        message: String,
    },

    /// No adjustment matrix cell configured for the bucket/ratio/date/tenant
    #[error("{0}")]
    MatrixNotFound(String),

    /// Uploaded file cannot be parsed at all (corrupt or unsupported container)
    #[error("Unreadable upload: {0}")]
    FileFormat(String),

    /// Caller is not allowed to operate on the requested tenant
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (task faults, serialization, timeouts)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a `Validation` error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors that are recovered at row granularity during bulk
    /// processing (captured in the row result instead of propagating)
    pub fn is_row_level(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::MatrixNotFound(_))
    }
}
