//! Errors raised by the pure domain layer.
//!
//! Everything here is detected before a request leaves the client, so a
//! `CoreError` always means nothing was sent to the server.

/// Domain-level validation errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A value failed a domain rule (empty task id, missing voice,
    /// unknown animation mode, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The upload's extension is not one the job kind accepts.
    #[error("Unsupported file type: {filename} (allowed: {allowed})")]
    UnsupportedFileType {
        filename: String,
        /// Comma-separated list of accepted extensions.
        allowed: String,
    },

    /// The upload is smaller or larger than the job kind allows.
    #[error("File size out of range: {size} bytes (allowed: {min}..={max})")]
    FileSize {
        /// Actual size in bytes.
        size: u64,
        /// Inclusive lower bound in bytes.
        min: u64,
        /// Inclusive upper bound in bytes.
        max: u64,
    },
}
