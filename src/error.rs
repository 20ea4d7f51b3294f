//! Error types for disklist
//!
//! Provides a unified error type for all list operations.

use thiserror::Error;

/// Result type alias using ListError
pub type Result<T> = std::result::Result<T, ListError>;

/// Unified error type for disklist operations
///
/// A value that is not in the list is not an error: `delete_first` reports
/// it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum ListError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Any failed read/write/seek/sync, passed through untouched.
    /// A short read (truncated file) surfaces here as `UnexpectedEof`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// The file is not a list of the expected scheme, or its contents
    /// cannot be addressed (bad page size, slot past page capacity).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ListError {
    /// True for errors that mean "wrong or damaged file" rather than a
    /// failing device
    pub fn is_format(&self) -> bool {
        matches!(self, ListError::InvalidFormat(_))
    }
}
