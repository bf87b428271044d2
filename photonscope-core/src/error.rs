//! Error types for photonscope-core.

use thiserror::Error;

/// Result type alias for photonscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification shared by every photonscope error type.
///
/// Lets callers (the CLI, the browser) react to a failure without matching
/// on each crate's concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input: bad alignment, truncated file, missing required field.
    Format,
    /// Caller-correctable setup problem, e.g. a missing timing resolution.
    Configuration,
    /// Something named by the caller does not exist (suffix, group).
    Lookup,
    /// Underlying operating system I/O failure.
    Io,
}

/// Core error types for the canonical data model.
#[derive(Error, Debug)]
pub enum Error {
    /// Timing resolution missing or not usable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Parallel per-event arrays differ in length.
    #[error("length mismatch: {field} has {actual} entries, timestamps have {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Per-detector access on a stream without detector ids.
    #[error("no detector information available")]
    NoDetectorData,
}

impl Error {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration(_) => ErrorCategory::Configuration,
            Error::LengthMismatch { .. } => ErrorCategory::Format,
            Error::NoDetectorData => ErrorCategory::Lookup,
        }
    }
}
