//! I/O error types.

use photonscope_core::ErrorCategory;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Requested container group does not exist.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// No loader bound to the file suffix.
    #[error("no loader registered for '{suffix}'. Known suffixes: {known}")]
    UnknownSuffix { suffix: String, known: String },

    /// Suffix already bound and overwrite not requested.
    #[error("loader already registered for {0}")]
    LoaderExists(String),

    /// Suffix that normalizes to nothing.
    #[error("empty suffix is not allowed")]
    InvalidSuffix,

    /// Byte-level decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] photonscope_formats::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] photonscope_core::Error),

    /// Option file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl Error {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) => ErrorCategory::Io,
            Error::InvalidFormat(_) => ErrorCategory::Format,
            Error::GroupNotFound(_) | Error::UnknownSuffix { .. } => ErrorCategory::Lookup,
            Error::LoaderExists(_) | Error::InvalidSuffix | Error::Config(_) => {
                ErrorCategory::Configuration
            }
            Error::Decode(e) => e.category(),
            Error::CoreError(e) => e.category(),
            #[cfg(feature = "hdf5")]
            Error::Hdf5(_) => ErrorCategory::Io,
        }
    }
}
