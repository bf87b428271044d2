//! Decoder error types.

use photonscope_core::ErrorCategory;
use thiserror::Error;

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoder error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Byte length is not a whole number of records.
    #[error("data length {len} is not a multiple of {record_bytes} bytes")]
    Misaligned { len: usize, record_bytes: usize },

    /// Too few records to hold the mandatory header.
    #[error("data too short: {rows} rows, need at least {required}")]
    TooShort { rows: usize, required: usize },

    /// Record content that cannot be interpreted.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Hardware model whose record layout is not supported.
    #[error("unsupported SPC model: {0}")]
    UnsupportedModel(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] photonscope_core::Error),
}

impl Error {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Misaligned { .. }
            | Error::TooShort { .. }
            | Error::InvalidRecord(_)
            | Error::UnsupportedModel(_) => ErrorCategory::Format,
            Error::CoreError(e) => e.category(),
        }
    }
}
