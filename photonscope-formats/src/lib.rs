//! photonscope-formats: Byte-level decoders for photon time-tag files.
//!
//! This crate turns raw file bytes into normalized event columns. It does
//! no file I/O of its own; `photonscope-io` owns opening and mapping files.
//!
//! # Key Components
//!
//! - [`ni_binary`] - NI triple-channel `u32` tick format with optional
//!   duty-cycle calibration header
//! - [`spc`] - Becker & Hickl SPC FIFO records (4-byte family)

mod error;
pub mod ni_binary;
pub mod spc;

pub use error::{Error, Result};
pub use ni_binary::{decode as decode_ni_binary, NiDecoded, NiDecoderConfig};
pub use spc::{decode_fifo, SpcModel, SpcRecords};
