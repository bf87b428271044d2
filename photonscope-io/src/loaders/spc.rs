//! Adapter for Becker & Hickl `.spc` files.
//!
//! Record decoding sits behind [`LegacyDecoder`] so the adapter only deals
//! with resolution selection, optional sorting and metadata. The default
//! [`BhSpcDecoder`] handles the 4-byte FIFO family natively.

use std::path::Path;

use photonscope_core::{Dataset, EventStream, Metadata, Provenance};
use photonscope_formats::{decode_fifo, SpcModel};

use crate::{LoadOptions, MappedFileReader, Result};

/// Records returned by a legacy decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyRecords {
    /// Macrotime ticks.
    pub timestamps: Vec<i64>,
    /// Routing channel per photon.
    pub channels: Vec<u8>,
    /// Microtime per photon, if the format records one.
    pub microtimes: Option<Vec<i64>>,
    /// Seconds per macrotime tick as stored in the file.
    pub resolution: f64,
}

/// Decodes a legacy detector file for a given hardware model.
pub trait LegacyDecoder: Send + Sync {
    /// Reads and decodes the file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    fn decode(&self, path: &Path, model: &str) -> Result<LegacyRecords>;
}

/// Native decoder for SPC FIFO files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BhSpcDecoder;

impl LegacyDecoder for BhSpcDecoder {
    fn decode(&self, path: &Path, model: &str) -> Result<LegacyRecords> {
        let model: SpcModel = model.parse()?;
        let reader = MappedFileReader::open(path)?;
        let records = decode_fifo(reader.as_bytes(), model)?;
        Ok(LegacyRecords {
            timestamps: records.macrotimes,
            channels: records.channels,
            microtimes: Some(records.microtimes),
            resolution: records.resolution_s,
        })
    }
}

/// Loads an SPC file with [`BhSpcDecoder`].
///
/// # Errors
/// Returns an error if the file cannot be read or decoded, or the model is
/// unsupported.
pub fn load_spc(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    load_spc_with(&BhSpcDecoder, path, options)
}

/// Loads an SPC file through the given decoder.
///
/// An override in `options.timing_resolution` wins over the file value.
/// Sorting defaults to off.
///
/// # Errors
/// Returns an error if decoding fails or the decoder output is inconsistent.
pub fn load_spc_with(
    decoder: &dyn LegacyDecoder,
    path: &Path,
    options: &LoadOptions,
) -> Result<Dataset> {
    let records = decoder.decode(path, &options.spc_model)?;

    let (resolution, source) = match options.timing_resolution {
        Some(value) => (value, "override"),
        None => (records.resolution, "file"),
    };

    let mut events = EventStream::new(records.timestamps)
        .with_detectors(records.channels)?
        .with_timing_resolution(resolution)?;
    if let Some(microtimes) = records.microtimes {
        events = events.with_phases(microtimes)?;
    }
    if options.sort_or(false) && events.len() > 1 {
        events = events.sorted_by_time();
    }

    let mut meta = Metadata::new();
    meta.insert("format", "spc");
    meta.insert("spc_model", options.spc_model.as_str());
    meta.insert("timing_resolution_source", source);

    log::debug!(
        "loaded {} photons from {} ({}, resolution {resolution:e} s from {source})",
        events.len(),
        path.display(),
        options.spc_model
    );

    Ok(Dataset::new(events, meta, Provenance::from_path(path)))
}
