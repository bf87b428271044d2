//! Adapter for NI triple-channel binary files.

use std::path::Path;

use photonscope_core::{Dataset, MetaValue, Metadata, Provenance, Retained};
use photonscope_formats::{decode_ni_binary, NiDecoded, NiDecoderConfig};

use crate::{LoadOptions, MappedFileReader, Result};

/// Seconds per tick assumed when no resolution is supplied.
pub const DEFAULT_TIMING_RESOLUTION: f64 = 10e-9;

/// Loads an NI binary file.
///
/// The timing resolution comes from `options.timing_resolution` or
/// [`DEFAULT_TIMING_RESOLUTION`]; nothing in the file records it. Sorting
/// defaults to on.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn load_ni_binary(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let reader = MappedFileReader::open(path)?;
    let config = NiDecoderConfig::new().with_sort_by_time(options.sort_or(true));
    let NiDecoded {
        events,
        calibration,
        reference_edges,
        column_events,
        ..
    } = decode_ni_binary(reader.as_bytes(), &config)?;

    let resolution = options
        .timing_resolution
        .unwrap_or(DEFAULT_TIMING_RESOLUTION);
    let events = events.with_timing_resolution(resolution)?;

    let mut meta = Metadata::new();
    meta.insert("format", "ni-binary");
    meta.insert("has_ttl", calibration.is_some());
    meta.insert(
        "ttl_settings",
        calibration.map(|cal| cal.as_triple().to_vec()),
    );
    meta.insert(
        "nanotimes_kind",
        events.has_phases().then_some("ttl_phase_ticks"),
    );
    let per_channel: Vec<MetaValue> = column_events[..2]
        .iter()
        .map(|&n| MetaValue::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        .collect();
    meta.insert("events_per_channel", per_channel);

    let retained = if calibration.is_some() {
        Retained::ReferenceEdges(reference_edges)
    } else {
        Retained::Nothing
    };

    log::debug!(
        "loaded {} photons from {} ({} bytes)",
        events.len(),
        path.display(),
        reader.len()
    );

    Ok(Dataset::new(
        events,
        meta,
        Provenance::from_path(path).with_retained(retained),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use photonscope_core::ErrorCategory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_rows(rows: &[[u32; 3]]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for row in rows {
            for word in row {
                file.write_all(&word.to_le_bytes()).unwrap();
            }
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_without_header() {
        let file = write_rows(&[[0, 0, 0], [0, 0, 0], [5, 7, 0], [10, 12, 0], [15, 0, 0]]);
        let ds = load_ni_binary(file.path(), &LoadOptions::default()).unwrap();

        assert_eq!(ds.events().timestamps(), &[0, 2, 5, 7, 10]);
        assert_relative_eq!(ds.events().timing_resolution().unwrap(), 10e-9);
        assert_eq!(ds.format(), Some("ni-binary"));
        assert_eq!(ds.meta.get("has_ttl").unwrap().as_bool(), Some(false));
        assert!(ds.meta.get("ttl_settings").unwrap().is_null());
        assert!(ds.meta.get("nanotimes_kind").unwrap().is_null());
        assert!(ds.provenance.reference_edges().is_none());
        assert_eq!(ds.source(), Some(file.path()));
    }

    #[test]
    fn test_load_with_header() {
        let file = write_rows(&[
            [0, 0, 100],
            [0, 0, 50],
            [0, 0, 1000],
            [1170, 0, 1150],
        ]);
        let options = LoadOptions::default().with_timing_resolution(12.5e-9);
        let ds = load_ni_binary(file.path(), &options).unwrap();

        assert_eq!(ds.events().timestamps(), &[320]);
        assert_eq!(ds.events().phases().unwrap(), &[20]);
        assert_relative_eq!(ds.events().timing_resolution().unwrap(), 12.5e-9);
        assert_eq!(ds.meta.get("has_ttl").unwrap().as_bool(), Some(true));
        assert_eq!(
            ds.meta.get("ttl_settings").unwrap(),
            &MetaValue::List(vec![
                MetaValue::Int(100),
                MetaValue::Int(50),
                MetaValue::Int(150)
            ])
        );
        assert_eq!(
            ds.meta.get("nanotimes_kind").unwrap().as_str(),
            Some("ttl_phase_ticks")
        );
        assert_eq!(ds.provenance.reference_edges(), Some(&[150, 300][..]));
    }

    #[test]
    fn test_load_misaligned_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 13]).unwrap();
        file.flush().unwrap();

        let err = load_ni_binary(file.path(), &LoadOptions::default()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_load_rejects_bad_resolution() {
        let file = write_rows(&[[0, 0, 0], [0, 0, 0]]);
        let options = LoadOptions::default().with_timing_resolution(-1.0);
        let err = load_ni_binary(file.path(), &options).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
