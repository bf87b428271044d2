//! Decoder for the NI triple-channel binary tick format.
//!
//! The file is a flat run of little-endian `u32` words grouped in rows of
//! three: `(ch0_ticks, ch1_ticks, ref_ticks)`. A zero word means "no event in
//! this row for this column". Rows 0 and 1 never carry events; their third
//! word optionally holds the high/low durations of a duty-cycle reference
//! signal.
//!
//! # Processing Pipeline
//!
//! 1. Detect the calibration header from rows 0/1 of the reference column
//! 2. Drop rows 0/1 from every column
//! 3. Keep nonzero words per column and undo 32-bit counter overflow
//! 4. Align all channels to a common time origin
//! 5. Compute reference-cycle phase (header only)
//! 6. Merge both photon channels into one stream, stably sorted by time

use photonscope_core::{correct_overflow, wraparound_count, Calibration, EventStream};

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bytes per counter word.
pub const WORD_BYTES: usize = 4;
/// Words per row.
pub const COLUMNS: usize = 3;
/// Bytes per row.
pub const ROW_BYTES: usize = WORD_BYTES * COLUMNS;
/// Leading rows reserved for the calibration header.
pub const HEADER_ROWS: usize = 2;

/// Detector id assigned to the first photon column.
pub const CHANNEL_0: u8 = 0;
/// Detector id assigned to the second photon column.
pub const CHANNEL_1: u8 = 1;

/// Configuration for [`decode`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NiDecoderConfig {
    /// Stably sort the merged stream by timestamp.
    pub sort_by_time: bool,
}

impl Default for NiDecoderConfig {
    fn default() -> Self {
        Self { sort_by_time: true }
    }
}

impl NiDecoderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to sort the merged stream by timestamp.
    #[must_use]
    pub fn with_sort_by_time(mut self, sort_by_time: bool) -> Self {
        self.sort_by_time = sort_by_time;
        self
    }
}

/// Output of [`decode`].
#[derive(Debug, Clone)]
pub struct NiDecoded {
    /// Merged channel 0/1 events with detector ids, and phases when a
    /// calibration header was present. No timing resolution attached.
    pub events: EventStream,
    /// Reference-signal settings from the header.
    pub calibration: Option<Calibration>,
    /// Reference-signal edges after origin alignment.
    pub reference_edges: Vec<i64>,
    /// Nonzero words per column after the header rows.
    pub column_events: [usize; COLUMNS],
    /// Counter wraparounds detected per column.
    pub wraparounds: [usize; COLUMNS],
}

impl NiDecoded {
    /// Returns true if a calibration header was found.
    #[must_use]
    pub fn has_calibration(&self) -> bool {
        self.calibration.is_some()
    }
}

/// Splits raw bytes into the three `u32` columns.
///
/// # Errors
/// Returns [`Error::Misaligned`] if the length is not a multiple of
/// [`ROW_BYTES`], or [`Error::TooShort`] if fewer than [`HEADER_ROWS`] rows
/// are present.
pub fn split_columns(bytes: &[u8]) -> Result<[Vec<u32>; COLUMNS]> {
    if !bytes.len().is_multiple_of(ROW_BYTES) {
        return Err(Error::Misaligned {
            len: bytes.len(),
            record_bytes: ROW_BYTES,
        });
    }

    let rows = bytes.len() / ROW_BYTES;
    if rows < HEADER_ROWS {
        return Err(Error::TooShort {
            rows,
            required: HEADER_ROWS,
        });
    }

    let mut columns: [Vec<u32>; COLUMNS] = [
        Vec::with_capacity(rows),
        Vec::with_capacity(rows),
        Vec::with_capacity(rows),
    ];
    for row in bytes.chunks_exact(ROW_BYTES) {
        for (col, word) in columns.iter_mut().zip(row.chunks_exact(WORD_BYTES)) {
            col.push(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
        }
    }
    Ok(columns)
}

/// Reads the calibration header from the reference column.
///
/// Both header words zero means no header. A legitimately zero low (or
/// high) duration is indistinguishable from a partially empty header, so
/// one nonzero word is enough to count as present.
#[must_use]
pub fn detect_calibration(reference_column: &[u32]) -> Option<Calibration> {
    match reference_column {
        [0, 0, ..] => None,
        [high, low, ..] => Some(Calibration {
            high_ticks: *high,
            low_ticks: *low,
        }),
        _ => None,
    }
}

/// Virtual first reference edge, one period before the first detected edge.
///
/// With a single edge the edge itself is used; with none there is no origin.
#[must_use]
pub fn sync_start(reference: &[i64]) -> Option<i64> {
    match reference {
        [first, second, ..] => Some(first - (second - first)),
        [first] => Some(*first),
        [] => None,
    }
}

/// Earliest first event over both photon channels, or zero if both are empty.
#[must_use]
pub fn common_offset(ch0: &[i64], ch1: &[i64]) -> i64 {
    match (ch0.first(), ch1.first()) {
        (Some(&a), Some(&b)) => a.min(b),
        (Some(&a), None) => a,
        (None, Some(&b)) => b,
        (None, None) => 0,
    }
}

fn nonzero(column: &[u32]) -> Vec<u32> {
    column.iter().copied().filter(|&w| w != 0).collect()
}

fn shift(ticks: &mut [i64], origin: i64) {
    for t in ticks {
        *t -= origin;
    }
}

fn phases(ticks: &[i64], cycle: i64) -> Vec<i64> {
    ticks.iter().map(|t| t.rem_euclid(cycle)).collect()
}

/// Decodes a complete NI binary buffer.
///
/// # Errors
/// Returns [`Error::Misaligned`] or [`Error::TooShort`] for malformed input.
/// No partial result is produced.
pub fn decode(bytes: &[u8], config: &NiDecoderConfig) -> Result<NiDecoded> {
    let [col_a, col_b, col_c] = split_columns(bytes)?;

    // Header detection has to look at rows 0/1 before they are dropped.
    let calibration = detect_calibration(&col_c);

    let raw_ch0 = nonzero(&col_a[HEADER_ROWS..]);
    let raw_ch1 = nonzero(&col_b[HEADER_ROWS..]);
    let raw_ref = if calibration.is_some() {
        nonzero(&col_c[HEADER_ROWS..])
    } else {
        Vec::new()
    };

    let column_events = [raw_ch0.len(), raw_ch1.len(), raw_ref.len()];
    let wraparounds = [
        wraparound_count(&raw_ch0),
        wraparound_count(&raw_ch1),
        wraparound_count(&raw_ref),
    ];

    let mut ch0 = correct_overflow(&raw_ch0);
    let mut ch1 = correct_overflow(&raw_ch1);
    let mut reference = correct_overflow(&raw_ref);

    let mut phase_columns = None;
    if let Some(cal) = calibration {
        match sync_start(&reference) {
            Some(origin) => {
                shift(&mut ch0, origin);
                shift(&mut ch1, origin);
                shift(&mut reference, origin);
            }
            None => log::warn!(
                "calibration header present (high={}, low={}) but no reference edges; \
                 timestamps left unaligned",
                cal.high_ticks,
                cal.low_ticks
            ),
        }

        let cycle = cal.cycle_ticks();
        phase_columns = Some((phases(&ch0, cycle), phases(&ch1, cycle)));
    } else {
        let origin = common_offset(&ch0, &ch1);
        shift(&mut ch0, origin);
        shift(&mut ch1, origin);
    }

    let n0 = ch0.len();
    let n1 = ch1.len();

    let mut timestamps = ch0;
    timestamps.extend_from_slice(&ch1);

    let mut detectors = vec![CHANNEL_0; n0];
    detectors.resize(n0 + n1, CHANNEL_1);

    let mut events = EventStream::new(timestamps).with_detectors(detectors)?;
    if let Some((mut p0, p1)) = phase_columns {
        p0.extend_from_slice(&p1);
        events = events.with_phases(p0)?;
    }

    if config.sort_by_time && events.len() > 1 {
        events = events.sorted_by_time();
    }

    log::debug!(
        "decoded NI binary: {n0} ch0 + {n1} ch1 events, {} reference edges, \
         wraparounds {wraparounds:?}, calibration {calibration:?}",
        reference.len()
    );

    Ok(NiDecoded {
        events,
        calibration,
        reference_edges: reference,
        column_events,
        wraparounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_rows(rows: &[[u32; 3]]) -> Vec<u8> {
        rows.iter()
            .flat_map(|row| row.iter().flat_map(|w| w.to_le_bytes()))
            .collect()
    }

    #[test]
    fn test_misaligned_length() {
        for len in [1, 4, 8, 11, 13, 23, 25] {
            let data = vec![0u8; len];
            let err = decode(&data, &NiDecoderConfig::default()).unwrap_err();
            assert!(matches!(err, Error::Misaligned { .. }), "len {len}");
            assert_eq!(err.category(), photonscope_core::ErrorCategory::Format);
        }
    }

    #[test]
    fn test_too_short() {
        let data = encode_rows(&[[0, 0, 0]]);
        assert!(matches!(
            decode(&data, &NiDecoderConfig::default()),
            Err(Error::TooShort { rows: 1, .. })
        ));
        assert!(matches!(
            decode(&[], &NiDecoderConfig::default()),
            Err(Error::TooShort { rows: 0, .. })
        ));
    }

    #[test]
    fn test_header_only_file_is_empty_stream() {
        let data = encode_rows(&[[0, 0, 0], [0, 0, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert!(decoded.events.is_empty());
        assert!(decoded.events.has_detectors());
        assert!(!decoded.events.has_phases());
        assert!(!decoded.has_calibration());
    }

    #[test]
    fn test_no_header_merge_and_offset() {
        let data = encode_rows(&[
            [0, 0, 0],
            [0, 0, 0],
            [5, 7, 0],
            [10, 12, 0],
            [15, 0, 0],
        ]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();

        assert!(decoded.calibration.is_none());
        assert_eq!(decoded.events.timestamps(), &[0, 2, 5, 7, 10]);
        assert_eq!(decoded.events.detectors().unwrap(), &[0, 1, 0, 1, 0]);
        assert!(decoded.events.phases().is_none());
        assert_eq!(decoded.column_events, [3, 2, 0]);
    }

    #[test]
    fn test_no_header_ignores_reference_column() {
        // Column C words after the header are not events without a header.
        let data = encode_rows(&[[0, 0, 0], [0, 0, 0], [20, 0, 99], [30, 0, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert_eq!(decoded.events.timestamps(), &[0, 10]);
        assert!(decoded.reference_edges.is_empty());
    }

    #[test]
    fn test_header_rows_never_hold_events() {
        let data = encode_rows(&[[111, 222, 0], [333, 444, 0], [1000, 0, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert_eq!(decoded.events.timestamps(), &[0]);
    }

    #[test]
    fn test_single_channel_populated() {
        let data = encode_rows(&[[0, 0, 0], [0, 0, 0], [0, 40, 0], [0, 45, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert_eq!(decoded.events.timestamps(), &[0, 5]);
        assert_eq!(decoded.events.detectors().unwrap(), &[1, 1]);
    }

    #[test]
    fn test_header_phase_scenario() {
        // Reference edges at 1000, 1150, 1300 -> virtual first edge at 850.
        let data = encode_rows(&[
            [0, 0, 100],
            [0, 0, 50],
            [0, 0, 1000],
            [1170, 0, 1150],
            [0, 1200, 1300],
        ]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();

        let cal = decoded.calibration.unwrap();
        assert_eq!(cal.high_ticks, 100);
        assert_eq!(cal.low_ticks, 50);
        assert_eq!(cal.cycle_ticks(), 150);

        assert_eq!(decoded.reference_edges, vec![150, 300, 450]);
        assert_eq!(decoded.events.timestamps(), &[320, 350]);
        assert_eq!(decoded.events.detectors().unwrap(), &[0, 1]);
        assert_eq!(decoded.events.phases().unwrap(), &[20, 50]);
    }

    #[test]
    fn test_header_single_reference_edge() {
        let data = encode_rows(&[[0, 0, 10], [0, 0, 0], [600, 0, 500], [0, 650, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        // One edge: origin is the edge itself. Zero low duration still counts
        // as a header because the high word is nonzero.
        assert_eq!(decoded.calibration.unwrap().cycle_ticks(), 10);
        assert_eq!(decoded.reference_edges, vec![0]);
        assert_eq!(decoded.events.timestamps(), &[100, 150]);
        assert_eq!(decoded.events.phases().unwrap(), &[0, 0]);
    }

    #[test]
    fn test_header_without_reference_edges() {
        let data = encode_rows(&[[0, 0, 30], [0, 0, 70], [250, 0, 0], [0, 260, 0]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert!(decoded.reference_edges.is_empty());
        // No origin available: raw ticks kept, phases still computed.
        assert_eq!(decoded.events.timestamps(), &[250, 260]);
        assert_eq!(decoded.events.phases().unwrap(), &[50, 60]);
    }

    #[test]
    fn test_events_before_virtual_edge_have_nonnegative_phase() {
        // Edges at 500, 600 -> origin 400; event at 350 sits before it.
        let data = encode_rows(&[[0, 0, 60], [0, 0, 40], [350, 0, 500], [0, 0, 600]]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert_eq!(decoded.events.timestamps(), &[-50]);
        assert_eq!(decoded.events.phases().unwrap(), &[50]);
    }

    #[test]
    fn test_channel_overflow_corrected_before_merge() {
        let data = encode_rows(&[
            [0, 0, 0],
            [0, 0, 0],
            [4_294_967_290, 4_294_967_292, 0],
            [4_294_967_294, 0, 0],
            [2, 3, 0],
            [6, 0, 0],
        ]);
        let decoded = decode(&data, &NiDecoderConfig::default()).unwrap();
        assert_eq!(decoded.wraparounds, [1, 1, 0]);
        assert_eq!(decoded.events.timestamps(), &[0, 2, 4, 8, 9, 12]);
        assert_eq!(decoded.events.detectors().unwrap(), &[0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn test_unsorted_merge_keeps_channel_blocks() {
        let data = encode_rows(&[[0, 0, 0], [0, 0, 0], [5, 7, 0], [10, 12, 0]]);
        let config = NiDecoderConfig::new().with_sort_by_time(false);
        let decoded = decode(&data, &config).unwrap();
        assert_eq!(decoded.events.timestamps(), &[0, 5, 2, 7]);
        assert_eq!(decoded.events.detectors().unwrap(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_phase_range_and_ordering_over_generated_input() {
        let high = 37_u32;
        let low = 23_u32;
        let mut rows = vec![[0, 0, high], [0, 0, low]];
        let mut seed = 12_345_u32;
        let mut tick = 4_294_900_000_u32;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            tick = tick.wrapping_add(seed % 997 + 1);
            let a = if seed % 3 == 0 { 0 } else { tick };
            let b = if seed % 5 == 0 { tick.wrapping_add(1) } else { 0 };
            let r = if seed % 7 == 0 { tick.wrapping_add(2) } else { 0 };
            rows.push([a, b, r]);
        }
        let decoded = decode(&encode_rows(&rows), &NiDecoderConfig::default()).unwrap();

        let cycle = i64::from(high + low);
        let events = &decoded.events;
        assert!(events.is_time_ordered());
        let phases = events.phases().unwrap();
        assert_eq!(phases.len(), events.len());
        for (&t, &p) in events.timestamps().iter().zip(phases) {
            assert!((0..cycle).contains(&p));
            assert_eq!(p, t.rem_euclid(cycle));
        }
    }

    #[test]
    fn test_sync_start_and_offset_helpers() {
        assert_eq!(sync_start(&[100, 130, 160]), Some(70));
        assert_eq!(sync_start(&[100]), Some(100));
        assert_eq!(sync_start(&[]), None);
        assert_eq!(common_offset(&[5, 9], &[7]), 5);
        assert_eq!(common_offset(&[], &[7]), 7);
        assert_eq!(common_offset(&[], &[]), 0);
    }
}
