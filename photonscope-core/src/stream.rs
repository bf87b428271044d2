//! Canonical photon event stream.
//!
//! An [`EventStream`] stores events in Structure of Arrays layout: one
//! timestamp column plus optional detector-id and phase columns. Optional
//! columns are present for every event or for none, and all present columns
//! are index-aligned.

use std::collections::BTreeMap;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest timing resolution (seconds per tick) considered plausible.
pub const MIN_PLAUSIBLE_RESOLUTION: f64 = 1e-12;
/// Largest timing resolution (seconds per tick) considered plausible.
pub const MAX_PLAUSIBLE_RESOLUTION: f64 = 1e-3;

/// A stream of single-photon detection events.
///
/// Built once through the consuming `with_*` methods; there is no way to
/// mutate the columns of an existing stream in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventStream {
    timestamps: Vec<i64>,
    detectors: Option<Vec<u8>>,
    phases: Option<Vec<i64>>,
    timing_resolution: Option<f64>,
    unit: String,
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EventStream {
    /// Creates a stream holding only timestamps (in ticks).
    #[must_use]
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            detectors: None,
            phases: None,
            timing_resolution: None,
            unit: "ticks".to_string(),
        }
    }

    /// Attaches one detector id per event.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if `detectors` is not index-aligned
    /// with the timestamps.
    pub fn with_detectors(mut self, detectors: Vec<u8>) -> Result<Self> {
        self.check_len("detectors", detectors.len())?;
        self.detectors = Some(detectors);
        Ok(self)
    }

    /// Attaches one phase (or sub-cycle time) per event.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if `phases` is not index-aligned
    /// with the timestamps.
    pub fn with_phases(mut self, phases: Vec<i64>) -> Result<Self> {
        self.check_len("phases", phases.len())?;
        self.phases = Some(phases);
        Ok(self)
    }

    /// Sets the timing resolution in seconds per tick.
    ///
    /// Values outside `[1e-12, 1e-3]` are accepted but logged as suspicious.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if `seconds_per_tick` is not a finite
    /// positive number.
    pub fn with_timing_resolution(mut self, seconds_per_tick: f64) -> Result<Self> {
        self.timing_resolution = Some(validate_resolution(seconds_per_tick)?);
        Ok(self)
    }

    /// Sets the unit label of the timestamp column.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    fn check_len(&self, field: &'static str, actual: usize) -> Result<()> {
        if actual == self.timestamps.len() {
            Ok(())
        } else {
            Err(Error::LengthMismatch {
                field,
                expected: self.timestamps.len(),
                actual,
            })
        }
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if the stream holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Timestamps in ticks.
    #[must_use]
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Returns true if detector ids are present.
    #[must_use]
    pub fn has_detectors(&self) -> bool {
        self.detectors.is_some()
    }

    /// Returns true if phases are present.
    #[must_use]
    pub fn has_phases(&self) -> bool {
        self.phases.is_some()
    }

    /// Detector ids, if present.
    #[must_use]
    pub fn detectors(&self) -> Option<&[u8]> {
        self.detectors.as_deref()
    }

    /// Phases, if present.
    #[must_use]
    pub fn phases(&self) -> Option<&[i64]> {
        self.phases.as_deref()
    }

    /// Timing resolution in seconds per tick, if known.
    #[must_use]
    pub fn timing_resolution(&self) -> Option<f64> {
        self.timing_resolution
    }

    /// Unit label of the timestamp column.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Span between the first and last timestamp, in ticks.
    #[must_use]
    pub fn duration_ticks(&self) -> i64 {
        let min = self.timestamps.iter().copied().min();
        let max = self.timestamps.iter().copied().max();
        match (min, max) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0,
        }
    }

    /// Returns true if timestamps are non-decreasing.
    #[must_use]
    pub fn is_time_ordered(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] <= w[1])
    }

    /// Converts timestamps to seconds.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if no timing resolution is set.
    #[allow(clippy::cast_precision_loss)]
    pub fn times_s(&self) -> Result<Vec<f64>> {
        let resolution = self.timing_resolution.ok_or_else(|| {
            Error::Configuration(
                "timing resolution is not set; provide it when loading \
                 (e.g. --timing-resolution 5e-9) or rebuild the stream with \
                 with_timing_resolution()"
                    .to_string(),
            )
        })?;
        Ok(self
            .timestamps
            .iter()
            .map(|&t| t as f64 * resolution)
            .collect())
    }

    /// Splits timestamps by detector id.
    ///
    /// Keys are ascending detector ids; each value keeps stream order.
    ///
    /// # Errors
    /// Returns [`Error::NoDetectorData`] if the stream has no detector ids.
    pub fn by_detector(&self) -> Result<BTreeMap<u8, Vec<i64>>> {
        let detectors = self.detectors.as_ref().ok_or(Error::NoDetectorData)?;
        let mut out: BTreeMap<u8, Vec<i64>> = BTreeMap::new();
        for (&t, &d) in self.timestamps.iter().zip(detectors) {
            out.entry(d).or_default().push(t);
        }
        Ok(out)
    }

    /// Returns the stream stably sorted by timestamp.
    ///
    /// Detector ids and phases are permuted together with their timestamps,
    /// and events with equal timestamps keep their relative order.
    #[must_use]
    pub fn sorted_by_time(self) -> Self {
        if self.is_time_ordered() {
            return self;
        }

        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);

        let timestamps = permute(&self.timestamps, &order);
        let detectors = self.detectors.as_ref().map(|d| permute(d, &order));
        let phases = self.phases.as_ref().map(|p| permute(p, &order));

        Self {
            timestamps,
            detectors,
            phases,
            timing_resolution: self.timing_resolution,
            unit: self.unit,
        }
    }
}

fn permute<T: Copy>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i]).collect()
}

/// Checks a timing resolution, warning about implausible magnitudes.
///
/// # Errors
/// Returns [`Error::Configuration`] if the value is not finite and positive.
pub fn validate_resolution(seconds_per_tick: f64) -> Result<f64> {
    if !seconds_per_tick.is_finite() || seconds_per_tick <= 0.0 {
        return Err(Error::Configuration(format!(
            "timing resolution must be > 0 seconds per tick, got {seconds_per_tick}"
        )));
    }
    if !(MIN_PLAUSIBLE_RESOLUTION..=MAX_PLAUSIBLE_RESOLUTION).contains(&seconds_per_tick) {
        log::warn!("timing resolution {seconds_per_tick} s per tick looks unusual");
    }
    Ok(seconds_per_tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_times_s_requires_timing_resolution() {
        let stream = EventStream::new(vec![0, 1, 2]);
        let err = stream.times_s().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(err.category(), crate::ErrorCategory::Configuration);
    }

    #[test]
    fn test_times_s_computation() {
        let stream = EventStream::new(vec![0, 2, 4])
            .with_timing_resolution(5e-9)
            .unwrap();
        let times = stream.times_s().unwrap();
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(times[1], 10e-9);
        assert_relative_eq!(times[2], 20e-9);
    }

    #[test]
    fn test_invalid_resolution_rejected() {
        assert!(EventStream::new(vec![1]).with_timing_resolution(0.0).is_err());
        assert!(EventStream::new(vec![1])
            .with_timing_resolution(-5e-9)
            .is_err());
        assert!(EventStream::new(vec![1])
            .with_timing_resolution(f64::NAN)
            .is_err());
    }

    #[test]
    fn test_unusual_resolution_accepted() {
        let stream = EventStream::new(vec![1]).with_timing_resolution(1.0).unwrap();
        assert_eq!(stream.timing_resolution(), Some(1.0));
    }

    #[test]
    fn test_length_mismatch() {
        let err = EventStream::new(vec![1, 2, 3])
            .with_detectors(vec![0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                field: "detectors",
                expected: 3,
                actual: 2
            }
        ));
        assert!(EventStream::new(vec![1]).with_phases(vec![]).is_err());
    }

    #[test]
    fn test_by_detector() {
        let stream = EventStream::new(vec![10, 20, 30, 40])
            .with_detectors(vec![0, 1, 0, 1])
            .unwrap();
        let out = stream.by_detector().unwrap();
        assert_eq!(out[&0], vec![10, 30]);
        assert_eq!(out[&1], vec![20, 40]);
    }

    #[test]
    fn test_by_detector_many_channels() {
        let stream = EventStream::new((0..10).collect())
            .with_detectors(vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1])
            .unwrap();
        let out = stream.by_detector().unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_by_detector_without_detectors() {
        let stream = EventStream::new(vec![1, 2]);
        assert!(!stream.has_detectors());
        assert!(matches!(
            stream.by_detector().unwrap_err(),
            Error::NoDetectorData
        ));
    }

    #[test]
    fn test_sorted_by_time_keeps_alignment() {
        let stream = EventStream::new(vec![30, 10, 20, 10])
            .with_detectors(vec![0, 1, 0, 0])
            .unwrap()
            .with_phases(vec![3, 1, 2, 4])
            .unwrap();

        let sorted = stream.sorted_by_time();
        assert_eq!(sorted.timestamps(), &[10, 10, 20, 30]);
        // Stable: the detector-1 event at t=10 came first.
        assert_eq!(sorted.detectors().unwrap(), &[1, 0, 0, 0]);
        assert_eq!(sorted.phases().unwrap(), &[1, 4, 2, 3]);
        assert!(sorted.is_time_ordered());
    }

    #[test]
    fn test_by_detector_roundtrip_reproduces_sorted_stream() {
        let stream = EventStream::new(vec![5, 1, 9, 3, 7, 2])
            .with_detectors(vec![1, 0, 1, 0, 0, 1])
            .unwrap()
            .sorted_by_time();

        let mut merged: Vec<i64> = stream
            .by_detector()
            .unwrap()
            .into_values()
            .flatten()
            .collect();
        merged.sort_unstable();
        assert_eq!(merged, stream.timestamps());
    }

    #[test]
    fn test_duration_ticks() {
        assert_eq!(EventStream::new(vec![]).duration_ticks(), 0);
        assert_eq!(EventStream::new(vec![4, 2, 11]).duration_ticks(), 9);
    }
}
