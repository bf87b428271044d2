//! Binned intensity traces for visual screening.
//!
//! Event times are histogrammed into fixed-width bins spanning the observed
//! time range, one trace per detector channel (or a single trace when the
//! stream carries no detector ids). Long traces are thinned by a uniform
//! stride so plotting stays responsive.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::{Error, EventStream, Result};

/// Largest number of bins a single trace may span.
pub const MAX_BINS: usize = 1 << 26;

/// Options for [`build_traces`].
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Bin width in milliseconds.
    pub bin_width_ms: f64,
    /// Channels to include (`None` = every channel present).
    pub channels: Option<Vec<u8>>,
    /// Display labels per channel.
    pub labels: BTreeMap<u8, String>,
    /// Maximum number of points per trace before decimation.
    pub max_points: usize,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            bin_width_ms: 10.0,
            channels: None,
            labels: BTreeMap::new(),
            max_points: 200_000,
        }
    }
}

impl TraceOptions {
    /// Sets the bin width in milliseconds.
    #[must_use]
    pub fn with_bin_width_ms(mut self, bin_width_ms: f64) -> Self {
        self.bin_width_ms = bin_width_ms;
        self
    }

    /// Restricts the traces to the given channels.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<u8>) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Sets the decimation cap.
    #[must_use]
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Sets a display label for a channel.
    #[must_use]
    pub fn with_label(mut self, channel: u8, label: impl Into<String>) -> Self {
        self.labels.insert(channel, label.into());
        self
    }
}

/// One binned trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTrace {
    /// Detector channel, `None` for the all-photon trace.
    pub channel: Option<u8>,
    /// Legend name.
    pub name: String,
    /// Bin centres in seconds.
    pub centers_s: Vec<f64>,
    /// Counts per bin.
    pub counts: Vec<u64>,
}

impl ChannelTrace {
    /// Total counts in the (possibly decimated) trace.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Histograms times (seconds) into bins of `bin_width_s`.
///
/// Bins start at the earliest time; there are `ceil((max - min) / width)` of
/// them and the last one is closed on the right. Returns empty vectors when
/// there are no times, the range is zero or the width is not positive.
///
/// # Errors
/// Returns a configuration error if the range needs more than [`MAX_BINS`]
/// bins at this width.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn bin_times(times_s: &[f64], bin_width_s: f64) -> Result<(Vec<f64>, Vec<u64>)> {
    if times_s.is_empty() || bin_width_s.is_nan() || bin_width_s <= 0.0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let t_min = times_s.iter().copied().fold(f64::INFINITY, f64::min);
    let t_max = times_s.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n_bins = ((t_max - t_min) / bin_width_s).ceil();
    if n_bins.is_nan() || n_bins < 1.0 {
        return Ok((Vec::new(), Vec::new()));
    }
    if n_bins > MAX_BINS as f64 {
        return Err(Error::Configuration(format!(
            "time range {:.3e} s needs {n_bins:.3e} bins of {bin_width_s} s, limit is {MAX_BINS}; \
             use a wider bin",
            t_max - t_min
        )));
    }
    let n_bins = n_bins as usize;

    let mut counts = vec![0u64; n_bins];
    for &t in times_s {
        let bin = ((t - t_min) / bin_width_s).floor() as usize;
        counts[bin.min(n_bins - 1)] += 1;
    }

    let centers = (0..n_bins)
        .map(|i| t_min + (i as f64 + 0.5) * bin_width_s)
        .collect();

    Ok((centers, counts))
}

/// Keeps every `ceil(len / max_points)`-th sample when a trace is too long.
#[must_use]
pub fn decimate<T: Copy>(values: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 || values.len() <= max_points {
        return values.to_vec();
    }
    let step = values.len().div_ceil(max_points);
    values.iter().step_by(step).copied().collect()
}

/// Builds one binned trace per selected channel.
///
/// # Errors
/// Returns a configuration error if the stream has no timing resolution or
/// a trace would need more than [`MAX_BINS`] bins.
pub fn build_traces(stream: &EventStream, options: &TraceOptions) -> Result<Vec<ChannelTrace>> {
    let times = stream.times_s()?;
    let bin_width_s = options.bin_width_ms * 1e-3;

    let groups: Vec<(Option<u8>, Vec<f64>)> = match stream.detectors() {
        None => vec![(None, times)],
        Some(detectors) => {
            let channels: Vec<u8> = match &options.channels {
                Some(selected) => selected.clone(),
                None => detectors
                    .iter()
                    .copied()
                    .collect::<BTreeSet<u8>>()
                    .into_iter()
                    .collect(),
            };
            channels
                .into_iter()
                .map(|ch| {
                    let selected = times
                        .iter()
                        .zip(detectors)
                        .filter(|&(_, &d)| d == ch)
                        .map(|(&t, _)| t)
                        .collect();
                    (Some(ch), selected)
                })
                .collect()
        }
    };

    groups
        .into_iter()
        .map(|(channel, times)| {
            let (centers, counts) = bin_times(&times, bin_width_s)?;
            let name = match channel {
                None => "all photons".to_string(),
                Some(ch) => options
                    .labels
                    .get(&ch)
                    .cloned()
                    .unwrap_or_else(|| format!("detector {ch}")),
            };
            Ok(ChannelTrace {
                channel,
                name,
                centers_s: decimate(&centers, options.max_points),
                counts: decimate(&counts, options.max_points),
            })
        })
        .collect()
}

/// Plot title: `Photon trace | <file name> | bin = <w> ms`.
#[must_use]
pub fn trace_title(source: Option<&Path>, bin_width_ms: f64, show_filename: bool) -> String {
    let mut parts = vec!["Photon trace".to_string()];
    if show_filename {
        if let Some(name) = source.and_then(Path::file_name) {
            parts.push(name.to_string_lossy().into_owned());
        }
    }
    parts.push(format!("bin = {bin_width_ms} ms"));
    parts.join(" | ")
}
