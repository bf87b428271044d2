//! photonscope-core: Canonical types for time-tagged single-photon data.
//!
//! This crate provides the normalized event stream every loader produces,
//! the dataset container around it, fixed-width counter overflow correction
//! and the binning used for trace previews.
//!

pub mod counter;
pub mod dataset;
pub mod error;
pub mod stream;
pub mod trace;

pub use counter::{correct_overflow, wraparound_count, CounterWord};
pub use dataset::{Calibration, Dataset, MetaValue, Metadata, Provenance, Retained};
pub use error::{Error, ErrorCategory, Result};
pub use stream::{validate_resolution, EventStream};
pub use trace::{
    bin_times, build_traces, decimate, trace_title, ChannelTrace, TraceOptions, MAX_BINS,
};
