//! Per-load options shared by every format adapter.
//!
//! Each adapter reads the fields that apply to it and ignores the rest, so a
//! single `LoadOptions` can be passed through the registry for any file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Options forwarded to a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Seconds per tick; overrides any value stored in the file.
    pub timing_resolution: Option<f64>,
    /// Sort events by timestamp (`None` = format default).
    pub sort_by_time: Option<bool>,
    /// Explicit Photon-HDF5 photon group name.
    pub group: Option<String>,
    /// Index among sorted `photon_data*` groups when `group` is unset.
    pub group_index: usize,
    /// Copy the Photon-HDF5 `/comment` into metadata.
    pub include_comment: bool,
    /// Keep the Photon-HDF5 file open and hand the handle to the caller.
    pub keep_file_open: bool,
    /// SPC hardware model name.
    pub spc_model: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timing_resolution: None,
            sort_by_time: None,
            group: None,
            group_index: 0,
            include_comment: true,
            keep_file_open: false,
            spc_model: "SPC-134".to_string(),
        }
    }
}

impl LoadOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads options from a JSON string. Missing keys take default values.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the timing resolution override in seconds per tick.
    #[must_use]
    pub fn with_timing_resolution(mut self, seconds_per_tick: f64) -> Self {
        self.timing_resolution = Some(seconds_per_tick);
        self
    }

    /// Forces sorting on or off.
    #[must_use]
    pub fn with_sort_by_time(mut self, sort: bool) -> Self {
        self.sort_by_time = Some(sort);
        self
    }

    /// Selects a Photon-HDF5 group by name.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Selects a Photon-HDF5 group by index.
    #[must_use]
    pub fn with_group_index(mut self, index: usize) -> Self {
        self.group_index = index;
        self
    }

    /// Sets whether the file comment is copied into metadata.
    #[must_use]
    pub fn with_include_comment(mut self, include: bool) -> Self {
        self.include_comment = include;
        self
    }

    /// Sets whether the container handle is retained.
    #[must_use]
    pub fn with_keep_file_open(mut self, keep: bool) -> Self {
        self.keep_file_open = keep;
        self
    }

    /// Sets the SPC hardware model.
    #[must_use]
    pub fn with_spc_model(mut self, model: impl Into<String>) -> Self {
        self.spc_model = model.into();
        self
    }

    /// Effective sort flag given a format's default.
    #[must_use]
    pub fn sort_or(&self, format_default: bool) -> bool {
        self.sort_by_time.unwrap_or(format_default)
    }
}
