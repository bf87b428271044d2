//! Dataset container: one event stream plus metadata and provenance.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{EventStream, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetaValue>),
}

impl MetaValue {
    /// Returns the boolean value, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string value, if this is a `Text`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => write!(f, "null"),
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Float(x) => write!(f, "{x}"),
            MetaValue::Text(s) => write!(f, "{s}"),
            MetaValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl<T: Into<MetaValue>> From<Option<T>> for MetaValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetaValue::Null, Into::into)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(values: Vec<T>) -> Self {
        MetaValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Descriptive metadata attached to a dataset (format name, acquisition
/// parameters, calibration settings, ...).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.0.remove(key)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw data a loader chose to keep alongside the normalized stream.
#[derive(Default)]
pub enum Retained {
    /// Nothing beyond the source path.
    #[default]
    Nothing,
    /// Reference-signal edge times (ticks, aligned like the events).
    ReferenceEdges(Vec<i64>),
    /// An open source handle whose lifetime now belongs to the caller.
    Handle(Box<dyn Any + Send + Sync>),
}

impl fmt::Debug for Retained {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retained::Nothing => write!(f, "Nothing"),
            Retained::ReferenceEdges(edges) => {
                write!(f, "ReferenceEdges({} edges)", edges.len())
            }
            Retained::Handle(_) => write!(f, "Handle(..)"),
        }
    }
}

/// Where a dataset came from.
#[derive(Debug, Default)]
pub struct Provenance {
    /// Originating file, if any.
    pub source: Option<PathBuf>,
    /// Raw payload kept by the loader.
    pub retained: Retained,
}

impl Provenance {
    /// Provenance with only a source path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self {
            source: Some(path.to_path_buf()),
            retained: Retained::Nothing,
        }
    }

    /// Attaches a retained payload.
    #[must_use]
    pub fn with_retained(mut self, retained: Retained) -> Self {
        self.retained = retained;
        self
    }

    /// Downcasts a retained handle to a concrete type.
    #[must_use]
    pub fn handle<T: Any>(&self) -> Option<&T> {
        match &self.retained {
            Retained::Handle(h) => h.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Reference-signal edges, if the loader kept them.
    #[must_use]
    pub fn reference_edges(&self) -> Option<&[i64]> {
        match &self.retained {
            Retained::ReferenceEdges(edges) => Some(edges),
            _ => None,
        }
    }
}

/// Duty-cycle reference settings recovered from a binary file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Ticks the reference signal stays high.
    pub high_ticks: u32,
    /// Ticks the reference signal stays low.
    pub low_ticks: u32,
}

impl Calibration {
    /// Full reference period in ticks (`high + low`).
    #[inline]
    #[must_use]
    pub fn cycle_ticks(&self) -> i64 {
        i64::from(self.high_ticks) + i64::from(self.low_ticks)
    }

    /// `[high, low, cycle]` as stored in metadata.
    #[must_use]
    pub fn as_triple(&self) -> [i64; 3] {
        [
            i64::from(self.high_ticks),
            i64::from(self.low_ticks),
            self.cycle_ticks(),
        ]
    }
}

/// A loaded measurement: normalized events plus descriptive context.
#[derive(Debug)]
pub struct Dataset {
    events: EventStream,
    /// Descriptive metadata; may be amended after loading.
    pub meta: Metadata,
    /// Source path and retained raw payload.
    pub provenance: Provenance,
}

impl Dataset {
    /// Creates a dataset.
    #[must_use]
    pub fn new(events: EventStream, meta: Metadata, provenance: Provenance) -> Self {
        Self {
            events,
            meta,
            provenance,
        }
    }

    /// The event stream.
    #[must_use]
    pub fn events(&self) -> &EventStream {
        &self.events
    }

    /// Consumes the dataset and returns its event stream.
    #[must_use]
    pub fn into_events(self) -> EventStream {
        self.events
    }

    /// Originating path, if known.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.provenance.source.as_deref()
    }

    /// Format name recorded by the loader.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.meta.get("format").and_then(MetaValue::as_str)
    }

    /// Returns the dataset with its stream rebuilt at a new timing resolution.
    ///
    /// # Errors
    /// Returns a configuration error if the resolution is not positive.
    pub fn with_timing_resolution(mut self, seconds_per_tick: f64) -> Result<Self> {
        self.events = self.events.with_timing_resolution(seconds_per_tick)?;
        Ok(self)
    }
}
