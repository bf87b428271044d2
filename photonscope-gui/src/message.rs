//! Application message types for async communication.
//!
//! Messages are sent from the background loader thread to the main UI
//! thread via a channel to report completion and errors.

use std::path::PathBuf;
use std::time::Duration;

use photonscope_core::Dataset;

/// Messages sent from background workers to the UI thread.
pub enum AppMessage {
    /// File loading completed successfully.
    ///
    /// Contains:
    /// - `u64`: Load generation the result belongs to
    /// - `Dataset`: Loaded photon data
    /// - `Duration`: Time taken to load
    LoadComplete(u64, Box<Dataset>, Duration),

    /// File loading failed.
    LoadError(u64, PathBuf, String),
}
