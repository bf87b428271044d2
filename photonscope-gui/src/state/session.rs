//! Browsing session: the file list, the cursor into it and the per-file
//! review inputs that end up in the annotation CSV.

use std::path::{Path, PathBuf};

use photonscope_io::loaders::DEFAULT_TIMING_RESOLUTION;
use photonscope_io::registry::path_suffix;
use photonscope_io::Annotation;

/// Selectable bin widths in milliseconds.
pub const BIN_WIDTH_OPTIONS_MS: [f64; 7] = [1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0];

/// Loader hint recorded for files without a suffix.
pub const NI_BINARY_HINT: &str = "ni_binary";

/// Review state for a list of files.
pub struct BrowserSession {
    paths: Vec<PathBuf>,
    index: usize,
    /// Current bin width in milliseconds.
    pub bin_width_ms: f64,
    /// Timing resolution as typed by the user.
    pub timing_resolution_text: String,
    /// Whether to show the file name in the plot title.
    pub show_filename: bool,
    /// Keep flag for the current file.
    pub keep: bool,
    /// Note for the current file.
    pub note: String,
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl BrowserSession {
    /// Creates a session positioned at the first file.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            index: 0,
            bin_width_ms: 10.0,
            timing_resolution_text: format!("{DEFAULT_TIMING_RESOLUTION:e}"),
            show_filename: true,
            keep: false,
            note: String::new(),
        }
    }

    /// Replaces the file list and moves to the first file.
    pub fn set_paths(&mut self, paths: Vec<PathBuf>) {
        self.paths = paths;
        self.index = 0;
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if there are no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Current position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current file, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.paths.get(self.index).map(PathBuf::as_path)
    }

    /// Clamps an index into `[0, len - 1]` (0 for an empty list).
    #[must_use]
    pub fn clamp(&self, index: isize) -> usize {
        let last = self.paths.len().saturating_sub(1);
        usize::try_from(index).map_or(0, |i| i.min(last))
    }

    /// Moves to `index` (clamped). Returns true if the position changed.
    pub fn go_to(&mut self, index: usize) -> bool {
        let target = self.clamp(isize::try_from(index).unwrap_or(isize::MAX));
        let changed = target != self.index;
        self.index = target;
        changed
    }

    /// Moves one file back. Returns true if the position changed.
    pub fn prev(&mut self) -> bool {
        self.go_to(self.index.saturating_sub(1))
    }

    /// Moves one file forward. Returns true if the position changed.
    pub fn next(&mut self) -> bool {
        self.go_to(self.index.saturating_add(1))
    }

    /// Parsed timing resolution, if the text is a positive finite number.
    #[must_use]
    pub fn timing_resolution(&self) -> Option<f64> {
        self.timing_resolution_text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Loader hint for a path: files without a suffix are NI binary.
    #[must_use]
    pub fn loader_hint(path: &Path) -> &'static str {
        if path_suffix(path).is_empty() {
            NI_BINARY_HINT
        } else {
            ""
        }
    }

    /// Loads keep/note from a stored annotation, or resets them.
    pub fn apply_annotation(&mut self, annotation: Option<&Annotation>) {
        match annotation {
            Some(a) => {
                self.keep = a.keep;
                self.note.clone_from(&a.note);
            }
            None => {
                self.keep = false;
                self.note.clear();
            }
        }
    }

    /// Annotation row for the current file.
    ///
    /// `applied_resolution` is the resolution of the loaded dataset; when
    /// absent the typed value is recorded.
    #[must_use]
    pub fn annotation(&self, applied_resolution: Option<f64>) -> Option<Annotation> {
        let path = self.current()?;
        let resolution = applied_resolution
            .or_else(|| self.timing_resolution())
            .unwrap_or(f64::NAN);
        Some(
            Annotation::new(
                path.display().to_string(),
                self.keep,
                self.bin_width_ms,
                resolution,
            )
            .with_note(self.note.clone())
            .with_loader_hint(Self::loader_hint(path)),
        )
    }
}
