//! Main application state and logic.
//!
//! Contains the `BrowserApp` struct which manages the browsing session,
//! the loaded dataset, its binned traces and message handling.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use eframe::egui;
use photonscope_core::{build_traces, ChannelTrace, Dataset, TraceOptions};
use photonscope_io::annotations::DEFAULT_RESULTS_FILE;
use photonscope_io::registry::path_suffix;
use photonscope_io::{Annotation, AnnotationStore, LoadOptions, LoaderRegistry};

use crate::message::AppMessage;
use crate::pipeline::{load_file_worker, LoadRequest};
use crate::state::{BrowserSession, ProcessingState, UiState};
use crate::util::format_number;

/// Main application state.
pub struct BrowserApp {
    /// Files under review and the per-file inputs.
    pub(crate) session: BrowserSession,
    /// Suffix dispatch shared with the loader thread.
    pub(crate) registry: Arc<LoaderRegistry>,
    /// Screening results.
    pub(crate) annotations: AnnotationStore,

    /// Dataset of the current file.
    pub(crate) dataset: Option<Dataset>,
    /// Binned traces of the current dataset.
    pub(crate) traces: Vec<ChannelTrace>,
    /// Bin width the cached traces were built with.
    pub(crate) traces_bin_width_ms: f64,

    /// UI display state.
    pub(crate) ui_state: UiState,
    /// Loading state.
    pub(crate) processing: ProcessingState,

    /// Message receiver for async operations.
    pub(crate) rx: Receiver<AppMessage>,
    /// Message sender for async operations.
    pub(crate) tx: Sender<AppMessage>,
}

impl BrowserApp {
    /// Creates the app for a list of files and a results CSV.
    ///
    /// An unreadable results file is reported in the status line and
    /// replaced by an empty table bound to the same path.
    pub fn new(paths: Vec<PathBuf>, results_path: Option<PathBuf>) -> Self {
        let (tx, rx) = channel();
        let results_path = results_path.unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILE));
        let mut processing = ProcessingState::default();
        let annotations = match AnnotationStore::open(&results_path) {
            Ok(store) => store,
            Err(e) => {
                processing.set_error(format!("Could not read {}: {e}", results_path.display()));
                AnnotationStore::empty(results_path)
            }
        };

        let mut app = Self {
            session: BrowserSession::new(paths),
            registry: Arc::new(LoaderRegistry::with_builtin_loaders()),
            annotations,
            dataset: None,
            traces: Vec::new(),
            traces_bin_width_ms: 0.0,
            ui_state: UiState::default(),
            processing,
            rx,
            tx,
        };
        app.enter_current();
        app
    }

    /// Replaces the file list and loads the first file.
    pub fn open_files(&mut self, paths: Vec<PathBuf>) {
        self.session.set_paths(paths);
        self.enter_current();
    }

    /// Binds the annotation table to another CSV file.
    pub fn open_results(&mut self, path: PathBuf) {
        match AnnotationStore::open(&path) {
            Ok(store) => {
                self.annotations = store;
                let stored = self.current_annotation().cloned();
                self.session.apply_annotation(stored.as_ref());
                self.processing
                    .set_status(format!("Results: {}", path.display()));
            }
            Err(e) => self
                .processing
                .set_error(format!("Could not read {}: {e}", path.display())),
        }
    }

    fn current_annotation(&self) -> Option<&Annotation> {
        let path = self.session.current()?;
        self.annotations.get(&path.display().to_string())
    }

    /// Moves to `index` (clamped) and loads it if the position changed.
    pub fn go_to(&mut self, index: usize) {
        if self.session.go_to(index) {
            self.enter_current();
        }
    }

    /// Previous file.
    pub fn prev(&mut self) {
        if self.session.prev() {
            self.enter_current();
        }
    }

    /// Next file.
    pub fn next(&mut self) {
        if self.session.next() {
            self.enter_current();
        }
    }

    /// Restores the stored review inputs of the current file and loads it.
    fn enter_current(&mut self) {
        let stored = self.current_annotation().cloned();
        self.session.apply_annotation(stored.as_ref());
        self.load_current();
    }

    /// Load the current file asynchronously.
    pub fn load_current(&mut self) {
        self.dataset = None;
        self.traces.clear();

        let Some(path) = self.session.current().map(PathBuf::from) else {
            return;
        };
        // Self-describing formats keep the resolution stored in the file.
        let mut options = LoadOptions::default();
        if matches!(path_suffix(&path).as_str(), "" | ".bin") {
            match self.session.timing_resolution() {
                Some(resolution) => options.timing_resolution = Some(resolution),
                None => {
                    self.processing
                        .fail_request("Timing resolution must be a positive number".to_string());
                    return;
                }
            }
        }

        let request = LoadRequest {
            generation: self.processing.begin_load(),
            path,
            options,
        };
        let registry = Arc::clone(&self.registry);
        let tx = self.tx.clone();
        thread::spawn(move || load_file_worker(&registry, request, &tx));
    }

    /// Writes the current file's annotation and rewrites the CSV.
    pub fn save_annotation(&mut self) {
        // Any loaded dataset belongs to the current file.
        let applied = self
            .dataset
            .as_ref()
            .and_then(|d| d.events().timing_resolution());
        let Some(annotation) = self.session.annotation(applied) else {
            return;
        };
        self.annotations.upsert(annotation);
        match self.annotations.save() {
            Ok(()) => {
                let status = format!(
                    "{} - saved to {}",
                    self.position_text(),
                    self.annotations.path().display()
                );
                self.processing.set_status(status);
            }
            Err(e) => self.processing.set_error(format!("Save failed: {e}")),
        }
    }

    /// Saves, then moves to the next file.
    pub fn save_and_next(&mut self) {
        self.save_annotation();
        self.next();
    }

    /// `i/n - path` for the status line.
    pub(crate) fn position_text(&self) -> String {
        match self.session.current() {
            Some(path) => format!(
                "{}/{} - {}",
                self.session.index() + 1,
                self.session.len(),
                path.display()
            ),
            None => "No files".to_string(),
        }
    }

    /// Rebuilds the traces if the bin width changed since the last build.
    pub(crate) fn refresh_traces(&mut self) {
        #[allow(clippy::float_cmp)]
        let stale = self.traces_bin_width_ms != self.session.bin_width_ms;
        if stale {
            self.rebuild_traces();
        }
    }

    fn rebuild_traces(&mut self) {
        self.traces_bin_width_ms = self.session.bin_width_ms;
        let Some(dataset) = &self.dataset else {
            self.traces.clear();
            return;
        };
        let options = TraceOptions::default().with_bin_width_ms(self.session.bin_width_ms);
        match build_traces(dataset.events(), &options) {
            Ok(traces) => self.traces = traces,
            Err(e) => {
                self.traces.clear();
                self.processing.set_error(format!("Error: {e}"));
            }
        }
    }

    /// Handle pending messages from async workers.
    pub fn handle_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                AppMessage::LoadComplete(generation, dataset, dur) => {
                    if !self.processing.is_current(generation) {
                        continue;
                    }
                    let status = format!(
                        "{} - {} photons in {:.2}s",
                        self.position_text(),
                        format_number(dataset.events().len()),
                        dur.as_secs_f64()
                    );
                    self.processing.set_status(status);
                    self.dataset = Some(*dataset);
                    self.rebuild_traces();
                }
                AppMessage::LoadError(generation, path, e) => {
                    if !self.processing.is_current(generation) {
                        continue;
                    }
                    self.processing
                        .set_error(format!("Error: {e} ({})", path.display()));
                }
            }
        }
    }
}

impl eframe::App for BrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        crate::ui::theme::apply_system_theme(ctx);
        self.handle_messages();
        self.handle_shortcuts(ctx);
        self.refresh_traces();
        self.render_top_panel(ctx);
        self.render_bottom_panel(ctx);
        self.render_side_panel(ctx);
        self.render_trace_view(ctx);

        if self.processing.is_loading {
            ctx.request_repaint();
        }
    }
}
