//! Processing state for background loads.

/// Tracks the state of the background loader.
pub struct ProcessingState {
    /// Whether a file is currently being loaded.
    pub is_loading: bool,
    /// Generation of the most recent load request; older results are dropped.
    pub generation: u64,
    /// User-facing status message.
    pub status_text: String,
    /// Whether the status message reports a failure.
    pub is_error: bool,
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self {
            is_loading: false,
            generation: 0,
            status_text: "Ready".to_string(),
            is_error: false,
        }
    }
}

impl ProcessingState {
    /// Marks a new load as started and returns its generation.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.is_loading = true;
        self.is_error = false;
        self.status_text = "Loading file...".to_string();
        self.generation
    }

    /// Drops any load in flight and records a failure.
    pub fn fail_request(&mut self, text: String) {
        self.generation += 1;
        self.set_error(text);
    }

    /// Returns true if `generation` belongs to the latest request.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Records a successful status line.
    pub fn set_status(&mut self, text: String) {
        self.is_loading = false;
        self.is_error = false;
        self.status_text = text;
    }

    /// Records a failure status line.
    pub fn set_error(&mut self, text: String) {
        self.is_loading = false;
        self.is_error = true;
        self.status_text = text;
    }
}
