//! UI state for view options.

/// Plot display toggles.
pub struct UiState {
    /// Whether to use log scale for the count axis.
    pub log_counts: bool,
    /// Whether to draw the plot legend.
    pub show_legend: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            log_counts: false,
            show_legend: true,
        }
    }
}
