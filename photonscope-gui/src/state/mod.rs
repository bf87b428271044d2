//! Application state modules.

mod processing;
mod session;
mod ui;

pub use processing::ProcessingState;
pub use session::{BrowserSession, BIN_WIDTH_OPTIONS_MS, NI_BINARY_HINT};
pub use ui::UiState;
