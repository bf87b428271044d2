//! UI rendering modules.
//!
//! - `control_panel`: top bar, status bar and the left sidebar
//! - `trace_view`: central trace plot
//! - `theme`: palettes and widget styling

mod control_panel;
pub mod theme;
mod trace_view;
