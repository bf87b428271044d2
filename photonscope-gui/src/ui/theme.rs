//! Application theme and color definitions.
//!
//! Light and dark palettes with monospace fonts, following the system
//! preference, plus the line colors used for detector traces.

use std::sync::atomic::{AtomicBool, Ordering};

use eframe::egui::{
    self, Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Theme, Visuals,
};

/// Shared accent colors (same for both themes).
pub mod accent {
    use eframe::egui::Color32;

    pub const BLUE: Color32 = Color32::from_rgb(0x4a, 0x9e, 0xff);
    pub const GREEN: Color32 = Color32::from_rgb(0x10, 0xb9, 0x81);
    pub const RED: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
}

/// Line colors cycled across detector channels.
const TRACE_COLORS: [Color32; 6] = [
    Color32::from_rgb(0x4a, 0x9e, 0xff),
    Color32::from_rgb(0xef, 0x44, 0x44),
    Color32::from_rgb(0x10, 0xb9, 0x81),
    Color32::from_rgb(0xf5, 0x9e, 0x0b),
    Color32::from_rgb(0xa8, 0x55, 0xf7),
    Color32::from_rgb(0x06, 0xb6, 0xd4),
];

/// Surface and text colors for one theme.
#[derive(Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color32,
    pub bg_panel: Color32,
    pub bg_input: Color32,
    pub border: Color32,
    pub border_light: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub button_hover: Color32,
}

impl Palette {
    pub const DARK: Self = Self {
        bg_dark: Color32::from_rgb(0x1a, 0x1a, 0x1a),
        bg_panel: Color32::from_rgb(0x1f, 0x1f, 0x1f),
        bg_input: Color32::from_rgb(0x2a, 0x2a, 0x2a),
        border: Color32::from_rgb(0x33, 0x33, 0x33),
        border_light: Color32::from_rgb(0x44, 0x44, 0x44),
        text_primary: Color32::from_rgb(0xe0, 0xe0, 0xe0),
        text_muted: Color32::from_rgb(0x88, 0x88, 0x88),
        button_hover: Color32::from_rgb(0x3a, 0x3a, 0x3a),
    };

    pub const LIGHT: Self = Self {
        bg_dark: Color32::from_rgb(0xf5, 0xf5, 0xf5),
        bg_panel: Color32::from_rgb(0xff, 0xff, 0xff),
        bg_input: Color32::from_rgb(0xf0, 0xf0, 0xf0),
        border: Color32::from_rgb(0xd0, 0xd0, 0xd0),
        border_light: Color32::from_rgb(0xc0, 0xc0, 0xc0),
        text_primary: Color32::from_rgb(0x1a, 0x1a, 0x1a),
        text_muted: Color32::from_rgb(0x66, 0x66, 0x66),
        button_hover: Color32::from_rgb(0xdd, 0xdd, 0xdd),
    };

    /// Palette for the current theme of a UI.
    pub fn from_ui(ui: &egui::Ui) -> Self {
        Self::for_dark_mode(ui.visuals().dark_mode)
    }

    /// Palette for a dark-mode flag.
    pub fn for_dark_mode(is_dark: bool) -> Self {
        if is_dark {
            Self::DARK
        } else {
            Self::LIGHT
        }
    }
}

/// Line color for the `index`-th trace.
pub fn trace_color(index: usize) -> Color32 {
    TRACE_COLORS[index % TRACE_COLORS.len()]
}

/// Configure egui style for the given theme.
pub fn configure_style_for_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Dark => build_visuals(Visuals::dark(), Palette::DARK, 0.3),
        Theme::Light => build_visuals(Visuals::light(), Palette::LIGHT, 0.2),
    };
    ctx.set_visuals(visuals);
    configure_fonts_and_spacing(ctx);
}

/// Configure style based on current visuals (dark/light mode).
pub fn configure_style(ctx: &egui::Context) {
    let theme = if ctx.style().visuals.dark_mode {
        Theme::Dark
    } else {
        Theme::Light
    };
    configure_style_for_theme(ctx, theme);
}

fn build_visuals(mut visuals: Visuals, p: Palette, selection_alpha: f32) -> Visuals {
    visuals.window_fill = p.bg_panel;
    visuals.panel_fill = p.bg_panel;
    visuals.faint_bg_color = p.bg_dark;
    visuals.extreme_bg_color = p.bg_input;

    let rounding = Rounding::same(4.0);
    let widgets = &mut visuals.widgets;

    widgets.noninteractive.bg_fill = p.bg_input;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, p.text_muted);
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, p.border);
    widgets.noninteractive.rounding = rounding;

    for state in [&mut widgets.inactive, &mut widgets.open] {
        state.bg_fill = p.bg_input;
        state.fg_stroke = Stroke::new(1.0, p.text_primary);
        state.bg_stroke = Stroke::new(1.0, p.border_light);
        state.rounding = rounding;
    }

    widgets.hovered.bg_fill = p.button_hover;
    widgets.hovered.fg_stroke = Stroke::new(1.0, p.text_primary);
    widgets.hovered.bg_stroke = Stroke::new(1.0, accent::BLUE);
    widgets.hovered.rounding = rounding;

    widgets.active.bg_fill = accent::BLUE;
    widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    widgets.active.bg_stroke = Stroke::new(1.0, accent::BLUE);
    widgets.active.rounding = rounding;

    visuals.selection.bg_fill = accent::BLUE.gamma_multiply(selection_alpha);
    visuals.selection.stroke = Stroke::new(1.0, accent::BLUE);
    visuals
}

fn configure_fonts_and_spacing(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.text_styles = [
        (TextStyle::Small, FontId::new(10.0, FontFamily::Monospace)),
        (TextStyle::Body, FontId::new(12.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(12.0, FontFamily::Monospace)),
        (TextStyle::Heading, FontId::new(14.0, FontFamily::Monospace)),
        (
            TextStyle::Monospace,
            FontId::new(12.0, FontFamily::Monospace),
        ),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.spacing.indent = 16.0;

    ctx.set_style(style);
}

/// Style a button as the primary action button.
pub fn primary_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(egui::RichText::new(text).color(Color32::WHITE))
        .fill(accent::GREEN)
        .rounding(Rounding::same(4.0))
}

/// Style a button as a secondary button for the current theme.
pub fn secondary_button<'a>(ui: &egui::Ui, text: &'a str) -> egui::Button<'a> {
    let p = Palette::from_ui(ui);
    egui::Button::new(egui::RichText::new(text).color(p.text_primary))
        .fill(p.bg_input)
        .stroke(Stroke::new(1.0, p.border_light))
        .rounding(Rounding::same(4.0))
}

/// Create a section header label.
pub fn section_header(text: &str) -> egui::RichText {
    egui::RichText::new(text.to_uppercase()).size(11.0).strong()
}

/// Create a form label.
pub fn form_label(text: &str) -> egui::RichText {
    egui::RichText::new(text.to_uppercase()).size(10.0)
}

/// Create a stat label (left column).
pub fn stat_label(text: &str) -> egui::RichText {
    egui::RichText::new(text).size(11.0).weak()
}

/// Create a stat value (right column).
pub fn stat_value(text: &str) -> egui::RichText {
    egui::RichText::new(text).size(11.0)
}

static LAST_DARK_MODE: AtomicBool = AtomicBool::new(true);
static THEME_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Re-applies styles when the system theme changed since the last frame.
pub fn apply_system_theme(ctx: &egui::Context) {
    let is_dark = ctx.style().visuals.dark_mode;
    let was_initialized = THEME_INITIALIZED.swap(true, Ordering::Relaxed);
    let last_dark = LAST_DARK_MODE.swap(is_dark, Ordering::Relaxed);

    if !was_initialized || last_dark != is_dark {
        let theme = if is_dark { Theme::Dark } else { Theme::Light };
        configure_style_for_theme(ctx, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_colors_cycle() {
        assert_eq!(trace_color(0), trace_color(TRACE_COLORS.len()));
        assert_ne!(trace_color(0), trace_color(1));
    }
}
