//! Central panel: binned photon traces.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use photonscope_core::{trace_title, ChannelTrace};

use super::theme::{accent, trace_color};
use crate::app::BrowserApp;
use crate::util::u64_to_f64;

/// Plot coordinates for a trace, optionally as `log10(count + 1)`.
pub(crate) fn trace_points(trace: &ChannelTrace, log_counts: bool) -> Vec<[f64; 2]> {
    trace
        .centers_s
        .iter()
        .zip(&trace.counts)
        .map(|(&t, &c)| {
            let y = if log_counts {
                (u64_to_f64(c) + 1.0).log10()
            } else {
                u64_to_f64(c)
            };
            [t, y]
        })
        .collect()
}

impl BrowserApp {
    /// Render the trace plot for the current file.
    pub(crate) fn render_trace_view(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let source = self
                .dataset
                .as_ref()
                .and_then(|d| d.source())
                .or_else(|| self.session.current());
            ui.horizontal(|ui| {
                ui.heading(trace_title(
                    source,
                    self.session.bin_width_ms,
                    self.session.show_filename,
                ));
                if self.session.keep {
                    ui.label(egui::RichText::new("KEEP").strong().color(accent::GREEN));
                }
            });
            ui.separator();

            if self.dataset.is_none() {
                ui.centered_and_justified(|ui| {
                    if self.processing.is_loading {
                        ui.spinner();
                    } else {
                        ui.label(egui::RichText::new("No trace to show").weak());
                    }
                });
                return;
            }

            let y_label = if self.ui_state.log_counts {
                "log10(counts + 1)"
            } else {
                "counts"
            };
            let mut plot = Plot::new("trace_plot")
                .x_axis_label("time (s)")
                .y_axis_label(y_label)
                .include_y(0.0);
            if self.ui_state.show_legend {
                plot = plot.legend(Legend::default());
            }

            plot.show(ui, |plot_ui| {
                for (i, trace) in self.traces.iter().enumerate() {
                    let points = PlotPoints::from(trace_points(trace, self.ui_state.log_counts));
                    plot_ui.line(Line::new(points).name(&trace.name).color(trace_color(i)));
                }
            });
        });
    }
}
