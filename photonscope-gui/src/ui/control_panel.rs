//! Control panel (left sidebar) and top/bottom bars rendering.

use eframe::egui;
use rfd::FileDialog;

use super::theme::{
    accent, form_label, primary_button, secondary_button, section_header, stat_label, stat_value,
    Palette,
};
use crate::app::BrowserApp;
use crate::state::BIN_WIDTH_OPTIONS_MS;
use crate::util::{format_number, format_seconds};

const FILE_FILTER_EXTENSIONS: [&str; 5] = ["bin", "spc", "h5", "hdf5", "hdf"];

impl BrowserApp {
    /// Render the top bar with branding, file actions and the current file.
    pub(crate) fn render_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.set_min_height(36.0);
            ui.horizontal_centered(|ui| {
                let colors = Palette::from_ui(ui);
                ui.label(
                    egui::RichText::new("PHOTONSCOPE")
                        .size(14.0)
                        .strong()
                        .color(accent::BLUE),
                );
                ui.label(egui::RichText::new("│").color(colors.text_muted));

                let idle = !self.processing.is_loading;
                if ui
                    .add_enabled(idle, secondary_button(ui, "Open files"))
                    .on_hover_text("Pick one or more photon files")
                    .clicked()
                {
                    if let Some(paths) = FileDialog::new()
                        .add_filter("Photon data", &FILE_FILTER_EXTENSIONS)
                        .add_filter("All files", &["*"])
                        .pick_files()
                    {
                        self.open_files(paths);
                    }
                }

                if ui
                    .add(secondary_button(ui, "Results CSV"))
                    .on_hover_text(self.annotations.path().display().to_string())
                    .clicked()
                {
                    if let Some(path) = FileDialog::new()
                        .add_filter("CSV", &["csv"])
                        .set_file_name(
                            photonscope_io::annotations::DEFAULT_RESULTS_FILE.to_string(),
                        )
                        .save_file()
                    {
                        self.open_results(path);
                    }
                }

                ui.label(egui::RichText::new("│").color(colors.text_muted));
                ui.label(egui::RichText::new(self.position_text()).color(colors.text_muted));
            });
        });
    }

    /// Render the status bar.
    pub(crate) fn render_bottom_panel(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.processing.is_loading {
                    ui.spinner();
                }
                let color = if self.processing.is_error {
                    accent::RED
                } else {
                    Palette::from_ui(ui).text_muted
                };
                ui.label(egui::RichText::new(&self.processing.status_text).color(color));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} annotated",
                            format_number(self.annotations.len())
                        ))
                        .color(Palette::from_ui(ui).text_muted),
                    );
                });
            });
        });
    }

    /// Render the left control panel.
    pub(crate) fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("ctrl")
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        Self::render_section(ui, "Navigation", true, |ui| {
                            self.render_navigation(ui);
                        });
                        Self::render_section(ui, "Display", true, |ui| {
                            self.render_display_options(ui);
                        });
                        Self::render_section(ui, "Review", true, |ui| {
                            self.render_review(ui);
                        });
                        Self::render_section(ui, "File", false, |ui| {
                            self.render_file_info(ui);
                        });
                    });
            });
    }

    fn render_section(
        ui: &mut egui::Ui,
        title: &str,
        default_open: bool,
        content: impl FnOnce(&mut egui::Ui),
    ) {
        egui::CollapsingHeader::new(section_header(title))
            .id_salt(title)
            .default_open(default_open)
            .show(ui, |ui| {
                ui.add_space(4.0);
                content(ui);
                ui.add_space(8.0);
            });
    }

    fn render_navigation(&mut self, ui: &mut egui::Ui) {
        if self.session.is_empty() {
            ui.label(egui::RichText::new("No files open").weak());
            return;
        }

        ui.horizontal(|ui| {
            let at_start = self.session.index() == 0;
            let at_end = self.session.index() + 1 >= self.session.len();
            if ui.add_enabled(!at_start, egui::Button::new("◀ Prev")).clicked() {
                self.prev();
            }
            if ui.add_enabled(!at_end, egui::Button::new("Next ▶")).clicked() {
                self.next();
            }
        });

        let mut index = self.session.index();
        let last = self.session.len() - 1;
        let slider = egui::Slider::new(&mut index, 0..=last).custom_formatter(|v, _| {
            format!("{:.0}", v + 1.0)
        });
        if ui.add(slider).changed() {
            self.go_to(index);
        }
    }

    fn render_display_options(&mut self, ui: &mut egui::Ui) {
        ui.label(form_label("Bin width"));
        egui::ComboBox::from_id_salt("bin_width_select")
            .selected_text(format!("{} ms", self.session.bin_width_ms))
            .show_ui(ui, |ui| {
                for width in BIN_WIDTH_OPTIONS_MS {
                    ui.selectable_value(
                        &mut self.session.bin_width_ms,
                        width,
                        format!("{width} ms"),
                    );
                }
            });

        ui.add_space(6.0);
        ui.label(form_label("Timing resolution (s/tick)"));
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.session.timing_resolution_text)
                    .desired_width(110.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Reload").clicked() || submitted {
                self.load_current();
            }
        });
        if self.session.timing_resolution().is_none() {
            ui.label(egui::RichText::new("Enter a positive number").color(accent::RED));
        }

        ui.add_space(6.0);
        ui.checkbox(&mut self.session.show_filename, "Filename in title");
        ui.checkbox(&mut self.ui_state.log_counts, "Log counts");
        ui.checkbox(&mut self.ui_state.show_legend, "Legend");
    }

    fn render_review(&mut self, ui: &mut egui::Ui) {
        let has_file = self.session.current().is_some();

        ui.add_enabled(has_file, egui::Checkbox::new(&mut self.session.keep, "Keep"));
        ui.add_space(4.0);
        ui.label(form_label("Note"));
        ui.add_enabled(
            has_file,
            egui::TextEdit::multiline(&mut self.session.note)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(has_file, secondary_button(ui, "Save"))
                .clicked()
            {
                self.save_annotation();
            }
            if ui
                .add_enabled(has_file, primary_button("Save & next"))
                .clicked()
            {
                self.save_and_next();
            }
        });
    }

    fn render_file_info(&self, ui: &mut egui::Ui) {
        let Some(dataset) = &self.dataset else {
            ui.label(egui::RichText::new("Nothing loaded").weak());
            return;
        };
        let events = dataset.events();

        egui::Grid::new("file_info")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(stat_label("Photons"));
                ui.label(stat_value(&format_number(events.len())));
                ui.end_row();

                ui.label(stat_label("Resolution"));
                let resolution = events
                    .timing_resolution()
                    .map_or_else(|| "unset".to_string(), |r| format!("{r:e} s"));
                ui.label(stat_value(&resolution));
                ui.end_row();

                if let Some(resolution) = events.timing_resolution() {
                    #[allow(clippy::cast_precision_loss)]
                    let duration = events.duration_ticks() as f64 * resolution;
                    ui.label(stat_label("Duration"));
                    ui.label(stat_value(&format_seconds(duration)));
                    ui.end_row();
                }

                for (key, value) in dataset.meta.iter() {
                    ui.label(stat_label(key));
                    ui.label(stat_value(&value.to_string()));
                    ui.end_row();
                }
            });
    }

    /// Arrow keys browse files when no text field has focus.
    pub(crate) fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if left {
            self.prev();
        } else if right {
            self.next();
        }
    }
}

