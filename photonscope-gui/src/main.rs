//! Photonscope browser entry point.
//!
//! Usage: `photonscope-gui [--results <csv>] [FILES...]`

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod message;
mod pipeline;
mod state;
mod ui;
mod util;

use std::path::PathBuf;

use app::BrowserApp;
use eframe::egui;

/// Splits the command line into data files and an optional results CSV.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> (Vec<PathBuf>, Option<PathBuf>) {
    let mut paths = Vec::new();
    let mut results = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--results" {
            results = args.next().map(PathBuf::from);
        } else {
            paths.push(PathBuf::from(arg));
        }
    }
    (paths, results)
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let (paths, results) = parse_args(std::env::args().skip(1));
    log::info!("browsing {} files", paths.len());

    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Photonscope",
        opts,
        Box::new(|cc| {
            ui::theme::configure_style(&cc.egui_ctx);
            Ok(Box::new(BrowserApp::new(paths, results)))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = ["a.bin", "--results", "out.csv", "b.h5"].map(String::from);
        let (paths, results) = parse_args(args);
        assert_eq!(paths, vec![PathBuf::from("a.bin"), PathBuf::from("b.h5")]);
        assert_eq!(results, Some(PathBuf::from("out.csv")));
    }
}
