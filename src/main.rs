mod app;
mod color;
mod config;
mod data;
/// One full pass from raw rows to everything the dashboard draws.
/// `render` is pure: the UI calls it again after every interaction and
/// nothing is carried over between calls.
mod pipeline;
/// Presentation adapter: turns an aggregate snapshot and the filtered table into
/// the literal inputs of the tiles, charts, data preview and CSV export.
/// Only field mapping and formatting live here.
mod present;
mod state;
mod ui;

use app::SalesDashboardApp;
use clap::Parser;
use config::Config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::parse();
    log::info!("Starting dashboard for {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Performance Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SalesDashboardApp::new(config)))),
    )
}
