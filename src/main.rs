#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod ui;

use commesse_gantt::config::{AppPaths, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    let paths = AppPaths::discover();
    let settings = Settings::load_from(&paths.settings_file());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!(config = %paths.config_dir.display(), "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Commesse Gantt"),
        ..Default::default()
    };

    eframe::run_native(
        "Commesse Gantt",
        options,
        Box::new(|cc| Ok(Box::new(app::GanttApp::new(cc, settings, paths)))),
    )
}
