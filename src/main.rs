mod app;
mod config;
mod error;
mod upload;
mod utils;

use app::SkuFilterApp;
use config::Config;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn tracing_init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), eframe::Error> {
    tracing_init();

    let config = Config::default();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "Excel SKU Filter",
        options,
        Box::new(move |cc| Box::new(SkuFilterApp::new(cc, config))),
    )
}
