use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod models;
mod services;
mod ui;
mod utils;

use config::ViewerConfig;

fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pointmap=debug".parse().unwrap()),
        )
        .with_target(true)
        .init();

    info!("Starting pointmap viewer...");

    let config = ViewerConfig::from_env();
    info!("Points source: {}", config.points_source);
    info!("Tile layer: {}", config.tile_url);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return;
        }
    };
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("pointmap"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "pointmap",
        options,
        Box::new(move |cc| Ok(Box::new(ui::ViewerApp::new(cc, config, handle)))),
    ) {
        error!("UI error: {}", e);
    }
}
