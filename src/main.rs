mod app;
mod ui;

use eframe::egui;

use vibecheck::config::AppConfig;

use crate::app::VibeApp;

fn main() -> eframe::Result {
    // Read `.env` before the logger so it can carry RUST_LOG.
    let dotenv = dotenv::dotenv();
    env_logger::init();
    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) => log::debug!("No .env loaded: {}", e),
    }

    let config = AppConfig::from_env();
    log::info!(
        "VibeCheck starting (model {}, GPU {})",
        config.model,
        if config.prefer_gpu { "preferred" } else { "disabled" }
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([360.0, 560.0])
            .with_title("VibeCheck"),
        ..Default::default()
    };

    eframe::run_native(
        "VibeCheck",
        options,
        Box::new(move |cc| Ok(Box::new(VibeApp::new(cc, config)))),
    )
}
