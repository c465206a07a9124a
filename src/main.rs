mod app;
mod color;
mod state;
mod ui;

use app::RustyForestApp;
use eframe::egui;
use rusty_forest::config::WorkflowConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match WorkflowConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("ignoring config: {e:#}");
            WorkflowConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Forest – Iris Workflow",
        options,
        Box::new(|_cc| Ok(Box::new(RustyForestApp::new(config)))),
    )
}
