use eframe::egui;

use rusty_forest::config::WorkflowConfig;

use crate::state::{AppState, View};
use crate::ui::{heatmap, panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyForestApp {
    pub state: AppState,
}

impl RustyForestApp {
    /// Start with the built-in dataset and run once so every tab has content.
    pub fn new(config: WorkflowConfig) -> Self {
        let mut state = AppState::new(config);
        state.run();
        Self { state }
    }
}

impl eframe::App for RustyForestApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: run settings ----
        egui::SidePanel::left("settings_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabbed results ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::view_tabs(ui, &mut self.state);
            ui.separator();
            match self.state.view {
                View::Data => tables::data_view(ui, &self.state),
                View::Correlation => heatmap::correlation_view(ui, &self.state),
                View::Metrics => tables::metrics_view(ui, &self.state),
                View::Roc => plot::roc_plot(ui, &self.state),
                View::Gain => plot::gain_plot(ui, &self.state),
            }
        });
    }
}
