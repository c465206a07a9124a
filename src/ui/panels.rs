use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rusty_forest::data::{iris, loader};
use rusty_forest::model::Engine;

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – run settings
// ---------------------------------------------------------------------------

/// Render the settings panel: split, recipe and forest knobs plus "Run".
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Workflow");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Split");
            ui.add(
                egui::Slider::new(&mut state.config.split_prop, 0.1..=0.9)
                    .step_by(0.05)
                    .text("train share"),
            );
            ui.checkbox(&mut state.config.stratify, "Stratify by class");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Seed");
                ui.add(
                    egui::TextEdit::singleline(&mut state.seed_text)
                        .hint_text("random")
                        .desired_width(100.0),
                );
            });
            ui.separator();

            ui.strong("Recipe");
            ui.add(
                egui::Slider::new(&mut state.config.corr_threshold, 0.5..=1.0)
                    .step_by(0.01)
                    .text("corr threshold"),
            );
            ui.label("then center + scale all predictors");
            ui.separator();

            ui.strong("Random forest");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Trees");
                ui.add(egui::DragValue::new(&mut state.config.trees).range(1..=2000));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Min node size");
                ui.add(egui::DragValue::new(&mut state.config.min_node_size).range(1..=50));
            });
            for engine in Engine::ALL {
                let mut enabled = state.config.engines.contains(&engine);
                if ui.checkbox(&mut enabled, format!("Engine: {engine}")).changed() {
                    if enabled {
                        state.config.engines.push(engine);
                        state.config.engines.sort();
                    } else {
                        state.config.engines.retain(|e| *e != engine);
                    }
                }
            }
            ui.separator();

            if ui.button(RichText::new("▶ Run").strong()).clicked() {
                state.run();
            }

            if let Some(report) = &state.report {
                ui.add_space(6.0);
                ui.label(format!("Last run seed: {}", report.seed));
                ui.label(format!(
                    "Split: {} train / {} test",
                    report.split.train_ids.len(),
                    report.split.test_ids.len()
                ));
                let removed = report.recipe.removed_columns();
                if !removed.is_empty() {
                    ui.label(format!("Removed: {}", removed.join(", ")));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Tabs above the central panel
// ---------------------------------------------------------------------------

pub fn view_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for view in View::ALL {
            ui.selectable_value(&mut state.view, view, view.label());
        }

        if matches!(state.view, View::Roc | View::Gain) {
            ui.separator();
            let engines: Vec<Engine> = state
                .report
                .as_ref()
                .map(|r| r.models.iter().map(|m| m.engine).collect())
                .unwrap_or_default();
            egui::ComboBox::from_id_salt("engine")
                .selected_text(state.selected_engine.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for engine in engines {
                        ui.selectable_value(&mut state.selected_engine, engine, engine.to_string());
                    }
                });
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Use built-in iris").clicked() {
                state.set_dataset(iris::dataset(), "built-in iris".to_string());
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{}: {} rows, {} predictors, {} classes",
            state.source,
            state.dataset.len(),
            state.dataset.n_features(),
            state.dataset.classes.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open labelled table")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_file(&path, state.config.label_column.as_deref()) {
            Ok(dataset) => {
                let source = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                state.set_dataset(dataset, source);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
