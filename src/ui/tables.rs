use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_forest::data::model::Dataset;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Data tab
// ---------------------------------------------------------------------------

fn dataset_table(ui: &mut Ui, id: &str, dataset: &Dataset, max_rows: usize, state: &AppState) {
    let rows = dataset.len().min(max_rows);
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(260.0)
            .column(Column::auto().at_least(40.0))
            .columns(Column::auto().at_least(80.0), dataset.n_features())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong(".row");
                });
                for name in &dataset.feature_names {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
                header.col(|ui| {
                    ui.strong(&dataset.label_name);
                });
            })
            .body(|body| {
                body.rows(18.0, rows, |mut row| {
                    let obs = &dataset.rows[row.index()];
                    row.col(|ui| {
                        ui.label((obs.id + 1).to_string());
                    });
                    for v in &obs.features {
                        row.col(|ui| {
                            ui.monospace(format!("{v:.3}"));
                        });
                    }
                    row.col(|ui| {
                        let color = state.class_colors.color_for(obs.label);
                        ui.label(RichText::new(dataset.class_name(obs.label)).color(color));
                    });
                });
            });
    });
}

/// Source table plus the baked training and testing sets of the last run.
pub fn data_view(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading(format!("Source ({} rows)", state.dataset.len()));
        dataset_table(ui, "source", &state.dataset, state.dataset.len(), state);

        let Some(report) = &state.report else {
            return;
        };
        ui.add_space(12.0);
        ui.heading(format!("Baked training set ({} rows)", report.baked_train().len()));
        ui.label(report.recipe.to_string());
        dataset_table(ui, "baked_train", report.baked_train(), usize::MAX, state);

        ui.add_space(12.0);
        ui.heading(format!("Baked testing set ({} rows)", report.baked_test.len()));
        dataset_table(ui, "baked_test", &report.baked_test, usize::MAX, state);
    });
}

// ---------------------------------------------------------------------------
// Metrics tab
// ---------------------------------------------------------------------------

/// Metric table across engines, then confusion matrix and importance per engine.
pub fn metrics_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Run the workflow to see metrics");
        });
        return;
    };
    let classes = &report.dataset.classes;

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.heading("Test-set metrics");
        egui::Grid::new("metrics_grid")
            .striped(true)
            .num_columns(report.models.len() + 1)
            .show(ui, |ui: &mut Ui| {
                ui.strong(".metric");
                for model in &report.models {
                    ui.strong(model.engine.to_string());
                }
                ui.end_row();

                if let Some(first) = report.models.first() {
                    for (row, (name, _)) in first.evaluation.metric_rows().iter().enumerate() {
                        ui.label(*name);
                        for model in &report.models {
                            let value = model.evaluation.metric_rows()[row].1;
                            ui.monospace(format!("{value:.4}"));
                        }
                        ui.end_row();
                    }
                }
            });

        for model in &report.models {
            ui.add_space(12.0);
            ui.heading(format!("{} forest", model.engine));
            ui.columns(2, |cols| {
                cols[0].strong("Confusion matrix (truth × prediction)");
                egui::Grid::new(format!("confusion_{}", model.engine))
                    .striped(true)
                    .show(&mut cols[0], |ui: &mut Ui| {
                        ui.label("");
                        for (k, class) in classes.iter().enumerate() {
                            ui.label(RichText::new(class).color(state.class_colors.color_for(k)));
                        }
                        ui.end_row();
                        for (t, counts) in model.evaluation.confusion.counts.iter().enumerate() {
                            ui.label(RichText::new(&classes[t]).color(state.class_colors.color_for(t)));
                            for (p, count) in counts.iter().enumerate() {
                                let text = RichText::new(count.to_string()).monospace();
                                ui.label(if p == t { text.strong() } else { text });
                            }
                            ui.end_row();
                        }
                    });

                match &model.importance {
                    Some(importance) => {
                        cols[1].strong("Variable importance (Gini)");
                        for (name, value) in importance {
                            cols[1].add(
                                egui::ProgressBar::new(*value as f32)
                                    .text(format!("{name}: {value:.3}")),
                            );
                        }
                    }
                    None => {
                        cols[1].label("Variable importance not tracked by this engine.");
                    }
                }
            });
        }
    });
}
