use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints};

use crate::state::AppState;

fn no_results(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Run the workflow to see curves");
    });
}

// ---------------------------------------------------------------------------
// ROC curve (one-vs-all per class)
// ---------------------------------------------------------------------------

/// Sensitivity against 1 - specificity for each class of the selected engine.
pub fn roc_plot(ui: &mut Ui, state: &AppState) {
    let Some(model) = state.selected_model() else {
        no_results(ui);
        return;
    };
    let evaluation = &model.evaluation;

    Plot::new("roc_plot")
        .legend(Legend::default())
        .x_axis_label("1 - specificity")
        .y_axis_label("sensitivity")
        .data_aspect(1.0)
        .include_x(0.0)
        .include_x(1.0)
        .include_y(0.0)
        .include_y(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let chance: PlotPoints = vec![[0.0, 0.0], [1.0, 1.0]].into();
            plot_ui.line(
                Line::new(chance)
                    .name("chance")
                    .color(Color32::GRAY)
                    .style(LineStyle::dashed_loose()),
            );

            for (class, curve) in evaluation.roc_curves.iter().enumerate() {
                if curve.is_empty() {
                    continue;
                }
                let points: PlotPoints = curve
                    .iter()
                    .map(|p| [1.0 - p.specificity, p.sensitivity])
                    .collect();
                let name = format!(
                    "{} (AUC {:.3})",
                    evaluation.classes[class], evaluation.class_auc[class]
                );
                plot_ui.line(
                    Line::new(points)
                        .name(&name)
                        .color(state.class_colors.color_for(class))
                        .width(2.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Gain curve
// ---------------------------------------------------------------------------

/// Share of each class found against share of rows tested, best scores first.
pub fn gain_plot(ui: &mut Ui, state: &AppState) {
    let Some(model) = state.selected_model() else {
        no_results(ui);
        return;
    };
    let evaluation = &model.evaluation;
    let n_rows = model.predictions.len().max(1) as f64;

    Plot::new("gain_plot")
        .legend(Legend::default())
        .x_axis_label("% tested")
        .y_axis_label("% found")
        .data_aspect(1.0)
        .include_x(0.0)
        .include_x(100.0)
        .include_y(0.0)
        .include_y(100.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let baseline: PlotPoints = vec![[0.0, 0.0], [100.0, 100.0]].into();
            plot_ui.line(
                Line::new(baseline)
                    .name("random")
                    .color(Color32::GRAY)
                    .style(LineStyle::dashed_loose()),
            );

            for (class, curve) in evaluation.gain_curves.iter().enumerate() {
                let Some(last) = curve.last() else {
                    continue;
                };
                let color = state.class_colors.color_for(class);

                // Perfect model: every event found before any non-event.
                let events_share = 100.0 * last.n_events as f64 / n_rows;
                let perfect: PlotPoints =
                    vec![[0.0, 0.0], [events_share, 100.0], [100.0, 100.0]].into();
                plot_ui.line(
                    Line::new(perfect)
                        .color(color.gamma_multiply(0.4))
                        .style(LineStyle::dotted_dense()),
                );

                let points: PlotPoints = curve
                    .iter()
                    .map(|p| [p.percent_tested, p.percent_found])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&evaluation.classes[class])
                        .color(color)
                        .width(2.0),
                );
            }
        });
}
