use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use crate::color::{diverging, text_on};
use crate::state::AppState;

const LABEL_SPACE: f32 = 110.0;

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Paint the predictor correlation matrix as coloured cells with values;
/// hovering a cell shows the pair below the grid.
pub fn correlation_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Run the workflow to see correlations");
        });
        return;
    };
    let cm = &report.correlation;
    let p = cm.len();
    if p == 0 {
        ui.label("No predictors.");
        return;
    }

    let available = ui.available_size();
    let side = (available.x.min(available.y - 40.0) - LABEL_SPACE).max(120.0);
    let cell = side / p as f32;
    let (response, painter) =
        ui.allocate_painter(Vec2::splat(side + LABEL_SPACE), Sense::hover());
    let origin = response.rect.min + Vec2::splat(LABEL_SPACE);
    let font = FontId::proportional((cell * 0.18).clamp(10.0, 16.0));
    let label_color = ui.visuals().text_color();

    for (i, name) in cm.names.iter().enumerate() {
        let offset = (i as f32 + 0.5) * cell;
        // row labels on the left, column labels on top
        painter.text(
            Pos2::new(origin.x - 6.0, origin.y + offset),
            Align2::RIGHT_CENTER,
            name,
            font.clone(),
            label_color,
        );
        painter.text(
            Pos2::new(origin.x + offset, origin.y - 6.0),
            Align2::CENTER_BOTTOM,
            name,
            font.clone(),
            label_color,
        );
    }

    let mut hovered = None;
    for i in 0..p {
        for j in 0..p {
            let r = cm.get(i, j);
            let rect = Rect::from_min_size(
                origin + Vec2::new(j as f32 * cell, i as f32 * cell),
                Vec2::splat(cell),
            );
            let fill = diverging(r);
            painter.rect_filled(rect.shrink(1.0), 0.0, fill);
            let text = if r.is_nan() { "NA".to_string() } else { format!("{r:.2}") };
            painter.text(rect.center(), Align2::CENTER_CENTER, text, font.clone(), text_on(fill));

            if response.hover_pos().is_some_and(|pos| rect.contains(pos)) {
                painter.rect_stroke(rect, 0.0, Stroke::new(2.0, label_color), egui::StrokeKind::Inside);
                hovered = Some((i, j, r));
            }
        }
    }

    match hovered {
        Some((i, j, r)) => ui.label(format!("{} ~ {}: r = {r:.4}", cm.names[i], cm.names[j])),
        None => ui.label("Hover a cell for the exact correlation."),
    };
}
