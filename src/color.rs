use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Class palette
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            to_color32(hsl.into_color())
        })
        .collect()
}

/// One colour per outcome class, stable across tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassColors {
    colors: Vec<Color32>,
}

impl ClassColors {
    pub fn new(n_classes: usize) -> Self {
        ClassColors {
            colors: generate_palette(n_classes),
        }
    }

    pub fn color_for(&self, class: usize) -> Color32 {
        self.colors.get(class).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for correlations
// ---------------------------------------------------------------------------

/// Blue (-1) → white (0) → red (+1), mixed in linear RGB. `NaN` is grey.
pub fn diverging(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::from_gray(160);
    }
    let white = LinSrgb::new(1.0_f32, 1.0, 1.0);
    let end: LinSrgb = if r < 0.0 {
        Srgb::new(0.23_f32, 0.30, 0.75).into_linear()
    } else {
        Srgb::new(0.71_f32, 0.02, 0.15).into_linear()
    };
    let t = r.abs().min(1.0) as f32;
    to_color32(Srgb::from_linear(white.mix(end, t)))
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: Color32) -> Color32 {
    let [r, g, b, _] = background.to_array();
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert_ne!(p[0], p[1]);
        assert_ne!(p[1], p[2]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn diverging_scale_is_white_at_zero() {
        assert_eq!(diverging(0.0), Color32::from_rgb(255, 255, 255));
        let hot = diverging(1.0);
        let cold = diverging(-1.0);
        assert!(hot.r() > hot.b());
        assert!(cold.b() > cold.r());
        assert_eq!(text_on(diverging(0.0)), Color32::BLACK);
    }
}
