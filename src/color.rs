use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous blue scale for magnitude encodings
// ---------------------------------------------------------------------------

const BLUES_LOW: (f32, f32, f32) = (0.776, 0.859, 0.937);
const BLUES_HIGH: (f32, f32, f32) = (0.031, 0.188, 0.420);

/// Colour for `value` on a light-to-dark blue ramp spanning `[min, max]`.
/// A degenerate span maps everything to the dark end.
pub fn blues(value: f64, min: f64, max: f64) -> Color32 {
    let span = max - min;
    let t = if span.abs() < f64::EPSILON {
        1.0
    } else {
        ((value - min) / span).clamp(0.0, 1.0) as f32
    };
    let low: LinSrgb = Srgb::new(BLUES_LOW.0, BLUES_LOW.1, BLUES_LOW.2).into_linear();
    let high: LinSrgb = Srgb::new(BLUES_HIGH.0, BLUES_HIGH.1, BLUES_HIGH.2).into_linear();
    to_color32(Srgb::from_linear(low.mix(high, t)))
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps category labels (e.g. regions) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Assign palette colours to `labels` in the order given.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, c)| (label.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}
