use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: condition label → Color32
// ---------------------------------------------------------------------------

/// Maps each condition label to a stable, distinct colour.  The map is
/// built from the full condition set, not the current selection, so a
/// condition keeps its colour when others are toggled off.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the table's sorted condition set.
    pub fn new(conditions: &BTreeSet<String>) -> Self {
        let palette = generate_palette(conditions.len());
        let mapping: BTreeMap<String, Color32> = conditions
            .iter()
            .zip(palette)
            .map(|(label, color)| (label.clone(), color))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a condition label.
    pub fn color_for(&self, condition: &str) -> Color32 {
        self.mapping
            .get(condition)
            .copied()
            .unwrap_or(self.default_color)
    }
}
