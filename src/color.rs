use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Bar palette
// ---------------------------------------------------------------------------

/// `n` visually distinct colours using evenly spaced hues, starting at the
/// dashboard's blue.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 220.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue % 360.0, 0.65, 0.50);
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
// Group colours: group key → Color32
// ---------------------------------------------------------------------------

/// Stable colour per group key, so a group keeps its colour between the
/// summary chart and the drill-down header.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let keys: Vec<&CellValue> = keys.into_iter().collect();
        let palette = generate_palette(keys.len());
        ColorMap {
            mapping: keys.into_iter().cloned().zip(palette).collect(),
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, key: &CellValue) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let p = generate_palette(6);
        assert_eq!(p.len(), 6);
        for (i, a) in p.iter().enumerate() {
            assert!(p[i + 1..].iter().all(|b| b != a));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_keys_are_grey() {
        let keys = [CellValue::Text("A".into()), CellValue::Null];
        let map = ColorMap::new(&keys);
        assert_ne!(map.color_for(&keys[0]), Color32::GRAY);
        assert_eq!(map.color_for(&CellValue::Integer(1)), Color32::GRAY);
    }
}
