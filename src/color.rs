use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use bandgap_viewer::data::model::{SpectrumKind, SpectrumOrigin};
use bandgap_viewer::data::store::SpectrumStore;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` visually distinct colours with evenly spaced hues, starting at
/// `hue_offset` degrees.
pub fn generate_palette(n: usize, hue_offset: f32, lightness: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = hue_offset + (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.75, lightness).into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series colours: one per (origin, name) within each kind
// ---------------------------------------------------------------------------

/// Experimental spectra get saturated mid-tones, calculated ones a lighter
/// shifted palette, so a measurement and its calculation stay apart.
#[derive(Debug, Clone, Default)]
pub struct SeriesColors {
    mapping: BTreeMap<(SpectrumKind, SpectrumOrigin, String), Color32>,
}

impl SeriesColors {
    pub fn for_store(store: &SpectrumStore) -> Self {
        let mut mapping = BTreeMap::new();
        for kind in SpectrumKind::ALL {
            for (origin, hue_offset, lightness) in [
                (SpectrumOrigin::Experimental, 210.0, 0.5),
                (SpectrumOrigin::Calculated, 20.0, 0.6),
            ] {
                let names = store.names(kind, origin);
                let palette = generate_palette(names.len(), hue_offset, lightness);
                for (name, color) in names.into_iter().zip(palette) {
                    mapping.insert((kind, origin, name), color);
                }
            }
        }
        SeriesColors { mapping }
    }

    /// Colour of one series; grey for anything unknown.
    pub fn color_for(&self, kind: SpectrumKind, origin: SpectrumOrigin, name: &str) -> Color32 {
        self.mapping
            .get(&(kind, origin, name.to_string()))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_entries() {
        let p = generate_palette(4, 0.0, 0.5);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[2]);
        assert!(generate_palette(0, 0.0, 0.5).is_empty());
    }

    #[test]
    fn unknown_series_is_grey() {
        let colors = SeriesColors::default();
        assert_eq!(
            colors.color_for(SpectrumKind::Xes, SpectrumOrigin::Calculated, "none"),
            Color32::GRAY
        );
    }
}
