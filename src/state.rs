use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use bandgap_viewer::analysis::SavGolParams;
use bandgap_viewer::config::{PlotSettings, Session};
use bandgap_viewer::data::model::{Spectrum, SpectrumKind, SpectrumOrigin};
use bandgap_viewer::data::store::SpectrumStore;

use crate::color::SeriesColors;

/// (kind, origin) → names currently drawn.
pub type Visibility = BTreeMap<(SpectrumKind, SpectrumOrigin), BTreeSet<String>>;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded spectra and smoothing results.
    pub store: SpectrumStore,

    /// Session file the store was built from, if any.
    pub session_path: Option<PathBuf>,

    /// Figure options (title, limits, labels, arrows).
    pub plot: PlotSettings,

    /// Which spectra are drawn.
    pub visible: Visibility,

    /// Smoothing parameters being edited in the side panel, per experimental
    /// spectrum.
    pub smoothing_edits: BTreeMap<(SpectrumKind, String), SavGolParams>,

    /// Series colours.
    pub colors: SeriesColors,

    /// Divide spectra by their largest absolute value before drawing.
    pub normalize: bool,

    /// Experimental spectrum shown in the raw vs smoothed window.
    pub preview: Option<(SpectrumKind, String)>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: SpectrumStore::new(),
            session_path: None,
            plot: PlotSettings::default(),
            visible: Visibility::new(),
            smoothing_edits: BTreeMap::new(),
            colors: SeriesColors::default(),
            normalize: true,
            preview: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Read a session file, build its store and show what it selects.
    pub fn open_session(&mut self, path: &Path) -> Result<()> {
        let session = Session::from_path(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let store = session
            .build_store(base_dir)
            .with_context(|| format!("building session {}", path.display()))?;

        let mut visible = Visibility::new();
        for kind in SpectrumKind::ALL {
            for origin in [SpectrumOrigin::Experimental, SpectrumOrigin::Calculated] {
                let names = session.selection.resolve(kind, origin, &store);
                visible.insert((kind, origin), names.into_iter().collect());
            }
        }

        self.set_store(store);
        self.visible = visible;
        self.plot = session.plot;
        self.session_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace the store; every spectrum starts visible.
    pub fn set_store(&mut self, store: SpectrumStore) {
        self.visible.clear();
        self.smoothing_edits.clear();
        for kind in SpectrumKind::ALL {
            for origin in [SpectrumOrigin::Experimental, SpectrumOrigin::Calculated] {
                self.visible
                    .insert((kind, origin), store.names(kind, origin).into_iter().collect());
            }
            for sp in store.spectra(kind, SpectrumOrigin::Experimental) {
                let params = store
                    .processed(kind, &sp.name)
                    .map(|p| p.params)
                    .unwrap_or_default();
                self.smoothing_edits.insert((kind, sp.name.clone()), params);
            }
        }
        self.preview = None;
        self.colors = SeriesColors::for_store(&store);
        self.store = store;
        self.status_message = None;
    }

    /// Visible spectra of one kind and origin, sorted by name.
    pub fn visible_spectra(&self, kind: SpectrumKind, origin: SpectrumOrigin) -> Vec<&Spectrum> {
        let Some(names) = self.visible.get(&(kind, origin)) else {
            return Vec::new();
        };
        self.store
            .spectra(kind, origin)
            .filter(|sp| names.contains(&sp.name))
            .collect()
    }

    pub fn is_visible(&self, kind: SpectrumKind, origin: SpectrumOrigin, name: &str) -> bool {
        self.visible
            .get(&(kind, origin))
            .is_some_and(|names| names.contains(name))
    }

    /// Toggle a single spectrum on or off.
    pub fn toggle_visible(&mut self, kind: SpectrumKind, origin: SpectrumOrigin, name: &str) {
        let names = self.visible.entry((kind, origin)).or_default();
        if !names.remove(name) {
            names.insert(name.to_string());
        }
    }

    /// Re-run smoothing for one experimental spectrum with the edited
    /// parameters, keeping its onset region.
    pub fn resmooth(&mut self, kind: SpectrumKind, name: &str) {
        let Some(params) = self.smoothing_edits.get(&(kind, name.to_string())).copied() else {
            return;
        };
        let onset = self
            .store
            .processed(kind, name)
            .and_then(|p| p.onset_region);
        match self.store.smoothen(kind, name, params, onset) {
            Ok(_) => {
                log::info!(
                    "Re-smoothed {kind} '{name}' with window {} / polyorder {}",
                    params.window,
                    params.polyorder
                );
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Smoothing {kind} '{name}' failed: {e}");
                self.status_message = Some(format!("{kind} '{name}': {e}"));
            }
        }
    }

    /// Base name for exported tables, taken from the session file.
    pub fn export_basename(&self) -> String {
        self.session_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .map(|s| format!("{s}_analysis"))
            .unwrap_or_else(|| "bandgap_analysis".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_two_xas() -> AppState {
        let mut store = SpectrumStore::new();
        for name in ["TEY", "PFY"] {
            let x: Vec<f64> = (0..9).map(|i| 528.0 + i as f64 * 0.5).collect();
            let y: Vec<f64> = x.iter().map(|v| v - 528.0).collect();
            store.insert(Spectrum::new(name, SpectrumKind::Xas, SpectrumOrigin::Experimental, x, y));
        }
        let mut state = AppState::default();
        state.set_store(store);
        state
    }

    #[test]
    fn new_store_is_fully_visible() {
        let state = state_with_two_xas();
        let names: Vec<&str> = state
            .visible_spectra(SpectrumKind::Xas, SpectrumOrigin::Experimental)
            .iter()
            .map(|sp| sp.name.as_str())
            .collect();
        assert_eq!(names, vec!["PFY", "TEY"]);
    }

    #[test]
    fn toggling_hides_and_shows() {
        let mut state = state_with_two_xas();
        state.toggle_visible(SpectrumKind::Xas, SpectrumOrigin::Experimental, "TEY");
        assert!(!state.is_visible(SpectrumKind::Xas, SpectrumOrigin::Experimental, "TEY"));
        state.toggle_visible(SpectrumKind::Xas, SpectrumOrigin::Experimental, "TEY");
        assert!(state.is_visible(SpectrumKind::Xas, SpectrumOrigin::Experimental, "TEY"));
    }

    #[test]
    fn bad_edit_reports_status_without_panicking() {
        let mut state = state_with_two_xas();
        state.smoothing_edits.insert(
            (SpectrumKind::Xas, "TEY".into()),
            SavGolParams {
                window: 4,
                polyorder: 1,
            },
        );
        state.resmooth(SpectrumKind::Xas, "TEY");
        assert!(state.status_message.is_some());

        state.smoothing_edits.insert(
            (SpectrumKind::Xas, "TEY".into()),
            SavGolParams {
                window: 5,
                polyorder: 1,
            },
        );
        state.resmooth(SpectrumKind::Xas, "TEY");
        assert!(state.status_message.is_none());
        assert!(state.store.processed(SpectrumKind::Xas, "TEY").is_some());
    }
}
