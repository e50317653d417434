use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{OnsetRegion, SavGolParams};
use crate::data::loader::{self, CsvLayout};
use crate::data::model::{SpectrumKind, SpectrumOrigin};
use crate::data::store::SpectrumStore;

// ---------------------------------------------------------------------------
// Session file
// ---------------------------------------------------------------------------

/// A complete analysis as read from a JSON session file:
///
/// ```json
/// {
///   "loads": [
///     { "origin": "experimental", "path": "Ti3O5_O_XES.csv", "kind": "xes", "names": ["XES"] },
///     { "origin": "calculated", "path": "Ti3O5-brd_O_XES.csv", "kind": "xes", "name": "XES calc" }
///   ],
///   "smoothing": [
///     { "kind": "xes", "name": "XES", "window": 15, "polyorder": 3, "onset_region": [526, 533] }
///   ],
///   "plot": { "title": "Ti3O5 Bandgap Analysis", "xes_xlims": [515, 535] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub loads: Vec<LoadJob>,
    #[serde(default)]
    pub smoothing: Vec<SmoothJob>,
    #[serde(default)]
    pub selection: PlotSelection,
    #[serde(default)]
    pub plot: PlotSettings,
}

/// One file to read into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum LoadJob {
    Experimental {
        path: PathBuf,
        kind: SpectrumKind,
        names: Vec<String>,
        #[serde(default = "default_exp_skiprows")]
        skiprows: usize,
        #[serde(default = "default_sep")]
        sep: char,
    },
    Calculated {
        path: PathBuf,
        kind: SpectrumKind,
        name: String,
        #[serde(default = "default_calc_skiprows")]
        skiprows: usize,
        #[serde(default = "default_sep")]
        sep: char,
    },
}

fn default_exp_skiprows() -> usize {
    CsvLayout::experimental().skiprows
}

fn default_calc_skiprows() -> usize {
    CsvLayout::calculated().skiprows
}

fn default_sep() -> char {
    ','
}

/// Smoothing request for one experimental spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothJob {
    pub kind: SpectrumKind,
    pub name: String,
    pub window: usize,
    pub polyorder: usize,
    #[serde(default)]
    pub onset_region: Option<OnsetRegion>,
}

impl Session {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing session {}", path.display()))
    }

    /// Load every file and run every smoothing job. Relative paths resolve
    /// against `base_dir`.
    pub fn build_store(&self, base_dir: &Path) -> Result<SpectrumStore> {
        let mut store = SpectrumStore::new();

        for job in &self.loads {
            match job {
                LoadJob::Experimental {
                    path,
                    kind,
                    names,
                    skiprows,
                    sep,
                } => {
                    let layout = CsvLayout {
                        skiprows: *skiprows,
                        sep: *sep,
                    };
                    for sp in loader::load_exp_spectra(&base_dir.join(path), *kind, names, layout)? {
                        store.insert(sp);
                    }
                }
                LoadJob::Calculated {
                    path,
                    kind,
                    name,
                    skiprows,
                    sep,
                } => {
                    let layout = CsvLayout {
                        skiprows: *skiprows,
                        sep: *sep,
                    };
                    store.insert(loader::load_calc_spectra(&base_dir.join(path), *kind, name, layout)?);
                }
            }
        }

        for job in &self.smoothing {
            let params = SavGolParams {
                window: job.window,
                polyorder: job.polyorder,
            };
            store
                .smoothen(job.kind, &job.name, params, job.onset_region)
                .with_context(|| format!("smoothing {} '{}'", job.kind, job.name))?;
        }

        log::info!(
            "Session ready: {} spectra, {} smoothing jobs",
            store.len(),
            self.smoothing.len()
        );
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Which spectra go on the plot
// ---------------------------------------------------------------------------

/// Names drawn per panel. `None` draws everything of that kind and origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSelection {
    #[serde(default)]
    pub xes_exp: Option<Vec<String>>,
    #[serde(default)]
    pub xes_calc: Option<Vec<String>>,
    #[serde(default)]
    pub xas_exp: Option<Vec<String>>,
    #[serde(default)]
    pub xas_calc: Option<Vec<String>>,
}

impl PlotSelection {
    /// Names to draw for `kind` and `origin`, in the configured order.
    /// Names missing from the store are skipped.
    pub fn resolve(&self, kind: SpectrumKind, origin: SpectrumOrigin, store: &SpectrumStore) -> Vec<String> {
        let chosen = match (kind, origin) {
            (SpectrumKind::Xes, SpectrumOrigin::Experimental) => &self.xes_exp,
            (SpectrumKind::Xes, SpectrumOrigin::Calculated) => &self.xes_calc,
            (SpectrumKind::Xas, SpectrumOrigin::Experimental) => &self.xas_exp,
            (SpectrumKind::Xas, SpectrumOrigin::Calculated) => &self.xas_calc,
        };
        match chosen {
            Some(names) => names
                .iter()
                .filter(|n| store.get(kind, origin, n).is_some())
                .cloned()
                .collect(),
            None => store.names(kind, origin),
        }
    }
}

// ---------------------------------------------------------------------------
// Plot settings
// ---------------------------------------------------------------------------

/// Annotation arrow pointing at a second-derivative peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    /// Arrow tip in data coordinates.
    pub xy: [f64; 2],
    /// Label position in data coordinates.
    pub xytext: [f64; 2],
    pub text: String,
}

/// Figure-level options of the 2x2 comparison plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub title: Option<String>,
    /// Width and height in inches; the viewer uses 100 px per inch.
    pub figsize: [f32; 2],
    pub xes_xlims: Option<[f64; 2]>,
    pub xas_xlims: Option<[f64; 2]>,
    /// Corner labels, row-major: spectra row then second-derivative row.
    pub subplot_labels: [[String; 2]; 2],
    pub xes_arrow: Option<Arrow>,
    pub xas_arrow: Option<Arrow>,
}

impl Default for PlotSettings {
    fn default() -> Self {
        PlotSettings {
            title: None,
            figsize: [14.0, 8.0],
            xes_xlims: None,
            xas_xlims: None,
            subplot_labels: [
                ["XES".to_string(), "XAS".to_string()],
                ["2nd der.".to_string(), "2nd der.".to_string()],
            ],
            xes_arrow: None,
            xas_arrow: None,
        }
    }
}

impl PlotSettings {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_figsize(&mut self, width: f32, height: f32) {
        self.figsize = [width, height];
    }

    pub fn set_xlims(&mut self, xes: Option<[f64; 2]>, xas: Option<[f64; 2]>) {
        self.xes_xlims = xes;
        self.xas_xlims = xas;
    }

    pub fn add_arrow(&mut self, kind: SpectrumKind, arrow: Arrow) {
        match kind {
            SpectrumKind::Xes => self.xes_arrow = Some(arrow),
            SpectrumKind::Xas => self.xas_arrow = Some(arrow),
        }
    }

    pub fn xlims(&self, kind: SpectrumKind) -> Option<[f64; 2]> {
        match kind {
            SpectrumKind::Xes => self.xes_xlims,
            SpectrumKind::Xas => self.xas_xlims,
        }
    }

    pub fn arrow(&self, kind: SpectrumKind) -> Option<&Arrow> {
        match kind {
            SpectrumKind::Xes => self.xes_arrow.as_ref(),
            SpectrumKind::Xas => self.xas_arrow.as_ref(),
        }
    }

    /// Column index of `kind` in the 2x2 grid.
    pub fn column(kind: SpectrumKind) -> usize {
        match kind {
            SpectrumKind::Xes => 0,
            SpectrumKind::Xas => 1,
        }
    }
}
