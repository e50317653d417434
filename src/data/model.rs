use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{DerivativeOutput, OnsetRegion, SavGolParams};
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// SpectrumKind – emission or absorption
// ---------------------------------------------------------------------------

/// Which side of the bandgap a spectrum probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumKind {
    /// X-ray emission (occupied states, valence band side).
    Xes,
    /// X-ray absorption (unoccupied states, conduction band side).
    Xas,
}

impl SpectrumKind {
    pub const ALL: [SpectrumKind; 2] = [SpectrumKind::Xes, SpectrumKind::Xas];

    /// Upper-case tag used in file names and panel titles.
    pub fn tag(&self) -> &'static str {
        match self {
            SpectrumKind::Xes => "XES",
            SpectrumKind::Xas => "XAS",
        }
    }
}

impl fmt::Display for SpectrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for SpectrumKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xes" => Ok(SpectrumKind::Xes),
            "xas" => Ok(SpectrumKind::Xas),
            other => Err(AnalysisError::invalid(format!(
                "spectrum type must be either \"xes\" or \"xas\", got \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SpectrumOrigin – measured or computed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumOrigin {
    Experimental,
    Calculated,
}

impl fmt::Display for SpectrumOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumOrigin::Experimental => write!(f, "exp"),
            SpectrumOrigin::Calculated => write!(f, "calc"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one loaded curve
// ---------------------------------------------------------------------------

/// A single loaded curve. Never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub name: String,
    pub kind: SpectrumKind,
    pub origin: SpectrumOrigin,
    /// Photon energy axis (x), eV.
    pub x: Vec<f64>,
    /// Intensity axis (y) – same length as `x`.
    pub y: Vec<f64>,
}

impl Spectrum {
    pub fn new(
        name: impl Into<String>,
        kind: SpectrumKind,
        origin: SpectrumOrigin,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Self {
        Spectrum {
            name: name.into(),
            kind,
            origin,
            x,
            y,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the spectrum has no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ProcessedSpectrum – smoothing result for one experimental spectrum
// ---------------------------------------------------------------------------

/// Smoothed curve and its second derivative, on the source spectrum's grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSpectrum {
    pub name: String,
    pub kind: SpectrumKind,
    pub params: SavGolParams,
    pub smoothed: Vec<f64>,
    pub second_derivative: Vec<f64>,
    pub onset_region: Option<OnsetRegion>,
}

impl ProcessedSpectrum {
    pub fn from_output(source: &Spectrum, params: SavGolParams, out: DerivativeOutput) -> Self {
        ProcessedSpectrum {
            name: source.name.clone(),
            kind: source.kind,
            params,
            smoothed: out.smoothed,
            second_derivative: out.second_derivative,
            onset_region: out.onset_region,
        }
    }
}
