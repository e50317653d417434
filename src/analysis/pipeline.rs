use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::gradient::second_gradient;
use super::savgol::{NonUniformSavGol, SavGolParams};

// ---------------------------------------------------------------------------
// Onset region
// ---------------------------------------------------------------------------

/// Energy range of interest near a spectral edge. Carried along for plotting
/// and export only; the numerics never look at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct OnsetRegion {
    pub min: f64,
    pub max: f64,
}

impl OnsetRegion {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `x` lies inside the region, whichever way round the bounds
    /// were given.
    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        x >= lo && x <= hi
    }
}

impl From<[f64; 2]> for OnsetRegion {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<OnsetRegion> for [f64; 2] {
    fn from(r: OnsetRegion) -> Self {
        [r.min, r.max]
    }
}

// ---------------------------------------------------------------------------
// Derivative pipeline
// ---------------------------------------------------------------------------

/// Output of one smoothing + differentiation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeOutput {
    pub smoothed: Vec<f64>,
    pub second_derivative: Vec<f64>,
    pub onset_region: Option<OnsetRegion>,
}

/// Smooth `y` and differentiate the smoothed curve twice.
///
/// The second derivative is the finite-difference gradient applied twice to
/// `smoothed`, not a second-order local polynomial derivative.
pub fn process(
    x: &[f64],
    y: &[f64],
    params: SavGolParams,
    onset_region: Option<OnsetRegion>,
) -> Result<DerivativeOutput> {
    params.validate()?;
    let smoothed = NonUniformSavGol::with_params(params).apply(x, y)?;
    let second_derivative = second_gradient(x, &smoothed)?;
    Ok(DerivativeOutput {
        smoothed,
        second_derivative,
        onset_region,
    })
}
