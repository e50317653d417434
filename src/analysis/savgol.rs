use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Window length and polynomial degree of the local least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavGolParams {
    /// Number of samples in each local fit. Odd, at least `polyorder + 2`.
    pub window: usize,
    /// Degree of the local polynomial.
    pub polyorder: usize,
}

impl SavGolParams {
    pub fn new(window: usize, polyorder: usize) -> Result<Self> {
        let params = Self { window, polyorder };
        params.validate()?;
        Ok(params)
    }

    /// Check the window / poly-order relationship on its own (no data needed).
    pub fn validate(&self) -> Result<()> {
        if self.window % 2 == 0 {
            return Err(AnalysisError::invalid(format!(
                "window must be odd, got {}",
                self.window
            )));
        }
        // Written against `window - 1` so a huge polyorder cannot overflow.
        if self.polyorder >= self.window.saturating_sub(1) {
            return Err(AnalysisError::invalid(format!(
                "window ({}) must exceed polyorder + 1 (polyorder is {})",
                self.window, self.polyorder
            )));
        }
        Ok(())
    }
}

impl Default for SavGolParams {
    fn default() -> Self {
        Self {
            window: 15,
            polyorder: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Window selection
// ---------------------------------------------------------------------------

/// Inclusive index bounds `[left, right]` of one local fit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub left: usize,
    pub right: usize,
}

impl Window {
    /// Window of exactly `window` points centred on `idx`, shifted inward
    /// near either edge so it never leaves `0..n`.
    ///
    /// Requires `1 <= window <= n`.
    #[inline]
    pub fn around(idx: usize, window: usize, n: usize) -> Self {
        debug_assert!(window >= 1 && window <= n, "window must fit in the data");
        let half = window / 2;
        let left = idx.saturating_sub(half).min(n - window);
        Self {
            left,
            right: left + window - 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right < self.left
    }
}

/// Bounds of the window used for index `i`; see [`Window::around`].
pub fn window_bounds(i: usize, window: usize, n: usize) -> (usize, usize) {
    let w = Window::around(i, window, n);
    (w.left, w.right)
}

// ---------------------------------------------------------------------------
// Non-uniform Savitzky-Golay filter
// ---------------------------------------------------------------------------

/// Savitzky-Golay smoothing for irregularly spaced samples.
///
/// Every output point comes from its own least-squares polynomial fit over
/// `window` neighbouring samples, with x recentred on the point being
/// evaluated. Evaluating the fit (or one of its derivatives) at `dx = 0`
/// gives the output value.
#[derive(Debug, Clone, Copy)]
pub struct NonUniformSavGol {
    params: SavGolParams,
    deriv: usize,
    parallel: bool,
}

impl NonUniformSavGol {
    pub fn new(window: usize, polyorder: usize) -> Result<Self> {
        Ok(Self::with_params(SavGolParams::new(window, polyorder)?))
    }

    /// Wrap already validated parameters.
    pub fn with_params(params: SavGolParams) -> Self {
        Self {
            params,
            deriv: 0,
            parallel: true,
        }
    }

    /// Return the `order`-th derivative of the local fit instead of its value.
    pub fn derivative(mut self, order: usize) -> Self {
        self.deriv = order;
        self
    }

    /// Spread the per-point fits over the rayon pool. Output is identical
    /// either way.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn params(&self) -> SavGolParams {
        self.params
    }

    /// Filter `y` sampled at `x`. The result has one value per input sample.
    pub fn apply(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        let n = x.len();
        if y.len() != n {
            return Err(AnalysisError::invalid(format!(
                "x has {n} values but y has {}",
                y.len()
            )));
        }
        self.params.validate()?;
        if n < self.params.window {
            return Err(AnalysisError::invalid(format!(
                "{n} samples is fewer than the window ({})",
                self.params.window
            )));
        }
        check_strictly_increasing(x)?;

        // The fitted polynomial has no terms above `polyorder`.
        if self.deriv > self.params.polyorder {
            return Ok(vec![0.0; n]);
        }

        // Collect per-point results first so the reported failure is always
        // the lowest failing index, regardless of scheduling.
        let fits: Vec<Result<f64>> = if self.parallel {
            (0..n)
                .into_par_iter()
                .map(|i| self.fit_at(x, y, i))
                .collect()
        } else {
            (0..n).map(|i| self.fit_at(x, y, i)).collect()
        };
        fits.into_iter().collect()
    }

    fn fit_at(&self, x: &[f64], y: &[f64], i: usize) -> Result<f64> {
        let window = Window::around(i, self.params.window, x.len());
        let x0 = x[i];

        // Scale offsets into [-1, 1] so the Vandermonde columns are comparable.
        let scale = x[window.left..=window.right]
            .iter()
            .fold(0.0_f64, |m, &xi| m.max((xi - x0).abs()));
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(AnalysisError::SingularFit { index: i });
        }

        let cols = self.params.polyorder + 1;
        let design = DMatrix::from_fn(window.len(), cols, |r, c| {
            ((x[window.left + r] - x0) / scale).powi(c as i32)
        });
        let rhs = DVector::from_column_slice(&y[window.left..=window.right]);

        let coeffs =
            solve_least_squares(design, &rhs).ok_or(AnalysisError::SingularFit { index: i })?;

        let d = self.deriv;
        Ok(coeffs[d] * factorial(d) / scale.powi(d as i32))
    }
}

/// Smooth `y` with a local polynomial fit of degree `polyorder` over
/// `window` samples.
pub fn smooth(x: &[f64], y: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    NonUniformSavGol::new(window, polyorder)?.apply(x, y)
}

/// Like [`smooth`] but evaluates the `deriv_order`-th derivative of each local
/// fit at its centre point.
pub fn smooth_derivative(
    x: &[f64],
    y: &[f64],
    window: usize,
    polyorder: usize,
    deriv_order: usize,
) -> Result<Vec<f64>> {
    NonUniformSavGol::new(window, polyorder)?
        .derivative(deriv_order)
        .apply(x, y)
}

pub(crate) fn check_strictly_increasing(x: &[f64]) -> Result<()> {
    for (i, pair) in x.windows(2).enumerate() {
        // Negated comparison so NaN is rejected too.
        if !(pair[1] > pair[0]) {
            return Err(AnalysisError::NonMonotonicInput {
                index: i + 1,
                previous: pair[0],
                value: pair[1],
            });
        }
    }
    Ok(())
}

/// Least-squares solution of `a c = b` through a thin QR factorisation.
/// Returns `None` when `a` is numerically rank deficient.
fn solve_least_squares(a: DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let rows = a.nrows();
    let qr = a.qr();
    let r = qr.r();

    let diag = r.diagonal();
    let max_diag = diag.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = max_diag * rows as f64 * f64::EPSILON;
    if max_diag == 0.0 || diag.iter().any(|v| v.abs() <= tolerance) {
        return None;
    }

    let qtb = qr.q().transpose() * b;
    r.solve_upper_triangular(&qtb)
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}
