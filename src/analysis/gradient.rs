use crate::error::{AnalysisError, Result};

/// Numerical first derivative of `f` over a possibly non-uniform grid `x`.
///
/// Interior points use the second-order central difference weighted by the
/// spacing on each side; the two end points use one-sided first-order
/// differences. Matches `numpy.gradient(f, x)` with the default edge order.
pub fn gradient(x: &[f64], f: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    if f.len() != n {
        return Err(AnalysisError::invalid(format!(
            "x has {n} values but f has {}",
            f.len()
        )));
    }
    if n < 2 {
        return Err(AnalysisError::invalid(format!(
            "gradient needs at least 2 samples, got {n}"
        )));
    }

    let mut out = vec![0.0; n];
    for i in 1..n - 1 {
        let hd = x[i] - x[i - 1];
        let hs = x[i + 1] - x[i];
        out[i] = (hd * hd * f[i + 1] - hs * hs * f[i - 1] + (hs * hs - hd * hd) * f[i])
            / (hd * hs * (hd + hs));
    }
    out[0] = (f[1] - f[0]) / (x[1] - x[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (x[n - 1] - x[n - 2]);
    Ok(out)
}

/// Gradient of the gradient.
pub fn second_gradient(x: &[f64], f: &[f64]) -> Result<Vec<f64>> {
    let first = gradient(x, f)?;
    gradient(x, &first)
}
