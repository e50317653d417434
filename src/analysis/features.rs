use crate::data::model::SpectrumKind;

use super::pipeline::OnsetRegion;

/// Scale a curve so its largest absolute value becomes 1.
///
/// Curves that are empty or identically zero are returned unchanged.
pub fn normalize_abs_max(y: &[f64]) -> Vec<f64> {
    let max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let abs_max = max.max(-min);
    if !(abs_max > 0.0) || !abs_max.is_finite() {
        return y.to_vec();
    }
    y.iter().map(|v| v / abs_max).collect()
}

/// Indices of strict local maxima of a second-derivative curve, optionally
/// restricted to samples whose x lies in `region`.
pub fn second_derivative_peaks(x: &[f64], d2: &[f64], region: Option<OnsetRegion>) -> Vec<usize> {
    let n = x.len().min(d2.len());
    if n < 3 {
        return Vec::new();
    }
    (1..n - 1)
        .filter(|&i| region.map_or(true, |r| r.contains(x[i])))
        .filter(|&i| d2[i] > d2[i - 1] && d2[i] > d2[i + 1])
        .collect()
}

/// The peak worth annotating near an edge: the last one for emission, the
/// first one for absorption.
pub fn onset_peak(
    kind: SpectrumKind,
    x: &[f64],
    d2: &[f64],
    region: Option<OnsetRegion>,
) -> Option<usize> {
    let peaks = second_derivative_peaks(x, d2, region);
    match kind {
        SpectrumKind::Xes => peaks.last().copied(),
        SpectrumKind::Xas => peaks.first().copied(),
    }
}
