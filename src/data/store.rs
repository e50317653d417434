use std::collections::BTreeMap;

use crate::analysis::{self, OnsetRegion, SavGolParams};
use crate::error::{AnalysisError, Result};

use super::model::{ProcessedSpectrum, Spectrum, SpectrumKind, SpectrumOrigin};

// ---------------------------------------------------------------------------
// SpectrumStore – every loaded spectrum plus its smoothing results
// ---------------------------------------------------------------------------

/// Loaded spectra keyed by (kind, origin) then name, and the processed
/// results of smoothed experimental spectra keyed by (kind, name).
///
/// Names iterate in sorted order, which keeps exports deterministic.
#[derive(Debug, Clone, Default)]
pub struct SpectrumStore {
    spectra: BTreeMap<(SpectrumKind, SpectrumOrigin), BTreeMap<String, Spectrum>>,
    processed: BTreeMap<SpectrumKind, BTreeMap<String, ProcessedSpectrum>>,
}

impl SpectrumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spectrum, replacing any previous one with the same kind, origin
    /// and name. Replacing an experimental spectrum discards its stale
    /// processed result.
    pub fn insert(&mut self, spectrum: Spectrum) -> Option<Spectrum> {
        if spectrum.origin == SpectrumOrigin::Experimental {
            if let Some(done) = self.processed.get_mut(&spectrum.kind) {
                done.remove(&spectrum.name);
            }
        }
        self.spectra
            .entry((spectrum.kind, spectrum.origin))
            .or_default()
            .insert(spectrum.name.clone(), spectrum)
    }

    pub fn get(&self, kind: SpectrumKind, origin: SpectrumOrigin, name: &str) -> Option<&Spectrum> {
        self.spectra.get(&(kind, origin))?.get(name)
    }

    /// Spectra of one kind and origin, sorted by name.
    pub fn spectra(
        &self,
        kind: SpectrumKind,
        origin: SpectrumOrigin,
    ) -> impl Iterator<Item = &Spectrum> + '_ {
        self.spectra
            .get(&(kind, origin))
            .into_iter()
            .flat_map(|by_name| by_name.values())
    }

    /// Sorted names of one kind and origin.
    pub fn names(&self, kind: SpectrumKind, origin: SpectrumOrigin) -> Vec<String> {
        self.spectra(kind, origin).map(|sp| sp.name.clone()).collect()
    }

    /// Total number of loaded spectra.
    pub fn len(&self) -> usize {
        self.spectra.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smooth the experimental spectrum `name`, take its second derivative
    /// and keep the result, replacing an earlier one.
    pub fn smoothen(
        &mut self,
        kind: SpectrumKind,
        name: &str,
        params: SavGolParams,
        onset_region: Option<OnsetRegion>,
    ) -> Result<&ProcessedSpectrum> {
        let source = self
            .get(kind, SpectrumOrigin::Experimental, name)
            .ok_or_else(|| {
                AnalysisError::invalid(format!("no experimental {kind} spectrum named \"{name}\""))
            })?;

        let out = analysis::process(&source.x, &source.y, params, onset_region)?;
        let processed = ProcessedSpectrum::from_output(source, params, out);
        log::debug!(
            "Smoothed {kind} '{name}' ({} points, window {}, polyorder {})",
            source.len(),
            params.window,
            params.polyorder
        );

        let slot = self.processed.entry(kind).or_default();
        slot.insert(name.to_string(), processed);
        slot.get(name)
            .ok_or_else(|| AnalysisError::invalid(format!("lost result for \"{name}\"")))
    }

    pub fn processed(&self, kind: SpectrumKind, name: &str) -> Option<&ProcessedSpectrum> {
        self.processed.get(&kind)?.get(name)
    }

    /// Processed results of one kind, sorted by name.
    pub fn processed_of_kind(&self, kind: SpectrumKind) -> impl Iterator<Item = &ProcessedSpectrum> + '_ {
        self.processed
            .get(&kind)
            .into_iter()
            .flat_map(|by_name| by_name.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(name: &str, kind: SpectrumKind) -> Spectrum {
        let x: Vec<f64> = (0..21).map(|i| 525.0 + i as f64 * 0.3).collect();
        let y: Vec<f64> = x.iter().map(|v| (v - 528.0).powi(2)).collect();
        Spectrum::new(name, kind, SpectrumOrigin::Experimental, x, y)
    }

    #[test]
    fn names_are_sorted_per_kind_and_origin() {
        let mut store = SpectrumStore::new();
        store.insert(exp("TEY", SpectrumKind::Xas));
        store.insert(exp("PFY", SpectrumKind::Xas));
        store.insert(exp("XES", SpectrumKind::Xes));
        assert_eq!(store.names(SpectrumKind::Xas, SpectrumOrigin::Experimental), vec!["PFY", "TEY"]);
        assert!(store.names(SpectrumKind::Xas, SpectrumOrigin::Calculated).is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn smoothen_stores_the_result() {
        let mut store = SpectrumStore::new();
        store.insert(exp("XES", SpectrumKind::Xes));
        let region = OnsetRegion::new(526.0, 533.0);
        let params = SavGolParams::new(5, 2).unwrap();
        let len = store
            .smoothen(SpectrumKind::Xes, "XES", params, Some(region))
            .unwrap()
            .smoothed
            .len();
        assert_eq!(len, 21);
        let done = store.processed(SpectrumKind::Xes, "XES").unwrap();
        assert_eq!(done.onset_region, Some(region));
        assert_eq!(done.params, params);
        assert!(store.processed(SpectrumKind::Xas, "XES").is_none());
    }

    #[test]
    fn smoothen_unknown_name_fails() {
        let mut store = SpectrumStore::new();
        let err = store
            .smoothen(SpectrumKind::Xes, "missing", SavGolParams::default(), None)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn reloading_drops_stale_result() {
        let mut store = SpectrumStore::new();
        store.insert(exp("XES", SpectrumKind::Xes));
        store
            .smoothen(SpectrumKind::Xes, "XES", SavGolParams::new(5, 2).unwrap(), None)
            .unwrap();
        let previous = store.insert(exp("XES", SpectrumKind::Xes));
        assert!(previous.is_some());
        assert!(store.processed(SpectrumKind::Xes, "XES").is_none());
    }
}
