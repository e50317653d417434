use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::model::{ProcessedSpectrum, SpectrumKind, SpectrumOrigin};
use super::store::SpectrumStore;

// ---------------------------------------------------------------------------
// Single spectrum
// ---------------------------------------------------------------------------

/// Write one processed spectrum as `energy,smoothed,second_derivative`, one
/// row per sample in grid order.
pub fn write_second_derivative<W: Write>(
    writer: W,
    processed: &ProcessedSpectrum,
    x: &[f64],
) -> Result<()> {
    if x.len() != processed.smoothed.len() {
        bail!(
            "'{}': grid has {} points but the smoothed curve has {}",
            processed.name,
            x.len(),
            processed.smoothed.len()
        );
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["energy", "smoothed", "second_derivative"])?;
    for ((xi, s), d2) in x
        .iter()
        .zip(&processed.smoothed)
        .zip(&processed.second_derivative)
    {
        out.write_record([xi.to_string(), s.to_string(), d2.to_string()])?;
    }
    out.flush().context("flushing second-derivative table")?;
    Ok(())
}

/// Write the table of one smoothed experimental spectrum to `path`.
pub fn export_spectrum(
    path: &Path,
    store: &SpectrumStore,
    kind: SpectrumKind,
    name: &str,
) -> Result<()> {
    let source = store
        .get(kind, SpectrumOrigin::Experimental, name)
        .with_context(|| format!("no experimental {kind} spectrum '{name}'"))?;
    let processed = store
        .processed(kind, name)
        .with_context(|| format!("{kind} '{name}' has not been smoothed"))?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_second_derivative(file, processed, &source.x)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {kind} '{name}' to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole analysis
// ---------------------------------------------------------------------------

/// Write `{basename}_XES.csv` and `{basename}_XAS.csv` into `dir` (created if
/// needed). Each holds every processed spectrum of that kind in long format,
/// names sorted, rows in grid order. Returns the written paths.
pub fn export_analysis(dir: &Path, basename: &str, store: &SpectrumStore) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::with_capacity(SpectrumKind::ALL.len());
    for kind in SpectrumKind::ALL {
        let path = dir.join(format!("{basename}_{}.csv", kind.tag()));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        let rows = write_kind(file, kind, store)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported {rows} {kind} rows to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Long-format table of all processed spectra of one kind. Returns the
/// number of data rows.
pub fn write_kind<W: Write>(writer: W, kind: SpectrumKind, store: &SpectrumStore) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["name", "energy", "intensity", "smoothed", "second_derivative"])?;

    let mut rows = 0;
    for processed in store.processed_of_kind(kind) {
        let source = store
            .get(kind, SpectrumOrigin::Experimental, &processed.name)
            .with_context(|| format!("source spectrum '{}' is gone", processed.name))?;
        for i in 0..source.len() {
            out.write_record([
                processed.name.clone(),
                source.x[i].to_string(),
                source.y[i].to_string(),
                processed.smoothed[i].to_string(),
                processed.second_derivative[i].to_string(),
            ])?;
            rows += 1;
        }
    }
    out.flush()?;
    Ok(rows)
}
