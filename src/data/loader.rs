use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{Spectrum, SpectrumKind, SpectrumOrigin};

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

/// Delimited-text layout: leading rows to ignore and the field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvLayout {
    pub skiprows: usize,
    pub sep: char,
}

impl CsvLayout {
    /// Beamline exports carry two header lines.
    pub fn experimental() -> Self {
        CsvLayout {
            skiprows: 2,
            sep: ',',
        }
    }

    /// Broadened calculations carry a single header line.
    pub fn calculated() -> Self {
        CsvLayout {
            skiprows: 1,
            sep: ',',
        }
    }

    fn delimiter(&self) -> Result<u8> {
        u8::try_from(self.sep)
            .ok()
            .filter(|b| b.is_ascii())
            .with_context(|| format!("separator '{}' is not a single ASCII character", self.sep))
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load experimental spectra from a file of consecutive energy/intensity
/// column pairs, one pair per entry of `names`.
///
/// ```text
/// <skiprows header lines>
/// E_0, I_0, E_1, I_1, ...
/// ```
pub fn load_exp_spectra(
    path: &Path,
    kind: SpectrumKind,
    names: &[String],
    layout: CsvLayout,
) -> Result<Vec<Spectrum>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let spectra = read_spectra(file, kind, SpectrumOrigin::Experimental, names, layout)
        .with_context(|| format!("reading {}", path.display()))?;
    log::info!(
        "Loaded {} experimental {kind} spectra from {}",
        spectra.len(),
        path.display()
    );
    Ok(spectra)
}

/// Load one calculated spectrum from the first energy/intensity column pair.
pub fn load_calc_spectra(
    path: &Path,
    kind: SpectrumKind,
    name: &str,
    layout: CsvLayout,
) -> Result<Spectrum> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut spectra = read_spectra(
        file,
        kind,
        SpectrumOrigin::Calculated,
        &[name.to_string()],
        layout,
    )
    .with_context(|| format!("reading {}", path.display()))?;
    log::info!("Loaded calculated {kind} spectrum '{name}' from {}", path.display());
    spectra
        .pop()
        .with_context(|| format!("no spectrum in {}", path.display()))
}

/// Parse spectra from any reader. Cells missing or blank for a pair drop
/// that row from that pair only, so ragged columns are accepted.
pub fn read_spectra<R: Read>(
    reader: R,
    kind: SpectrumKind,
    origin: SpectrumOrigin,
    names: &[String],
    layout: CsvLayout,
) -> Result<Vec<Spectrum>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(layout.delimiter()?)
        .from_reader(reader);

    let mut columns: Vec<(Vec<f64>, Vec<f64>)> = vec![(Vec::new(), Vec::new()); names.len()];

    for (row_no, result) in csv_reader.records().enumerate().skip(layout.skiprows) {
        let record = result.with_context(|| format!("row {}", row_no + 1))?;

        for (pair, (xs, ys)) in columns.iter_mut().enumerate() {
            let x_col = 2 * pair;
            let y_col = x_col + 1;
            let (Some(x_cell), Some(y_cell)) = (record.get(x_col), record.get(y_col)) else {
                continue;
            };
            if x_cell.is_empty() || y_cell.is_empty() {
                continue;
            }
            xs.push(parse_cell(x_cell, row_no, x_col)?);
            ys.push(parse_cell(y_cell, row_no, y_col)?);
        }
    }

    names
        .iter()
        .zip(columns)
        .map(|(name, (x, y))| {
            if x.is_empty() {
                bail!("'{name}' has no samples");
            }
            Ok(Spectrum::new(name.clone(), kind, origin, x, y))
        })
        .collect()
}

fn parse_cell(tok: &str, row: usize, col: usize) -> Result<f64> {
    tok.parse::<f64>()
        .with_context(|| format!("Row {}, column {col}: '{tok}' is not a number", row + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_column_pairs_after_header_rows() {
        let text = "Ti3O5 O K\nE,TEY,E,PFY\n528.0,1.0,528.0,2.0\n528.1,1.5,528.1,2.5\n";
        let spectra = read_spectra(
            text.as_bytes(),
            SpectrumKind::Xas,
            SpectrumOrigin::Experimental,
            &names(&["TEY", "PFY"]),
            CsvLayout::experimental(),
        )
        .unwrap();
        assert_eq!(spectra.len(), 2);
        assert_eq!(spectra[0].name, "TEY");
        assert_eq!(spectra[0].x, vec![528.0, 528.1]);
        assert_eq!(spectra[1].y, vec![2.0, 2.5]);
        assert_eq!(spectra[1].origin, SpectrumOrigin::Experimental);
    }

    #[test]
    fn ragged_columns_are_trimmed_per_pair() {
        let text = "h\n1,10,1,20\n2,11,,\n3,12\n";
        let spectra = read_spectra(
            text.as_bytes(),
            SpectrumKind::Xes,
            SpectrumOrigin::Experimental,
            &names(&["a", "b"]),
            CsvLayout::calculated(),
        )
        .unwrap();
        assert_eq!(spectra[0].x, vec![1.0, 2.0, 3.0]);
        assert_eq!(spectra[1].x, vec![1.0]);
    }

    #[test]
    fn custom_separator() {
        let text = "energy;intensity\n1.0;2.0\n2.0;3.0\n";
        let layout = CsvLayout {
            skiprows: 1,
            sep: ';',
        };
        let spectra = read_spectra(
            text.as_bytes(),
            SpectrumKind::Xes,
            SpectrumOrigin::Calculated,
            &names(&["calc"]),
            layout,
        )
        .unwrap();
        assert_eq!(spectra[0].y, vec![2.0, 3.0]);
    }

    #[test]
    fn non_numeric_cell_reports_row_and_column() {
        let text = "h\n1,abc\n";
        let err = read_spectra(
            text.as_bytes(),
            SpectrumKind::Xes,
            SpectrumOrigin::Calculated,
            &names(&["calc"]),
            CsvLayout::calculated(),
        )
        .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 2, column 1"), "{msg}");
    }

    #[test]
    fn missing_pair_is_an_error() {
        let text = "h\n1,2\n";
        let err = read_spectra(
            text.as_bytes(),
            SpectrumKind::Xes,
            SpectrumOrigin::Experimental,
            &names(&["a", "b"]),
            CsvLayout::calculated(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("'b' has no samples"));
    }
}
