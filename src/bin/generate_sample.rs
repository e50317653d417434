use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use bandgap_viewer::analysis::OnsetRegion;
use bandgap_viewer::config::{LoadJob, PlotSelection, PlotSettings, Session, SmoothJob};
use bandgap_viewer::data::model::SpectrumKind;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Sum of Gaussian peaks `(centre, width, amplitude)` plus noise.
fn generate_spectrum(
    energies: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    energies
        .iter()
        .map(|&e| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(e, mu, sigma, amp))
                .sum();
            signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Monochromator-style grid: nominal `step` with up to ±30 % jitter.
fn jittered_grid(start: f64, end: f64, step: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut e = start;
    while e <= end {
        grid.push(e);
        e += step * (0.7 + 0.6 * rng.next_f64());
    }
    grid
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Write `headers` lines followed by energy/intensity column pairs.
/// Shorter columns leave their trailing cells blank.
fn write_columns(path: &Path, headers: &[&str], columns: &[(&[f64], &[f64])]) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for line in headers {
        out.write_record(line.split(','))?;
    }

    let rows = columns.iter().map(|(x, _)| x.len()).max().unwrap_or(0);
    for row in 0..rows {
        let mut record = Vec::with_capacity(columns.len() * 2);
        for (x, y) in columns {
            match (x.get(row), y.get(row)) {
                (Some(xi), Some(yi)) => {
                    record.push(format!("{xi:.4}"));
                    record.push(format!("{yi:.6}"));
                }
                _ => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        out.write_record(&record)?;
    }
    out.flush()?;
    log::info!("Wrote {rows} rows to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // Emission: valence band of an oxide, O K-edge.
    let xes_peaks = [(526.5, 1.2, 0.9), (524.0, 1.5, 0.6), (520.5, 2.0, 0.2)];
    let xes_x = jittered_grid(512.0, 536.0, 0.1, &mut rng);
    let xes_y = generate_spectrum(&xes_x, &xes_peaks, 0.02, &mut rng);

    // Absorption: pre-edge doublet then the main edge.
    let xas_peaks = [(530.8, 0.6, 0.8), (533.2, 0.8, 0.6), (540.0, 3.0, 1.0)];
    let xas_x = jittered_grid(518.0, 548.0, 0.1, &mut rng);
    let tey = generate_spectrum(&xas_x, &xas_peaks, 0.03, &mut rng);
    let pfy = generate_spectrum(&xas_x, &xas_peaks, 0.015, &mut rng);

    // Calculations: uniform grid, no noise.
    let calc_xes_x: Vec<f64> = (0..=240).map(|i| 512.0 + i as f64 * 0.1).collect();
    let calc_xes_y = generate_spectrum(&calc_xes_x, &xes_peaks, 0.0, &mut rng);
    let calc_xas_x: Vec<f64> = (0..=300).map(|i| 518.0 + i as f64 * 0.1).collect();
    let calc_xas_y = generate_spectrum(&calc_xas_x, &xas_peaks, 0.0, &mut rng);

    write_columns(
        &out_dir.join("sample_O_XES.csv"),
        &["sample O K XES (synthetic)", "energy,XES"],
        &[(&xes_x[..], &xes_y[..])],
    )?;
    write_columns(
        &out_dir.join("sample_O_XAS.csv"),
        &["sample O K XAS (synthetic)", "energy,TEY,energy,PFY"],
        &[(&xas_x[..], &tey[..]), (&xas_x[..], &pfy[..])],
    )?;
    write_columns(
        &out_dir.join("sample-calc_O_XES.csv"),
        &["energy,intensity"],
        &[(&calc_xes_x[..], &calc_xes_y[..])],
    )?;
    write_columns(
        &out_dir.join("sample-calc_O_XAS.csv"),
        &["energy,intensity"],
        &[(&calc_xas_x[..], &calc_xas_y[..])],
    )?;

    let mut plot = PlotSettings::default();
    plot.set_title("Synthetic Bandgap Analysis");
    plot.set_xlims(Some([515.0, 535.0]), Some([520.0, 545.0]));

    let session = Session {
        loads: vec![
            LoadJob::Experimental {
                path: "sample_O_XES.csv".into(),
                kind: SpectrumKind::Xes,
                names: vec!["XES".into()],
                skiprows: 2,
                sep: ',',
            },
            LoadJob::Experimental {
                path: "sample_O_XAS.csv".into(),
                kind: SpectrumKind::Xas,
                names: vec!["TEY".into(), "PFY".into()],
                skiprows: 2,
                sep: ',',
            },
            LoadJob::Calculated {
                path: "sample-calc_O_XES.csv".into(),
                kind: SpectrumKind::Xes,
                name: "XES calc".into(),
                skiprows: 1,
                sep: ',',
            },
            LoadJob::Calculated {
                path: "sample-calc_O_XAS.csv".into(),
                kind: SpectrumKind::Xas,
                name: "XAS calc".into(),
                skiprows: 1,
                sep: ',',
            },
        ],
        smoothing: vec![
            SmoothJob {
                kind: SpectrumKind::Xes,
                name: "XES".into(),
                window: 15,
                polyorder: 3,
                onset_region: Some(OnsetRegion::new(524.0, 530.0)),
            },
            SmoothJob {
                kind: SpectrumKind::Xas,
                name: "TEY".into(),
                window: 15,
                polyorder: 3,
                onset_region: Some(OnsetRegion::new(529.0, 532.0)),
            },
            SmoothJob {
                kind: SpectrumKind::Xas,
                name: "PFY".into(),
                window: 15,
                polyorder: 3,
                onset_region: Some(OnsetRegion::new(529.0, 532.0)),
            },
        ],
        selection: PlotSelection {
            xas_exp: Some(vec!["PFY".into()]),
            ..PlotSelection::default()
        },
        plot,
    };

    let session_path = out_dir.join("session.json");
    let file = std::fs::File::create(&session_path)
        .with_context(|| format!("creating {}", session_path.display()))?;
    serde_json::to_writer_pretty(file, &session).context("writing session")?;

    println!(
        "Wrote sample spectra and {} ({} XES / {} XAS points)",
        session_path.display(),
        xes_x.len(),
        xas_x.len()
    );
    Ok(())
}
