//! Bandgap analysis of X-ray emission and absorption spectra.
//!
//! Experimental XES/XAS curves are smoothed with a Savitzky-Golay filter that
//! works on irregular energy grids, differentiated twice, and compared with
//! calculated spectra. The viewer binary draws the classic 2x2 figure:
//! spectra on top, second derivatives below, emission left, absorption right.
//!
//! ```rust
//! use bandgap_viewer::analysis::{process, SavGolParams};
//!
//! let x: Vec<f64> = (0..40).map(|i| 525.0 + 0.2 * i as f64).collect();
//! let y: Vec<f64> = x.iter().map(|e| (-(e - 529.0_f64).powi(2)).exp()).collect();
//! let out = process(&x, &y, SavGolParams::new(7, 3).unwrap(), None).unwrap();
//! assert_eq!(out.second_derivative.len(), x.len());
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;

pub use error::{AnalysisError, Result};
