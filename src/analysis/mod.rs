//! Numerical core: smoothing and derivative features.
//!
//! ```text
//!   raw (x, y)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  savgol   │  local polynomial fit per sample → smoothed y
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ gradient  │  non-uniform central difference, applied twice
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ features  │  normalisation, second-derivative peaks
//!   └──────────┘
//! ```
//!
//! Nothing in here performs I/O or logs.

pub mod features;
pub mod gradient;
pub mod pipeline;
pub mod savgol;

pub use pipeline::{process, DerivativeOutput, OnsetRegion};
pub use savgol::{smooth, smooth_derivative, window_bounds, NonUniformSavGol, SavGolParams};
