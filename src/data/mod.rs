//! Data layer: spectrum records, CSV loading, the spectrum store, export.
//!
//! Architecture:
//! ```text
//!  beamline / calculation .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse column pairs → Spectrum
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ SpectrumStore │  spectra by kind/origin/name, processed results
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export   │  second derivatives → delimited text
//!   └──────────┘
//! ```

pub mod export;
pub mod loader;
pub mod model;
pub mod store;
