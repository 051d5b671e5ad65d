//! # NEX/FCA Reconciliation
//!
//! Field-by-field reconciliation of trades exported from the NEX venue
//! against the same transactions as reported to the FCA.
//!
//! ## Features
//!
//! - **Record normalization**: whitespace stripping and transaction key canonicalization with data-quality flags
//! - **Declarative field mapping**: the ten standard checks expressed as data, not branches
//! - **Typed comparison rules**: exact text, date suffix tolerance, rounded decimals with treasury bill fallback, boolean truthiness
//! - **Left join with fan-out**: every NEX record is kept, duplicates and multi-matches included
//! - **Summary**: mismatch counts per check, row totals and date ranges per side
//! - **Adapters**: NEX CSV exports, the FCA XML report, and workbook or chunked CSV output behind small traits
//!
//! ## Quick Start
//!
//! ```rust
//! use nex_fca_recon::ReconciliationEngine;
//!
//! let engine = ReconciliationEngine::new();
//! // let report = engine.run(nex_records, fca_records)?;
//! assert_eq!(engine.mapping().mappings.len(), 10);
//! ```

pub mod config;
pub mod io;
pub mod logging;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::ReconConfig;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
