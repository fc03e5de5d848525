//! # Engine Module
//!
//! The stateful layer of the defect analysis. [`analyzer::DefectsAnalyzer`] owns the bulk
//! reference, band edges, chemical potentials and parsed defects and keeps the formation
//! energies consistent with them; the charge-balance evaluator turns those energies into the
//! net charge the Fermi-level solvers drive to zero.
//!
//! - **Analysis State** ([`analyzer`]) - Formation energies, band-gap corrections, transition levels
//! - **Configuration** ([`config`]) - Carrier, solver and temperature settings with builders
//! - **Results** ([`state`]) - Concentration, level and profile records
//! - **Progress Monitoring** ([`progress`]) - Phase reporting for front ends
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod analyzer;
pub(crate) mod charge_balance;
pub mod config;
pub mod error;
pub mod progress;
pub mod state;
