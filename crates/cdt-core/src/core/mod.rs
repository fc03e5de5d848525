//! # Core Module
//!
//! Fundamental building blocks of the defect analysis: data models, physical constants,
//! numerical kernels and thermodynamic formulas. Nothing in this module holds state
//! between calls.
//!
//! - **Models** ([`models`]) - Compositions, computed entries, bulk structures and parsed defects
//! - **Constants** ([`constants`]) - CODATA constants and unit conversions
//! - **Numerics** ([`math`]) - Adaptive Simpson quadrature and bracketing root finding
//! - **Thermodynamics** ([`thermo`]) - Formation energies, Boltzmann statistics, carrier densities
//! - **Corrections** ([`corrections`]) - Finite-size charge correction schemes
//! - **File I/O** ([`io`]) - Analyzer documents (JSON/TOML) and CSV tables

pub mod constants;
pub mod corrections;
pub mod io;
pub mod math;
pub mod models;
pub mod thermo;
