//! # chargedefects Core Library
//!
//! Thermodynamics of charged point defects in crystalline solids, computed from
//! first-principles total energies: formation energies as a function of the Fermi
//! level, charge-state transition levels, and self-consistent (equilibrium or
//! quenched) Fermi levels with the matching defect and carrier concentrations.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ComputedEntry`, `BulkStructure`,
//!   `ParsedDefect`), physical constants, numerical kernels (adaptive quadrature, bisection),
//!   closed-form thermodynamics and serde-based I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful `DefectsAnalyzer` that keeps formation
//!   energies consistent with its inputs, the charge-balance evaluation used by the solvers,
//!   configuration builders and error types.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as the equilibrium Fermi-level
//!   solve and the synthesis/quench (non-equilibrium) solve.
//!
//! Energies are in eV with the Fermi level referenced to the valence-band maximum,
//! temperatures in K and concentrations in m⁻³.

pub mod core;
pub mod engine;
pub mod workflows;
