//! # Workflows Module
//!
//! High-level procedures that turn a configured [`DefectsAnalyzer`](crate::engine::analyzer::DefectsAnalyzer)
//! into a self-consistent Fermi level and the matching defect and carrier populations.
//!
//! ## Overview
//!
//! Both workflows solve the charge-neutrality condition `Q_D(E_F) + Q_i(E_F) = 0` by
//! bisection, where `Q_D = Σ q·c` is the charge carried by defects and `Q_i = p − n` the
//! charge of free carriers. They differ in which quantities are allowed to re-equilibrate:
//!
//! - **Equilibrium** ([`equilibrium`]) - Every charge state of every defect sits at its own
//!   Boltzmann concentration for the given temperature.
//! - **Quench** ([`quench`]) - Defect populations equilibrate at a synthesis temperature and
//!   are frozen in; at the operating temperature only the distribution over charge states
//!   and the free carriers adjust.
//!
//! Progress is reported per phase through a [`ProgressReporter`](crate::engine::progress::ProgressReporter).

pub mod equilibrium;
pub mod quench;
