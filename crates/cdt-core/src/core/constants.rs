//! Physical constants and unit conversions (CODATA 2018).
//!
//! Energies inside the library are in eV, lengths in Å and concentrations in m⁻³;
//! the SI values below are only used to build the carrier density-of-states prefactor.

/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

/// Reduced Planck constant in J·s.
pub const HBAR_JS: f64 = 1.054_571_817e-34;

/// Free-electron rest mass in kg.
pub const ELECTRON_MASS_KG: f64 = 9.109_383_701_5e-31;

/// Elementary charge in C (also J per eV).
pub const ELEMENTARY_CHARGE_C: f64 = 1.602_176_634e-19;

/// `e² / (4π ε₀)` in eV·Å, the Coulomb energy of two unit charges 1 Å apart.
pub const COULOMB_EV_ANGSTROM: f64 = 14.399_645_478;

/// Number of Å³ in one m³.
pub const ANGSTROM3_PER_M3: f64 = 1e30;

/// Thermal energy `k_B T` in eV.
#[inline]
pub fn thermal_energy(temperature: f64) -> f64 {
    BOLTZMANN_EV * temperature
}
