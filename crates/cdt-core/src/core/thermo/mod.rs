//! # Thermodynamics Module
//!
//! Closed-form and quadrature expressions for the quantities the defect analysis is built
//! from. Every function here is pure: the stateful bookkeeping lives in
//! [`crate::engine::analyzer`].
//!
//! - [`formation`] - Chemical-potential bookkeeping and formation-energy lines
//! - [`concentration`] - Site densities and Boltzmann occupation of defect states
//! - [`carriers`] - Parabolic-band electron and hole densities

pub mod carriers;
pub mod concentration;
pub mod formation;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThermoError {
    #[error("No chemical potential given for element '{0}'")]
    MissingChemicalPotential(String),

    #[error("Temperature must be positive and finite, got {0} K")]
    InvalidTemperature(f64),

    #[error("Effective mass components must be positive and finite, got {0:?}")]
    InvalidEffectiveMass([f64; 3]),

    #[error("Bulk volume must be positive, got {0} Å³")]
    InvalidVolume(f64),
}

/// Rejects non-physical temperatures before they reach a Boltzmann factor.
pub fn check_temperature(temperature: f64) -> Result<f64, ThermoError> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(temperature)
    } else {
        Err(ThermoError::InvalidTemperature(temperature))
    }
}
