use super::{ThermoError, check_temperature};
use crate::core::constants::{ANGSTROM3_PER_M3, thermal_energy};

/// Density of available defect sites in m⁻³.
pub fn site_density(multiplicity: usize, volume: f64) -> Result<f64, ThermoError> {
    if !(volume.is_finite() && volume > 0.0) {
        return Err(ThermoError::InvalidVolume(volume));
    }
    Ok(multiplicity as f64 * ANGSTROM3_PER_M3 / volume)
}

/// Dilute-limit concentration `N · exp(−E_f / k_B T)` in m⁻³.
pub fn boltzmann_concentration(
    site_density: f64,
    formation_energy: f64,
    temperature: f64,
) -> Result<f64, ThermoError> {
    let kt = thermal_energy(check_temperature(temperature)?);
    Ok(site_density * (-formation_energy / kt).exp())
}

/// Normalised Boltzmann weights `exp(−E_i / k_B T) / Σ_j exp(−E_j / k_B T)`.
///
/// Energies are shifted by their minimum first, so large formation energies do not
/// underflow every weight to zero.
pub fn boltzmann_weights(energies: &[f64], temperature: f64) -> Result<Vec<f64>, ThermoError> {
    let kt = thermal_energy(check_temperature(temperature)?);
    let min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return Ok(vec![0.0; energies.len()]);
    }
    let raw: Vec<f64> = energies.iter().map(|e| (-(e - min) / kt).exp()).collect();
    let total: f64 = raw.iter().sum();
    Ok(raw.into_iter().map(|w| w / total).collect())
}
