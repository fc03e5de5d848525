use super::{ThermoError, check_temperature};
use crate::core::constants::{
    ELECTRON_MASS_KG, ELEMENTARY_CHARGE_C, HBAR_JS, thermal_energy,
};
use crate::core::math::quadrature::{DEFAULT_PANELS, integrate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Principal components of a band effective-mass tensor, in units of the free-electron mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct EffectiveMass([f64; 3]);

impl EffectiveMass {
    pub fn new(components: [f64; 3]) -> Result<Self, ThermoError> {
        if components.iter().all(|m| m.is_finite() && *m > 0.0) {
            Ok(Self(components))
        } else {
            Err(ThermoError::InvalidEffectiveMass(components))
        }
    }

    pub fn isotropic(mass: f64) -> Result<Self, ThermoError> {
        Self::new([mass; 3])
    }

    pub fn components(&self) -> [f64; 3] {
        self.0
    }

    /// Density-of-states mass `(m₁ m₂ m₃)^{1/3}`.
    pub fn density_of_states_mass(&self) -> f64 {
        (self.0[0] * self.0[1] * self.0[2]).cbrt()
    }
}

impl TryFrom<[f64; 3]> for EffectiveMass {
    type Error = ThermoError;

    fn try_from(components: [f64; 3]) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl From<EffectiveMass> for [f64; 3] {
    fn from(mass: EffectiveMass) -> Self {
        mass.0
    }
}

/// Free-carrier densities in m⁻³.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierDensities {
    pub electrons: f64,
    pub holes: f64,
}

impl CarrierDensities {
    /// Net carrier charge in units of e per m³: holes count positive, electrons negative.
    #[inline]
    pub fn net_charge(&self) -> f64 {
        self.holes - self.electrons
    }
}

/// Two-fold occupancy weight applied to the band integrands on top of the spin-summed
/// parabolic density of states.
pub const SPIN_DEGENERACY: f64 = 2.0;

/// Prefactor `2 · √2 m_d^{3/2} (m_e e)^{3/2} / (π² ħ³)` of the band integrands, so that
/// `g(E) = prefactor · √(E − E_edge)` in m⁻³ eV⁻¹ with `E` in eV.
pub fn dos_prefactor(mass: &EffectiveMass) -> f64 {
    let m_d = mass.density_of_states_mass();
    let unit = (ELECTRON_MASS_KG * ELEMENTARY_CHARGE_C).powf(1.5) / HBAR_JS.powi(3);
    SPIN_DEGENERACY * 2f64.sqrt() / (PI * PI) * m_d.powf(1.5) * unit
}

/// Fermi–Dirac occupation `1 / (1 + exp(x))` with `x = (E − E_F) / k_B T`, evaluated
/// without overflow for large `|x|`.
#[inline]
pub fn occupation(x: f64) -> f64 {
    if x > 0.0 {
        let e = (-x).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + x.exp())
    }
}

/// Conduction-band electron density for a Fermi level `fermi_level` (relative to the VBM).
///
/// Integrates `g_c(E) f(E)` over `[band_gap, band_gap + window]`. The substitution
/// `E = E_c + u²` removes the square-root singularity at the band edge.
pub fn electron_density(
    fermi_level: f64,
    band_gap: f64,
    temperature: f64,
    mass: &EffectiveMass,
    window: f64,
) -> Result<f64, ThermoError> {
    let kt = thermal_energy(check_temperature(temperature)?);
    let offset = band_gap - fermi_level;
    let integral = integrate(
        |u| {
            let u2 = u * u;
            2.0 * u2 * occupation((offset + u2) / kt)
        },
        0.0,
        window.max(0.0).sqrt(),
        DEFAULT_PANELS,
        RELATIVE_TOLERANCE,
    );
    Ok(dos_prefactor(mass) * integral)
}

/// Valence-band hole density for a Fermi level `fermi_level` (relative to the VBM).
///
/// Integrates `g_v(E) (1 − f(E))` over `[−window, 0]`.
pub fn hole_density(
    fermi_level: f64,
    temperature: f64,
    mass: &EffectiveMass,
    window: f64,
) -> Result<f64, ThermoError> {
    let kt = thermal_energy(check_temperature(temperature)?);
    let integral = integrate(
        |u| {
            let u2 = u * u;
            2.0 * u2 * occupation((fermi_level + u2) / kt)
        },
        0.0,
        window.max(0.0).sqrt(),
        DEFAULT_PANELS,
        RELATIVE_TOLERANCE,
    );
    Ok(dos_prefactor(mass) * integral)
}

/// Electron and hole densities for a Fermi level.
pub fn carrier_densities(
    fermi_level: f64,
    band_gap: f64,
    temperature: f64,
    electron_mass: &EffectiveMass,
    hole_mass: &EffectiveMass,
    window: f64,
) -> Result<CarrierDensities, ThermoError> {
    Ok(CarrierDensities {
        electrons: electron_density(fermi_level, band_gap, temperature, electron_mass, window)?,
        holes: hole_density(fermi_level, temperature, hole_mass, window)?,
    })
}
