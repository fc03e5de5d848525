//! Finite-size charge corrections for charged supercells.
//!
//! Full electrostatic schemes (Freysoldt, Kumagai) need the electrostatic potentials of
//! both calculations and are computed by external tools; their results enter through
//! [`TabulatedCorrection`]. [`PointChargeCorrection`] provides the leading Makov–Payne
//! image-charge term for quick estimates.

use crate::core::constants::COULOMB_EV_ANGSTROM;
use crate::core::models::defect::ParsedDefect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CorrectionError {
    #[error("No tabulated correction for '{0}'")]
    MissingEntry(String),

    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// A scheme that produces the energy correction (eV) of a charged defect calculation.
pub trait ChargeCorrection {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn correction(&self, defect: &ParsedDefect) -> Result<f64, CorrectionError>;
}

/// Leading-order image-charge correction `q² α_M e² / (2 ε L)` for a point charge in a
/// uniform compensating background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PointChargeCorrection {
    /// Madelung constant of the supercell lattice, referred to `supercell_length`.
    pub madelung_constant: f64,
    /// Static dielectric constant of the host.
    pub dielectric: f64,
    /// Supercell length `L` in Å.
    pub supercell_length: f64,
}

impl PointChargeCorrection {
    pub fn new(madelung_constant: f64, dielectric: f64, supercell_length: f64) -> Result<Self, CorrectionError> {
        if !(dielectric.is_finite() && dielectric > 0.0) {
            return Err(CorrectionError::InvalidParameter {
                name: "dielectric",
                value: dielectric,
            });
        }
        if !(supercell_length.is_finite() && supercell_length > 0.0) {
            return Err(CorrectionError::InvalidParameter {
                name: "supercell_length",
                value: supercell_length,
            });
        }
        Ok(Self {
            madelung_constant,
            dielectric,
            supercell_length,
        })
    }
}

impl ChargeCorrection for PointChargeCorrection {
    fn name(&self) -> &'static str {
        "point-charge"
    }

    fn correction(&self, defect: &ParsedDefect) -> Result<f64, CorrectionError> {
        let q = f64::from(defect.charge);
        Ok(q * q * self.madelung_constant * COULOMB_EV_ANGSTROM
            / (2.0 * self.dielectric * self.supercell_length))
    }
}

/// Corrections computed elsewhere, keyed by the defect's full name (`name_charge`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabulatedCorrection(BTreeMap<String, f64>);

impl TabulatedCorrection {
    pub fn insert(&mut self, full_name: impl Into<String>, value: f64) {
        self.0.insert(full_name.into(), value);
    }
}

impl ChargeCorrection for TabulatedCorrection {
    fn name(&self) -> &'static str {
        "tabulated"
    }

    fn correction(&self, defect: &ParsedDefect) -> Result<f64, CorrectionError> {
        let key = defect.full_name();
        self.0
            .get(&key)
            .copied()
            .ok_or(CorrectionError::MissingEntry(key))
    }
}
