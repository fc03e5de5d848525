use super::ModelError;
use super::entry::ComputedEntry;
use serde::{Deserialize, Serialize};

/// A single charged-defect supercell calculation, ready for thermodynamic analysis.
///
/// `site` is the fractional position of the defect in the bulk supercell; it is used to
/// look up the number of equivalent sites unless `multiplicity` is given explicitly
/// (interstitials, complexes, or any position that is not a bulk site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDefect {
    pub name: String,
    pub charge: i32,
    pub site: [f64; 3],
    /// Finite-size charge correction in eV, added to the formation energy.
    #[serde(default)]
    pub charge_correction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<usize>,
    /// Shift in eV accumulated by band-gap corrections that move this level with a band edge.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub level_shift: f64,
    pub entry: ComputedEntry,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

impl ParsedDefect {
    pub fn new(name: impl Into<String>, charge: i32, entry: ComputedEntry, site: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            charge,
            entry,
            site,
            charge_correction: 0.0,
            multiplicity: None,
            level_shift: 0.0,
        }
    }

    pub fn with_charge_correction(mut self, correction: f64) -> Self {
        self.charge_correction = correction;
        self
    }

    /// Sets an explicit number of equivalent sites, bypassing the bulk lookup.
    pub fn with_multiplicity(mut self, multiplicity: usize) -> Result<Self, ModelError> {
        if multiplicity == 0 {
            return Err(ModelError::ZeroMultiplicity);
        }
        self.multiplicity = Some(multiplicity);
        Ok(self)
    }

    /// The defect name qualified with its charge, e.g. `vac_O_2`.
    pub fn full_name(&self) -> String {
        format!("{}_{}", self.name, self.charge)
    }
}

/// Which band edge a defect level follows when the band gap is corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BandEdgeKind {
    /// The level is derived from valence-band states and moves with the VBM.
    VbmLike,
    /// The level is derived from conduction-band states and moves with the CBM.
    CbmLike,
}

/// How the levels of a defect move when the band edges are shifted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LevelAlignment {
    pub kind: BandEdgeKind,
    /// Formal charge of the state whose energy does not move with the edge.
    pub formal_charge: i32,
}

impl LevelAlignment {
    /// Formation-energy shift of a charge state for the given edge shifts
    /// (both positive when the gap opens).
    pub fn shift(&self, charge: i32, vbm_shift: f64, cbm_shift: f64) -> f64 {
        match self.kind {
            BandEdgeKind::VbmLike => f64::from(charge - self.formal_charge) * vbm_shift,
            BandEdgeKind::CbmLike => f64::from(self.formal_charge - charge) * cbm_shift,
        }
    }
}
