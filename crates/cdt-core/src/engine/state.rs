use serde::{Deserialize, Serialize};

/// Concentration of one charge state of a defect, in m⁻³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectConcentration {
    pub name: String,
    pub charge: i32,
    pub concentration: f64,
}

impl DefectConcentration {
    /// Charge density contributed by this state, in e·m⁻³.
    #[inline]
    pub fn charge_density(&self) -> f64 {
        f64::from(self.charge) * self.concentration
    }
}

/// Concentration of a defect summed over its charge states, in m⁻³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectTotal {
    pub name: String,
    pub concentration: f64,
}

/// Sums concentrations per defect name, in order of first appearance.
pub fn totals_by_name(concentrations: &[DefectConcentration]) -> Vec<DefectTotal> {
    let mut totals: Vec<DefectTotal> = Vec::new();
    for c in concentrations {
        match totals.iter_mut().find(|t| t.name == c.name) {
            Some(total) => total.concentration += c.concentration,
            None => totals.push(DefectTotal {
                name: c.name.clone(),
                concentration: c.concentration,
            }),
        }
    }
    totals
}

/// Fermi level (eV above the VBM) where the formation energies of two charge states of
/// a defect are equal. `charges.0` is the higher charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionLevel {
    pub name: String,
    pub charges: (i32, i32),
    pub fermi_level: f64,
}

/// One sample of the lowest formation energy of a defect over its charge states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub fermi_level: f64,
    pub formation_energy: f64,
    /// The charge state with the lowest formation energy at this Fermi level.
    pub charge: i32,
}

/// Flat row form of a [`TransitionLevel`] for CSV output.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionLevelRow<'a> {
    pub name: &'a str,
    pub charge_from: i32,
    pub charge_to: i32,
    pub fermi_level: f64,
}

impl<'a> From<&'a TransitionLevel> for TransitionLevelRow<'a> {
    fn from(level: &'a TransitionLevel) -> Self {
        Self {
            name: &level.name,
            charge_from: level.charges.0,
            charge_to: level.charges.1,
            fermi_level: level.fermi_level,
        }
    }
}
