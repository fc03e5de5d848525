use super::ThermoError;
use crate::core::models::composition::Composition;
use std::collections::BTreeMap;

/// `Σ_el (n_bulk,el − n_defect,el) · μ_el`, the energy of the atoms exchanged with the
/// reservoirs when the defect is formed.
///
/// Elements whose amount does not change need no chemical potential.
///
/// # Errors
///
/// Returns [`ThermoError::MissingChemicalPotential`] for an exchanged element without one.
pub fn reservoir_energy(
    bulk: &Composition,
    defect: &Composition,
    chemical_potentials: &BTreeMap<String, f64>,
) -> Result<f64, ThermoError> {
    bulk.union_elements(defect)
        .into_iter()
        .try_fold(0.0, |sum, element| -> Result<f64, ThermoError> {
            let coefficient = bulk.amount(element) - defect.amount(element);
            if coefficient == 0.0 {
                return Ok(sum);
            }
            let mu = chemical_potentials
                .get(element)
                .ok_or_else(|| ThermoError::MissingChemicalPotential(element.to_string()))?;
            Ok(sum + coefficient * mu)
        })
}

/// Formation energy of a charge state at `fermi_level`, given its value at the VBM.
#[inline]
pub fn at_fermi_level(energy_at_vbm: f64, charge: i32, fermi_level: f64) -> f64 {
    energy_at_vbm + f64::from(charge) * fermi_level
}

/// Fermi level at which the formation-energy lines of two charge states cross.
///
/// Returns `None` for equal charges (parallel lines).
#[inline]
pub fn crossing_point(energy_a: f64, charge_a: i32, energy_b: f64, charge_b: i32) -> Option<f64> {
    if charge_a == charge_b {
        return None;
    }
    Some((energy_b - energy_a) / f64::from(charge_a - charge_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mus() -> BTreeMap<String, f64> {
        BTreeMap::from([("Zn".to_string(), -1.5), ("O".to_string(), -4.9)])
    }

    #[test]
    fn vacancy_adds_removed_atom_chemical_potential() {
        let bulk = Composition::from_pairs([("Zn", 16.0), ("O", 16.0)]).unwrap();
        let defect = Composition::from_pairs([("Zn", 16.0), ("O", 15.0)]).unwrap();
        let value = reservoir_energy(&bulk, &defect, &mus()).unwrap();
        assert!((value - -4.9).abs() < 1e-12);
    }

    #[test]
    fn element_missing_from_defect_is_counted() {
        let bulk = Composition::from_pairs([("Zn", 1.0), ("O", 1.0)]).unwrap();
        let defect = Composition::from_pairs([("Zn", 1.0)]).unwrap();
        let value = reservoir_energy(&bulk, &defect, &mus()).unwrap();
        assert!((value - -4.9).abs() < 1e-12);
    }

    #[test]
    fn substitution_needs_the_dopant_potential() {
        let bulk = Composition::from_pairs([("Zn", 16.0), ("O", 16.0)]).unwrap();
        let defect = Composition::from_pairs([("Zn", 16.0), ("O", 15.0), ("N", 1.0)]).unwrap();
        let err = reservoir_energy(&bulk, &defect, &mus()).unwrap_err();
        assert_eq!(err, ThermoError::MissingChemicalPotential("N".into()));
    }

    #[test]
    fn unchanged_elements_need_no_potential() {
        let bulk = Composition::from_pairs([("Ga", 32.0), ("As", 32.0)]).unwrap();
        let value = reservoir_energy(&bulk, &bulk.clone(), &BTreeMap::new()).unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn crossing_of_two_lines() {
        // 1.0 + 2x = 2.0 + 0x at x = 0.5
        assert_eq!(crossing_point(1.0, 2, 2.0, 0), Some(0.5));
        assert_eq!(crossing_point(1.0, 1, 2.0, 1), None);
    }

    #[test]
    fn formation_energy_is_linear_in_fermi_level() {
        assert!((at_fermi_level(1.2, -2, 0.4) - 0.4).abs() < 1e-12);
    }
}
