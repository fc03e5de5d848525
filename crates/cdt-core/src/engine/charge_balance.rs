use super::analyzer::DefectsAnalyzer;
use super::config::{CarrierConfig, SolverConfig};
use super::error::EngineError;
use super::state::{DefectConcentration, DefectTotal};
use crate::core::math::{BisectionOptions, Root, bisect};
use crate::core::thermo::carriers::{self, CarrierDensities};
use crate::core::thermo::{concentration, formation};
use tracing::debug;

/// Evaluates the net charge of the defect/carrier system for trial Fermi levels.
///
/// Site densities are resolved once at construction; every other quantity is recomputed per
/// call so the solver sees a pure function of the Fermi level.
pub struct ChargeBalance<'a> {
    analyzer: &'a DefectsAnalyzer,
    carriers: &'a CarrierConfig,
    site_densities: Vec<f64>,
}

impl<'a> ChargeBalance<'a> {
    pub fn new(analyzer: &'a DefectsAnalyzer, carriers: &'a CarrierConfig) -> Result<Self, EngineError> {
        let site_densities = analyzer.site_densities()?;
        Ok(Self {
            analyzer,
            carriers,
            site_densities,
        })
    }

    pub fn carriers(&self, fermi_level: f64, temperature: f64) -> Result<CarrierDensities, EngineError> {
        Ok(carriers::carrier_densities(
            fermi_level,
            self.analyzer.band_gap(),
            temperature,
            &self.carriers.electron_mass,
            &self.carriers.hole_mass,
            self.carriers.integration_window,
        )?)
    }

    pub fn concentrations(&self, fermi_level: f64, temperature: f64) -> Result<Vec<DefectConcentration>, EngineError> {
        self.analyzer
            .concentrations_with(&self.site_densities, temperature, fermi_level)
    }

    /// `Q_D + Q_i` in equilibrium: every charge state at its own Boltzmann concentration.
    pub fn net_charge(&self, fermi_level: f64, temperature: f64) -> Result<f64, EngineError> {
        let defects = defect_charge(&self.concentrations(fermi_level, temperature)?);
        let carriers = self.carriers(fermi_level, temperature)?.net_charge();
        Ok(defects + carriers)
    }

    /// Splits each frozen total over the charge states of that defect with Boltzmann weights
    /// at `temperature`, normalised per defect name.
    ///
    /// The result is in defect order. Names missing from `totals` get zero concentration.
    pub fn redistribute(
        &self,
        totals: &[DefectTotal],
        fermi_level: f64,
        temperature: f64,
    ) -> Result<Vec<DefectConcentration>, EngineError> {
        let defects = self.analyzer.defects();
        let energies: Vec<f64> = defects
            .iter()
            .zip(self.analyzer.formation_energies())
            .map(|(d, e)| formation::at_fermi_level(*e, d.charge, fermi_level))
            .collect();

        let mut result: Vec<DefectConcentration> = defects
            .iter()
            .map(|d| DefectConcentration {
                name: d.name.clone(),
                charge: d.charge,
                concentration: 0.0,
            })
            .collect();

        for total in totals {
            let members: Vec<usize> = defects
                .iter()
                .enumerate()
                .filter(|(_, d)| d.name == total.name)
                .map(|(i, _)| i)
                .collect();
            let member_energies: Vec<f64> = members.iter().map(|&i| energies[i]).collect();
            let weights = concentration::boltzmann_weights(&member_energies, temperature)?;
            for (i, w) in members.into_iter().zip(weights) {
                result[i].concentration = total.concentration * w;
            }
        }
        Ok(result)
    }

    /// Net charge with defect totals held fixed and only charge states re-equilibrated.
    pub fn frozen_net_charge(
        &self,
        totals: &[DefectTotal],
        fermi_level: f64,
        temperature: f64,
    ) -> Result<f64, EngineError> {
        let defects = defect_charge(&self.redistribute(totals, fermi_level, temperature)?);
        let carriers = self.carriers(fermi_level, temperature)?.net_charge();
        Ok(defects + carriers)
    }
}

/// `Q_D = Σ q·c` in e·m⁻³.
pub fn defect_charge(concentrations: &[DefectConcentration]) -> f64 {
    concentrations.iter().map(DefectConcentration::charge_density).sum()
}

/// Bisects `residual` on `[lower, upper]` for the charge-neutral Fermi level.
///
/// The first error raised by `residual` aborts the search and is returned as is; solver
/// failures are reported as [`EngineError::FermiLevel`] tagged with `phase`.
pub fn find_neutral_fermi_level<F>(
    mut residual: F,
    lower: f64,
    upper: f64,
    solver: &SolverConfig,
    phase: &'static str,
) -> Result<Root, EngineError>
where
    F: FnMut(f64) -> Result<f64, EngineError>,
{
    let mut failure: Option<EngineError> = None;
    let outcome = bisect(
        |x| {
            if failure.is_some() {
                return f64::NAN;
            }
            match residual(x) {
                Ok(value) => value,
                Err(e) => {
                    failure = Some(e);
                    f64::NAN
                }
            }
        },
        lower,
        upper,
        &BisectionOptions::from(solver),
    );
    if let Some(e) = failure {
        return Err(e);
    }
    let root = outcome.map_err(|source| EngineError::FermiLevel { phase, source })?;
    debug!(
        phase,
        fermi_level = root.x,
        iterations = root.iterations,
        "Charge-neutral Fermi level found."
    );
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::RootError;
    use crate::core::models::composition::Composition;
    use crate::core::models::defect::ParsedDefect;
    use crate::core::models::entry::{BulkEntry, ComputedEntry};
    use crate::core::models::structure::{BulkSite, BulkStructure, Lattice};
    use crate::core::thermo::ThermoError;
    use crate::core::thermo::carriers::EffectiveMass;
    use crate::engine::config::DEFAULT_INTEGRATION_WINDOW;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn analyzer() -> DefectsAnalyzer {
        let structure = BulkStructure::new(
            Lattice::cubic(10.0).unwrap(),
            vec![
                BulkSite::new("A", [0.0, 0.0, 0.0]).with_equivalence(0),
                BulkSite::new("B", [0.5, 0.5, 0.5]).with_equivalence(1),
            ],
        );
        let comp = Composition::from_pairs([("A", 1.0), ("B", 1.0)]).unwrap();
        let bulk = BulkEntry::new(ComputedEntry::new(-10.0, comp), structure);
        let mus = BTreeMap::from([("A".to_string(), -1.0), ("B".to_string(), -2.0)]);
        let mut a = DefectsAnalyzer::new(bulk, 0.0, mus, 2.0).unwrap();
        let vac = Composition::from_pairs([("A", 1.0)]).unwrap();
        // vac_B: q=+1 at 1.0 eV, q=0 at 1.5 eV; (+1/0) level at 0.5 eV.
        for (q, e) in [(1, -7.0), (0, -6.5)] {
            a.add_parsed_defect(ParsedDefect::new(
                "vac_B",
                q,
                ComputedEntry::new(e, vac.clone()),
                [0.5, 0.5, 0.5],
            ))
            .unwrap();
        }
        a
    }

    fn carriers() -> CarrierConfig {
        CarrierConfig {
            electron_mass: EffectiveMass::isotropic(1.0).unwrap(),
            hole_mass: EffectiveMass::isotropic(1.0).unwrap(),
            integration_window: DEFAULT_INTEGRATION_WINDOW,
        }
    }

    #[test]
    fn net_charge_changes_sign_across_the_gap() {
        let a = analyzer();
        let c = carriers();
        let balance = ChargeBalance::new(&a, &c).unwrap();
        assert!(balance.net_charge(0.0, 1000.0).unwrap() > 0.0);
        assert!(balance.net_charge(2.0, 1000.0).unwrap() < 0.0);
    }

    #[test]
    fn redistribution_conserves_totals() {
        let a = analyzer();
        let c = carriers();
        let balance = ChargeBalance::new(&a, &c).unwrap();
        let totals = vec![DefectTotal {
            name: "vac_B".to_string(),
            concentration: 1e20,
        }];
        let states = balance.redistribute(&totals, 0.5, 300.0).unwrap();
        let sum: f64 = states.iter().map(|s| s.concentration).sum();
        assert_relative_eq!(sum, 1e20, max_relative = 1e-12);
        // Both states are degenerate at their transition level.
        assert_relative_eq!(states[0].concentration, states[1].concentration, max_relative = 1e-12);
    }

    #[test]
    fn redistribution_leaves_unlisted_defects_empty() {
        let a = analyzer();
        let c = carriers();
        let balance = ChargeBalance::new(&a, &c).unwrap();
        let states = balance.redistribute(&[], 0.5, 300.0).unwrap();
        assert!(states.iter().all(|s| s.concentration == 0.0));
    }

    #[test]
    fn neutral_level_of_linear_residual() {
        let root = find_neutral_fermi_level(|x| Ok(0.7 - x), 0.0, 2.0, &SolverConfig::default(), "test").unwrap();
        assert!((root.x - 0.7).abs() < 1e-11);
    }

    #[test]
    fn residual_error_is_returned_unchanged() {
        let mut calls = 0;
        let err = find_neutral_fermi_level(
            |x| {
                calls += 1;
                // Both ends and the first midpoint succeed; the second midpoint fails.
                if calls > 3 {
                    Err(EngineError::from(ThermoError::InvalidTemperature(-1.0)))
                } else {
                    Ok(0.3 - x)
                }
            },
            0.0,
            2.0,
            &SolverConfig::default(),
            "test",
        )
        .unwrap_err();
        assert_eq!(calls, 4);
        assert!(matches!(err, EngineError::Thermo { .. }));
    }

    #[test]
    fn missing_sign_change_is_tagged_with_phase() {
        let err = find_neutral_fermi_level(|_| Ok(1.0), 0.0, 2.0, &SolverConfig::default(), "equilibrium")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::FermiLevel {
                phase: "equilibrium",
                source: RootError::NoSignChange { .. }
            }
        ));
    }
}
