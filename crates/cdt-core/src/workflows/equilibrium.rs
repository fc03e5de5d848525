use crate::core::thermo::carriers::CarrierDensities;
use crate::engine::analyzer::DefectsAnalyzer;
use crate::engine::charge_balance::{ChargeBalance, defect_charge, find_neutral_fermi_level};
use crate::engine::config::EquilibriumConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::DefectConcentration;
use serde::Serialize;
use tracing::{info, instrument};

/// Self-consistent state of the defect/carrier system at one temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquilibriumResult {
    /// Temperature in K.
    pub temperature: f64,
    /// Charge-neutral Fermi level in eV above the VBM.
    pub fermi_level: f64,
    /// Net free-carrier charge `p − n` in e·m⁻³.
    pub carrier_charge: f64,
    /// Net defect charge `Σ q·c` in e·m⁻³.
    pub defect_charge: f64,
    pub carriers: CarrierDensities,
    pub concentrations: Vec<DefectConcentration>,
    /// Bisection steps taken.
    pub iterations: u32,
}

/// Solves for the equilibrium Fermi level inside the band gap.
///
/// # Errors
///
/// Fails if a defect site cannot be resolved, the configuration is unusable, or the net
/// charge does not change sign between the band edges.
#[instrument(skip_all, name = "equilibrium_workflow")]
pub fn run(
    analyzer: &DefectsAnalyzer,
    config: &EquilibriumConfig,
    reporter: &ProgressReporter,
) -> Result<EquilibriumResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Equilibrium",
    });
    info!(
        temperature = config.temperature,
        defects = analyzer.defects().len(),
        "Solving charge neutrality in equilibrium."
    );
    let result = solve(analyzer, config, "equilibrium")?;
    info!(
        "Equilibrium Fermi level: {:.6} eV after {} iteration(s).",
        result.fermi_level, result.iterations
    );
    reporter.report(Progress::Message(format!(
        "E_F = {:.4} eV at {} K",
        result.fermi_level, result.temperature
    )));
    reporter.report(Progress::PhaseFinish);
    Ok(result)
}

pub(crate) fn solve(
    analyzer: &DefectsAnalyzer,
    config: &EquilibriumConfig,
    phase: &'static str,
) -> Result<EquilibriumResult, EngineError> {
    let temperature = config.temperature;
    let balance = ChargeBalance::new(analyzer, &config.carriers)?;
    let root = find_neutral_fermi_level(
        |ef| balance.net_charge(ef, temperature),
        0.0,
        analyzer.band_gap(),
        &config.solver,
        phase,
    )?;

    let concentrations = balance.concentrations(root.x, temperature)?;
    let carriers = balance.carriers(root.x, temperature)?;
    Ok(EquilibriumResult {
        temperature,
        fermi_level: root.x,
        carrier_charge: carriers.net_charge(),
        defect_charge: defect_charge(&concentrations),
        carriers,
        concentrations,
        iterations: root.iterations,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::composition::Composition;
    use crate::core::models::defect::ParsedDefect;
    use crate::core::models::entry::{BulkEntry, ComputedEntry};
    use crate::core::models::structure::{BulkSite, BulkStructure, Lattice};
    use crate::core::thermo::carriers::EffectiveMass;
    use crate::engine::config::EquilibriumConfigBuilder;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// AB compound with a 2 eV gap and the VBM at 0 eV.
    pub(crate) fn host() -> DefectsAnalyzer {
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
        DefectsAnalyzer::new(bulk, 0.0, mus, 2.0).unwrap()
    }

    /// B vacancy; `vac_B_1` sits at 1.0 eV at the VBM for `energy = -7.0`.
    pub(crate) fn b_vacancy(charge: i32, energy: f64) -> ParsedDefect {
        let comp = Composition::from_pairs([("A", 1.0)]).unwrap();
        ParsedDefect::new("vac_B", charge, ComputedEntry::new(energy, comp), [0.5, 0.5, 0.5])
    }

    /// A vacancy; `vac_A_-1` sits at 3.0 eV at the VBM for `energy = -6.0`.
    pub(crate) fn a_vacancy(charge: i32, energy: f64) -> ParsedDefect {
        let comp = Composition::from_pairs([("B", 1.0)]).unwrap();
        ParsedDefect::new("vac_A", charge, ComputedEntry::new(energy, comp), [0.0, 0.0, 0.0])
    }

    fn config(temperature: f64) -> EquilibriumConfig {
        EquilibriumConfigBuilder::new()
            .temperature(temperature)
            .electron_mass(EffectiveMass::isotropic(1.0).unwrap())
            .hole_mass(EffectiveMass::isotropic(1.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn mirrored_donor_and_acceptor_pin_midgap() {
        let mut a = host();
        a.add_parsed_defect(b_vacancy(1, -7.0)).unwrap();
        a.add_parsed_defect(a_vacancy(-1, -6.0)).unwrap();
        assert_eq!(a.formation_energies(), &[1.0, 3.0]);

        let result = run(&a, &config(1000.0), &ProgressReporter::new()).unwrap();
        assert!((result.fermi_level - 1.0).abs() < 1e-9);
        let donor = result.concentrations[0].concentration;
        let acceptor = result.concentrations[1].concentration;
        assert!((donor - acceptor).abs() <= 1e-6 * donor);
    }

    #[test]
    fn single_donor_is_charge_balanced() {
        let mut a = host();
        a.add_parsed_defect(b_vacancy(1, -7.0)).unwrap();
        let result = run(&a, &config(1000.0), &ProgressReporter::new()).unwrap();
        assert!(result.fermi_level > 0.5 && result.fermi_level < 2.0);
        assert!(result.defect_charge > 0.0);
        assert!(result.carrier_charge < 0.0);
        let total = result.defect_charge + result.carrier_charge;
        assert!(total.abs() <= 1e-6 * result.carriers.electrons);
        assert!(result.carriers.electrons > result.carriers.holes);
    }

    #[test]
    fn phases_are_reported() {
        let mut a = host();
        a.add_parsed_defect(b_vacancy(1, -7.0)).unwrap();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e: Progress| {
            events.lock().unwrap().push(format!("{:?}", e));
        }));
        run(&a, &config(800.0), &reporter).unwrap();
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert!(events.first().unwrap().contains("Equilibrium"));
        assert_eq!(events.last().unwrap(), "PhaseFinish");
    }

    #[test]
    fn unresolvable_site_fails_before_solving() {
        let mut a = host();
        let comp = Composition::from_pairs([("A", 2.0), ("B", 1.0)]).unwrap();
        a.add_parsed_defect(ParsedDefect::new(
            "int_A",
            1,
            ComputedEntry::new(-9.0, comp),
            [0.25, 0.25, 0.25],
        ))
        .unwrap();
        let err = run(&a, &config(1000.0), &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::Model { .. }));
    }
}
