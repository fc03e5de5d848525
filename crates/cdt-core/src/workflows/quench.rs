use super::equilibrium::{self, EquilibriumResult};
use crate::core::thermo::carriers::CarrierDensities;
use crate::engine::analyzer::DefectsAnalyzer;
use crate::engine::charge_balance::{ChargeBalance, defect_charge, find_neutral_fermi_level};
use crate::engine::config::QuenchConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{DefectConcentration, DefectTotal, totals_by_name};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// How far the quench search extends beyond each band edge (eV).
const BRACKET_MARGIN: f64 = 1.0;

/// Outcome of a synthesis/quench calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuenchResult {
    /// Full equilibrium solution at the synthesis temperature.
    pub synthesis: EquilibriumResult,
    /// Operating temperature in K.
    pub temperature: f64,
    /// Charge-neutral Fermi level at the operating temperature, in eV above the VBM.
    pub fermi_level: f64,
    pub carrier_charge: f64,
    pub defect_charge: f64,
    pub carriers: CarrierDensities,
    /// Total concentration of each defect frozen in at synthesis, in m⁻³.
    pub frozen_totals: Vec<DefectTotal>,
    /// Frozen totals redistributed over charge states at the operating temperature.
    pub concentrations: Vec<DefectConcentration>,
    pub iterations: u32,
}

/// Non-equilibrium Fermi level for defects formed at a high temperature and then quenched.
///
/// Defects equilibrate at `config.synthesis_temperature`; the total population of each
/// defect is then frozen, and at `config.temperature` only its split over charge states and
/// the free carriers re-equilibrate.
#[instrument(skip_all, name = "quench_workflow")]
pub fn run(
    analyzer: &DefectsAnalyzer,
    config: &QuenchConfig,
    reporter: &ProgressReporter,
) -> Result<QuenchResult, EngineError> {
    // === Phase 1: Equilibrium at the synthesis temperature ===
    reporter.report(Progress::PhaseStart { name: "Synthesis" });
    info!(
        temperature = config.synthesis_temperature,
        "Equilibrating defect populations at the synthesis temperature."
    );
    let synthesis = equilibrium::solve(analyzer, &config.synthesis_stage(), "synthesis")?;
    let frozen_totals = totals_by_name(&synthesis.concentrations);
    for total in &frozen_totals {
        debug!(
            "Frozen total for '{}': {:.4e} m^-3",
            total.name, total.concentration
        );
    }
    reporter.report(Progress::Message(format!(
        "Synthesis E_F = {:.4} eV at {} K",
        synthesis.fermi_level, synthesis.temperature
    )));
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Charge neutrality with frozen defect totals ===
    reporter.report(Progress::PhaseStart { name: "Quench" });
    let temperature = config.temperature;
    info!(
        temperature,
        "Solving charge neutrality with frozen defect concentrations."
    );
    let balance = ChargeBalance::new(analyzer, &config.carriers)?;
    let root = find_neutral_fermi_level(
        |ef| balance.frozen_net_charge(&frozen_totals, ef, temperature),
        -BRACKET_MARGIN,
        analyzer.band_gap() + BRACKET_MARGIN,
        &config.solver,
        "quench",
    )?;

    let concentrations = balance.redistribute(&frozen_totals, root.x, temperature)?;
    let carriers = balance.carriers(root.x, temperature)?;
    info!(
        "Quenched Fermi level: {:.6} eV (synthesis {:.6} eV).",
        root.x, synthesis.fermi_level
    );
    reporter.report(Progress::PhaseFinish);

    Ok(QuenchResult {
        synthesis,
        temperature,
        fermi_level: root.x,
        carrier_charge: carriers.net_charge(),
        defect_charge: defect_charge(&concentrations),
        carriers,
        frozen_totals,
        concentrations,
        iterations: root.iterations,
    })
}
