use super::{load_analyzer, write_table};
use crate::cli::EquilibriumArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use chargedefects::core::io::document::write_document;
use chargedefects::engine::progress::ProgressReporter;
use chargedefects::workflows::equilibrium::{self, EquilibriumResult};
use tracing::info;

pub fn print_summary(result: &EquilibriumResult) {
    println!(
        "Fermi level at {} K: {:.4} eV above the VBM ({} iterations)",
        result.temperature, result.fermi_level, result.iterations
    );
    println!(
        "  electrons {:.4e} m^-3, holes {:.4e} m^-3",
        result.carriers.electrons, result.carriers.holes
    );
    for c in &result.concentrations {
        println!("  {:<16} q = {:>+3}   {:.4e} m^-3", c.name, c.charge, c.concentration);
    }
}

pub fn run(args: EquilibriumArgs) -> Result<()> {
    let config = PartialConfig::load(&args.analysis)?;
    let analyzer = load_analyzer(&args.analysis, &config)?;
    let eq_config = config.merge_equilibrium(&args.solver)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the equilibrium workflow...");
    let result = equilibrium::run(&analyzer, &eq_config, &reporter)?;
    print_summary(&result);

    if let Some(path) = &args.solver.output {
        write_table(path, &result.concentrations)?;
        println!("Concentrations written to: {}", path.display());
    }
    if let Some(path) = &args.solver.summary {
        write_document(&result, path).map_err(|e| CliError::FileWriting {
            path: path.clone(),
            source: e.into(),
        })?;
        println!("Summary written to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AnalysisArgs, SolverArgs};
    use crate::commands::tests::write_system;
    use tempfile::tempdir;

    #[test]
    fn equilibrium_writes_concentrations_and_summary() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("concentrations.csv");
        let summary = dir.path().join("summary.json");
        run(EquilibriumArgs {
            analysis: AnalysisArgs {
                input: write_system(dir.path()),
                config: None,
                set_values: vec!["conditions.temperature=1000".to_string()],
            },
            solver: SolverArgs {
                temperature: None,
                electron_mass: Some([1.0; 3]),
                hole_mass: Some([1.0; 3]),
                output: Some(output.clone()),
                summary: Some(summary.clone()),
            },
        })
        .unwrap();

        let csv = std::fs::read_to_string(output).unwrap();
        assert_eq!(csv.lines().next().unwrap(), "name,charge,concentration");
        assert_eq!(csv.lines().count(), 4);

        let json = std::fs::read_to_string(summary).unwrap();
        assert!(json.contains("\"temperature\": 1000.0"));
        assert!(json.contains("\"fermi_level\""));
    }

    #[test]
    fn missing_masses_fail_before_solving() {
        let dir = tempdir().unwrap();
        let err = run(EquilibriumArgs {
            analysis: AnalysisArgs {
                input: write_system(dir.path()),
                config: None,
                set_values: vec![],
            },
            solver: SolverArgs {
                temperature: Some(600.0),
                electron_mass: None,
                hole_mass: None,
                output: None,
                summary: None,
            },
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
