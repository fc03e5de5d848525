use super::{load_analyzer, write_table};
use crate::cli::QuenchArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use chargedefects::core::io::document::write_document;
use chargedefects::engine::progress::ProgressReporter;
use chargedefects::workflows::quench;
use tracing::info;

pub fn run(args: QuenchArgs) -> Result<()> {
    let config = PartialConfig::load(&args.analysis)?;
    let analyzer = load_analyzer(&args.analysis, &config)?;
    let quench_config = config.merge_quench(&args.solver, args.synthesis_temperature)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the quench workflow...");
    let result = quench::run(&analyzer, &quench_config, &reporter)?;

    println!("Synthesis:");
    super::equilibrium::print_summary(&result.synthesis);
    println!(
        "Quenched to {} K: Fermi level {:.4} eV above the VBM ({} iterations)",
        result.temperature, result.fermi_level, result.iterations
    );
    println!(
        "  electrons {:.4e} m^-3, holes {:.4e} m^-3",
        result.carriers.electrons, result.carriers.holes
    );
    for c in &result.concentrations {
        println!("  {:<16} q = {:>+3}   {:.4e} m^-3", c.name, c.charge, c.concentration);
    }

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
