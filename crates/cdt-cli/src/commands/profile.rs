use super::{load_analyzer, write_table};
use crate::cli::ProfileArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use tracing::info;

pub fn run(args: ProfileArgs) -> Result<()> {
    let config = PartialConfig::load(&args.analysis)?;
    let analyzer = load_analyzer(&args.analysis, &config)?;

    info!(
        "Sampling the formation-energy envelope of '{}' at {} points.",
        args.defect, args.points
    );
    let profile = analyzer.formation_energy_profile(&args.defect, args.points)?;

    let mut current = None;
    println!("Stable charge states of {}:", args.defect);
    for point in &profile {
        if current != Some(point.charge) {
            println!(
                "  from E_F = {:>7.3} eV: q = {:+}",
                point.fermi_level, point.charge
            );
            current = Some(point.charge);
        }
    }

    if let Some(path) = &args.output {
        write_table(path, &profile)?;
        println!("Profile written to: {}", path.display());
    }
    Ok(())
}
