use super::{load_analyzer, write_table};
use crate::cli::LevelsArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use chargedefects::engine::analyzer::DefectsAnalyzer;
use chargedefects::engine::state::{TransitionLevel, TransitionLevelRow};
use tracing::info;

fn collect_levels(analyzer: &DefectsAnalyzer, stable_only: bool) -> Result<Vec<TransitionLevel>> {
    if !stable_only {
        return Ok(analyzer.transition_levels());
    }
    let mut levels = Vec::new();
    for name in analyzer.defect_names() {
        levels.extend(analyzer.stable_transition_levels(name)?);
    }
    Ok(levels)
}

pub fn run(args: LevelsArgs) -> Result<()> {
    let config = PartialConfig::load(&args.analysis)?;
    let analyzer = load_analyzer(&args.analysis, &config)?;

    let levels = collect_levels(&analyzer, args.stable_only)?;
    info!("Found {} transition level(s).", levels.len());

    let (lo, hi) = analyzer.fermi_window();
    if levels.is_empty() {
        println!("No transition levels between {:.2} and {:.2} eV.", lo, hi);
    } else {
        println!(
            "{} transition levels (eV above the VBM, gap {:.3} eV):",
            if args.stable_only { "Stable" } else { "All" },
            analyzer.band_gap()
        );
        for level in &levels {
            println!(
                "  {:<16} ({:+}/{:+})  {:>8.4}",
                level.name, level.charges.0, level.charges.1, level.fermi_level
            );
        }
    }

    if let Some(path) = &args.output {
        let rows: Vec<TransitionLevelRow> = levels.iter().map(Into::into).collect();
        write_table(path, &rows)?;
        println!("Levels written to: {}", path.display());
    }
    Ok(())
}
