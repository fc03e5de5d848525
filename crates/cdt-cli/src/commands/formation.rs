use super::{load_analyzer, write_table};
use crate::cli::FormationArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use chargedefects::engine::analyzer::DefectsAnalyzer;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize, PartialEq)]
struct FormationRow<'a> {
    name: &'a str,
    charge: i32,
    charge_correction: f64,
    fermi_level: f64,
    formation_energy: f64,
}

fn formation_table(analyzer: &DefectsAnalyzer, fermi_level: f64) -> Result<Vec<FormationRow<'_>>> {
    let mut rows = Vec::with_capacity(analyzer.defects().len());
    for (i, defect) in analyzer.defects().iter().enumerate() {
        rows.push(FormationRow {
            name: &defect.name,
            charge: defect.charge,
            charge_correction: defect.charge_correction,
            fermi_level,
            formation_energy: analyzer.formation_energy(i, fermi_level)?,
        });
    }
    Ok(rows)
}

pub fn run(args: FormationArgs) -> Result<()> {
    let config = PartialConfig::load(&args.analysis)?;
    let analyzer = load_analyzer(&args.analysis, &config)?;

    info!("Evaluating formation energies at E_F = {} eV.", args.fermi_level);
    let rows = formation_table(&analyzer, args.fermi_level)?;

    println!(
        "Formation energies at E_F = {:.3} eV (band gap {:.3} eV):",
        args.fermi_level,
        analyzer.band_gap()
    );
    for row in &rows {
        println!(
            "  {:<16} q = {:>+3}   E_f = {:>9.4} eV",
            row.name, row.charge, row.formation_energy
        );
    }

    if let Some(path) = &args.output {
        write_table(path, &rows)?;
        println!("Table written to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::AnalysisArgs;
    use crate::commands::tests::write_system;
    use tempfile::tempdir;

    #[test]
    fn table_is_evaluated_at_the_fermi_level() {
        let dir = tempdir().unwrap();
        let args = AnalysisArgs {
            input: write_system(dir.path()),
            config: None,
            set_values: vec![],
        };
        let analyzer = load_analyzer(&args, &PartialConfig::default()).unwrap();
        let rows = formation_table(&analyzer, 0.5).unwrap();
        assert_eq!(rows.len(), 3);
        assert!((rows[0].formation_energy - 1.5).abs() < 1e-12);
        assert!((rows[1].formation_energy - 1.5).abs() < 1e-12);
        assert!((rows[2].formation_energy - 2.5).abs() < 1e-12);
    }

    #[test]
    fn csv_output_is_written() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("formation.csv");
        run(FormationArgs {
            analysis: AnalysisArgs {
                input: write_system(dir.path()),
                config: None,
                set_values: vec!["band-gap-correction.vbm-shift=0.1".to_string()],
            },
            fermi_level: 0.0,
            output: Some(output.clone()),
        })
        .unwrap();

        let content = std::fs::read_to_string(output).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,charge,charge_correction,fermi_level,formation_energy"
        );
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first[0], "vac_B");
        // The VBM moved down by 0.1 eV, lowering the donor by the same amount.
        assert!((first[4].parse::<f64>().unwrap() - 0.9).abs() < 1e-12);
    }
}
