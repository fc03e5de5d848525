pub mod equilibrium;
pub mod formation;
pub mod levels;
pub mod profile;
pub mod quench;

use crate::cli::AnalysisArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use chargedefects::core::io::document::AnalyzerDocument;
use chargedefects::core::io::tables;
use chargedefects::engine::analyzer::DefectsAnalyzer;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Loads the defect system named in `args` and applies the configured corrections.
pub fn load_analyzer(args: &AnalysisArgs, config: &PartialConfig) -> Result<DefectsAnalyzer> {
    info!("Loading defect system from {:?}", &args.input);
    let document = AnalyzerDocument::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let mut analyzer = DefectsAnalyzer::from_document(document)?;
    config.prepare_analyzer(&mut analyzer)?;
    Ok(analyzer)
}

pub fn write_table<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    tables::write_records_to_path(path, records).map_err(|e| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    info!("Wrote {} row(s) to {:?}", records.len(), path);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use chargedefects::core::io::document::AnalyzerDocument;
    use std::path::{Path, PathBuf};

    /// AB host with a 2 eV gap: `vac_B` has a (+1/0) level at 0.5 eV and `vac_A` is a
    /// single acceptor at 3.0 eV (VBM reference).
    pub(crate) const SYSTEM_TOML: &str = r#"
        e_vbm = 0.0
        band_gap = 2.0

        [chemical_potentials]
        A = -1.0
        B = -2.0

        [bulk.entry]
        energy = -10.0
        composition = { A = 1.0, B = 1.0 }

        [bulk.structure]
        lattice = [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]

        [[bulk.structure.sites]]
        species = "A"
        frac_coords = [0.0, 0.0, 0.0]
        equivalence = 0

        [[bulk.structure.sites]]
        species = "B"
        frac_coords = [0.5, 0.5, 0.5]
        equivalence = 1

        [[defects]]
        name = "vac_B"
        charge = 1
        site = [0.5, 0.5, 0.5]
        entry = { energy = -7.0, composition = { A = 1.0 } }

        [[defects]]
        name = "vac_B"
        charge = 0
        site = [0.5, 0.5, 0.5]
        entry = { energy = -6.5, composition = { A = 1.0 } }

        [[defects]]
        name = "vac_A"
        charge = -1
        site = [0.0, 0.0, 0.0]
        entry = { energy = -6.0, composition = { B = 1.0 } }
    "#;

    pub(crate) fn write_system(dir: &Path) -> PathBuf {
        let path = dir.join("system.toml");
        std::fs::write(&path, SYSTEM_TOML).unwrap();
        // Fail early if the fixture drifts from the document schema.
        AnalyzerDocument::read_from_path(&path).unwrap();
        path
    }
}
