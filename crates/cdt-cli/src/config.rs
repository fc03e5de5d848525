use crate::cli::{AnalysisArgs, SolverArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use chargedefects::core::corrections::{PointChargeCorrection, TabulatedCorrection};
use chargedefects::core::models::defect::LevelAlignment;
use chargedefects::core::thermo::carriers::EffectiveMass;
use chargedefects::engine::analyzer::DefectsAnalyzer;
use chargedefects::engine::config as core_config;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Operating temperature in K used when neither the CLI nor the config file sets one.
const DEFAULT_TEMPERATURE: f64 = 300.0;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialConditionsConfig {
    temperature: Option<f64>,
    synthesis_temperature: Option<f64>,
}

/// An effective mass written either as one number or as three principal values.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
enum PartialMass {
    Isotropic(f64),
    Principal([f64; 3]),
}

impl From<PartialMass> for [f64; 3] {
    fn from(p: PartialMass) -> Self {
        match p {
            PartialMass::Isotropic(m) => [m; 3],
            PartialMass::Principal(m) => m,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCarriersConfig {
    electron_mass: Option<PartialMass>,
    hole_mass: Option<PartialMass>,
    integration_window: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolverConfig {
    tolerance: Option<f64>,
    relative_tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBandGapCorrection {
    vbm_shift: Option<f64>,
    cbm_shift: Option<f64>,
    #[serde(default)]
    levels: BTreeMap<String, LevelAlignment>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(
    tag = "scheme",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
enum PartialCorrection {
    None,
    PointCharge {
        madelung_constant: f64,
        dielectric: f64,
        supercell_length: f64,
    },
    Tabulated {
        values: TabulatedCorrection,
    },
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialConfig {
    conditions: Option<PartialConditionsConfig>,
    carriers: Option<PartialCarriersConfig>,
    solver: Option<PartialSolverConfig>,
    band_gap_correction: Option<PartialBandGapCorrection>,
    correction: Option<PartialCorrection>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the config file named in `args` (if any) and applies its `--set` overrides.
    pub fn load(args: &AnalysisArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(&args.set_values)?;
        Ok(config)
    }

    /// Applies the configured charge correction and band-gap correction to `analyzer`.
    pub fn prepare_analyzer(&self, analyzer: &mut DefectsAnalyzer) -> Result<()> {
        match &self.correction {
            None | Some(PartialCorrection::None) => {}
            Some(PartialCorrection::PointCharge {
                madelung_constant,
                dielectric,
                supercell_length,
            }) => {
                let scheme = PointChargeCorrection::new(*madelung_constant, *dielectric, *supercell_length)
                    .map_err(|e| CliError::Config(format!("`correction`: {}", e)))?;
                info!("Applying point-charge correction to all defects.");
                analyzer.apply_correction(&scheme)?;
            }
            Some(PartialCorrection::Tabulated { values }) => {
                info!("Applying tabulated charge corrections.");
                analyzer.apply_correction(values)?;
            }
        }

        if let Some(bg) = &self.band_gap_correction {
            let vbm_shift = bg.vbm_shift.unwrap_or(0.0);
            let cbm_shift = bg.cbm_shift.unwrap_or(0.0);
            if bg.levels.is_empty() {
                analyzer.correct_band_gap_simple(vbm_shift, cbm_shift)?;
            } else {
                analyzer.correct_band_gap(&bg.levels, vbm_shift, cbm_shift)?;
            }
        }
        Ok(())
    }

    pub fn merge_equilibrium(&self, args: &SolverArgs) -> Result<core_config::EquilibriumConfig> {
        let conditions = self.conditions.clone().unwrap_or_default();
        let temperature = args
            .temperature
            .or(conditions.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        let carriers = self.carriers.clone().unwrap_or_default();

        let mut builder = core_config::EquilibriumConfigBuilder::new()
            .temperature(temperature)
            .solver(self.solver_config());
        if let Some(m) = merge_mass(args.electron_mass, carriers.electron_mass, "electron")? {
            builder = builder.electron_mass(m);
        }
        if let Some(m) = merge_mass(args.hole_mass, carriers.hole_mass, "hole")? {
            builder = builder.hole_mass(m);
        }
        if let Some(window) = carriers.integration_window {
            builder = builder.integration_window(window);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_quench(
        &self,
        args: &SolverArgs,
        synthesis_temperature: Option<f64>,
    ) -> Result<core_config::QuenchConfig> {
        let conditions = self.conditions.clone().unwrap_or_default();
        let temperature = args
            .temperature
            .or(conditions.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        let synthesis_temperature = synthesis_temperature
            .or(conditions.synthesis_temperature)
            .ok_or_else(|| {
                CliError::Config(
                    "`conditions.synthesis-temperature` is required (or pass --synthesis-temperature)."
                        .to_string(),
                )
            })?;
        let carriers = self.carriers.clone().unwrap_or_default();

        let mut builder = core_config::QuenchConfigBuilder::new()
            .synthesis_temperature(synthesis_temperature)
            .temperature(temperature)
            .solver(self.solver_config());
        if let Some(m) = merge_mass(args.electron_mass, carriers.electron_mass, "electron")? {
            builder = builder.electron_mass(m);
        }
        if let Some(m) = merge_mass(args.hole_mass, carriers.hole_mass, "hole")? {
            builder = builder.hole_mass(m);
        }
        if let Some(window) = carriers.integration_window {
            builder = builder.integration_window(window);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn solver_config(&self) -> core_config::SolverConfig {
        let defaults = core_config::SolverConfig::default();
        let file = self.solver.clone().unwrap_or_default();
        core_config::SolverConfig {
            tolerance: file.tolerance.unwrap_or(defaults.tolerance),
            relative_tolerance: file.relative_tolerance.unwrap_or(defaults.relative_tolerance),
            max_iterations: file.max_iterations.unwrap_or(defaults.max_iterations),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "conditions.temperature" => {
                    self.conditions
                        .get_or_insert_with(Default::default)
                        .temperature = Some(parse_float(key, value_str)?);
                }
                "conditions.synthesis-temperature" => {
                    self.conditions
                        .get_or_insert_with(Default::default)
                        .synthesis_temperature = Some(parse_float(key, value_str)?);
                }
                "carriers.electron-mass" => {
                    self.carriers
                        .get_or_insert_with(Default::default)
                        .electron_mass = Some(parse_mass(key, value_str)?);
                }
                "carriers.hole-mass" => {
                    self.carriers.get_or_insert_with(Default::default).hole_mass =
                        Some(parse_mass(key, value_str)?);
                }
                "carriers.integration-window" => {
                    self.carriers
                        .get_or_insert_with(Default::default)
                        .integration_window = Some(parse_float(key, value_str)?);
                }
                "solver.tolerance" => {
                    self.solver.get_or_insert_with(Default::default).tolerance =
                        Some(parse_float(key, value_str)?);
                }
                "solver.relative-tolerance" => {
                    self.solver
                        .get_or_insert_with(Default::default)
                        .relative_tolerance = Some(parse_float(key, value_str)?);
                }
                "solver.max-iterations" => {
                    self.solver.get_or_insert_with(Default::default).max_iterations =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                        })?);
                }
                "band-gap-correction.vbm-shift" => {
                    self.band_gap_correction
                        .get_or_insert_with(Default::default)
                        .vbm_shift = Some(parse_float(key, value_str)?);
                }
                "band-gap-correction.cbm-shift" => {
                    self.band_gap_correction
                        .get_or_insert_with(Default::default)
                        .cbm_shift = Some(parse_float(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_float(key: &str, value_str: &str) -> Result<f64> {
    value_str
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid float value for {}: {}", key, value_str)))
}

fn parse_mass(key: &str, value_str: &str) -> Result<PartialMass> {
    parser::parse_mass(value_str)
        .map(PartialMass::Principal)
        .map_err(|e| CliError::Config(format!("{}: {}", key, e)))
}

fn merge_mass(
    cli: Option<[f64; 3]>,
    file: Option<PartialMass>,
    carrier: &str,
) -> Result<Option<EffectiveMass>> {
    cli.or(file.map(Into::into))
        .map(|m| {
            EffectiveMass::new(m)
                .map_err(|e| CliError::Config(format!("Invalid {} effective mass: {}", carrier, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargedefects::core::models::defect::BandEdgeKind;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const FULL_CONFIG: &str = r#"
        [conditions]
        temperature = 500.0
        synthesis-temperature = 1300.0

        [carriers]
        electron-mass = 0.3
        hole-mass = [0.5, 0.5, 1.2]
        integration-window = 4.0

        [solver]
        tolerance = 1e-10
        max-iterations = 80

        [band-gap-correction]
        vbm-shift = 0.2
        cbm-shift = 0.4
        levels.vac_O = { kind = "cbm-like", formal-charge = 0 }

        [correction]
        scheme = "point-charge"
        madelung-constant = 2.8373
        dielectric = 8.0
        supercell-length = 12.0
    "#;

    fn solver_args() -> SolverArgs {
        SolverArgs {
            temperature: None,
            electron_mass: None,
            hole_mass: None,
            output: None,
            summary: None,
        }
    }

    fn analysis_args(config: Option<PathBuf>, set_values: &[&str]) -> AnalysisArgs {
        AnalysisArgs {
            input: PathBuf::from("system.json"),
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cdt.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn full_file_is_parsed_and_merged() {
        let (_dir, path) = write_config(FULL_CONFIG);
        let config = PartialConfig::load(&analysis_args(Some(path), &[])).unwrap();

        let quench = config.merge_quench(&solver_args(), None).unwrap();
        assert_eq!(quench.temperature, 500.0);
        assert_eq!(quench.synthesis_temperature, 1300.0);
        assert_eq!(quench.carriers.electron_mass.components(), [0.3; 3]);
        assert_eq!(quench.carriers.hole_mass.components(), [0.5, 0.5, 1.2]);
        assert_eq!(quench.carriers.integration_window, 4.0);
        assert_eq!(quench.solver.tolerance, 1e-10);
        assert_eq!(quench.solver.max_iterations, 80);
        assert_eq!(
            quench.solver.relative_tolerance,
            core_config::SolverConfig::default().relative_tolerance
        );

        let bg = config.band_gap_correction.as_ref().unwrap();
        assert_eq!(
            bg.levels["vac_O"],
            LevelAlignment {
                kind: BandEdgeKind::CbmLike,
                formal_charge: 0
            }
        );
        assert!(matches!(
            config.correction,
            Some(PartialCorrection::PointCharge { dielectric, .. }) if dielectric == 8.0
        ));
    }

    #[test]
    fn defaults_fill_missing_values() {
        let config = PartialConfig::default();
        let mut args = solver_args();
        args.electron_mass = Some([1.0; 3]);
        args.hole_mass = Some([1.0; 3]);
        let eq = config.merge_equilibrium(&args).unwrap();
        assert_eq!(eq.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(eq.carriers.integration_window, core_config::DEFAULT_INTEGRATION_WINDOW);
        assert_eq!(eq.solver, core_config::SolverConfig::default());
    }

    #[test]
    fn missing_masses_are_reported() {
        let err = PartialConfig::default()
            .merge_equilibrium(&solver_args())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("electron_mass")));
    }

    #[test]
    fn quench_requires_synthesis_temperature() {
        let mut args = solver_args();
        args.electron_mass = Some([1.0; 3]);
        args.hole_mass = Some([1.0; 3]);
        let err = PartialConfig::default().merge_quench(&args, None).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("synthesis-temperature")));
    }

    #[test]
    fn set_values_override_file_and_cli_overrides_both() {
        let (_dir, path) = write_config(FULL_CONFIG);
        let config = PartialConfig::load(&analysis_args(
            Some(path),
            &[
                "conditions.temperature=650",
                "carriers.electron-mass=0.2,0.2,0.4",
                "solver.max-iterations=120",
                "band-gap-correction.cbm-shift=0.1",
            ],
        ))
        .unwrap();

        let eq = config.merge_equilibrium(&solver_args()).unwrap();
        assert_eq!(eq.temperature, 650.0);
        assert_eq!(eq.carriers.electron_mass.components(), [0.2, 0.2, 0.4]);
        assert_eq!(eq.solver.max_iterations, 120);
        assert_eq!(config.band_gap_correction.as_ref().unwrap().cbm_shift, Some(0.1));

        let mut args = solver_args();
        args.temperature = Some(900.0);
        args.electron_mass = Some([0.9; 3]);
        let eq = config.merge_equilibrium(&args).unwrap();
        assert_eq!(eq.temperature, 900.0);
        assert_eq!(eq.carriers.electron_mass.components(), [0.9; 3]);
    }

    #[test]
    fn unknown_set_key_is_rejected() {
        let err = PartialConfig::load(&analysis_args(None, &["solver.method=brent"])).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("solver.method")));
    }

    #[test]
    fn malformed_set_value_is_rejected() {
        assert!(PartialConfig::load(&analysis_args(None, &["conditions.temperature=hot"])).is_err());
        assert!(PartialConfig::load(&analysis_args(None, &["conditions.temperature"])).is_err());
    }

    #[test]
    fn unknown_file_field_is_a_parse_error() {
        let (_dir, path) = write_config("[solver]\nmethod = \"brent\"\n");
        let err = PartialConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn tabulated_correction_is_parsed() {
        let (_dir, path) = write_config(
            "[correction]\nscheme = \"tabulated\"\nvalues = { vac_O_2 = 0.35, vac_O_1 = 0.1 }\n",
        );
        let config = PartialConfig::from_file(&path).unwrap();
        assert!(matches!(config.correction, Some(PartialCorrection::Tabulated { .. })));
    }

    #[test]
    fn nonphysical_mass_is_a_config_error() {
        let mut args = solver_args();
        args.electron_mass = Some([-1.0; 3]);
        args.hole_mass = Some([1.0; 3]);
        let err = PartialConfig::default().merge_equilibrium(&args).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("electron")));
    }
}
