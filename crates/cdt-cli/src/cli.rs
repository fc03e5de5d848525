use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "cdt - Thermodynamics of charged point defects: formation energies, transition levels and self-consistent Fermi levels.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print (and optionally tabulate) the formation energy of every defect at a Fermi level.
    Formation(FormationArgs),
    /// List charge-state transition levels.
    Levels(LevelsArgs),
    /// Sample the lowest formation energy of one defect across the Fermi-level window.
    Profile(ProfileArgs),
    /// Solve for the equilibrium Fermi level and defect concentrations.
    Equilibrium(EquilibriumArgs),
    /// Solve for the Fermi level after quenching from a synthesis temperature.
    Quench(QuenchArgs),
}

/// Inputs shared by every command.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Path to the defect system document (.json or .toml).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S solver.max-iterations=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FormationArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Fermi level in eV above the VBM.
    #[arg(short = 'e', long, default_value_t = 0.0, value_name = "EV", allow_negative_numbers = true)]
    pub fermi_level: f64,

    /// Write the table as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LevelsArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Only report thermodynamically stable levels (kinks of the lowest-energy envelope).
    #[arg(long)]
    pub stable_only: bool,

    /// Write the levels as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Name of the defect to sample.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub defect: String,

    /// Number of evenly spaced Fermi levels.
    #[arg(short, long, default_value_t = 100, value_name = "INT")]
    pub points: usize,

    /// Write the profile as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Temperature and carrier overrides shared by the solver commands.
#[derive(Args, Debug, Clone)]
pub struct SolverArgs {
    /// Operating temperature in K.
    #[arg(short = 'T', long, value_name = "KELVIN")]
    pub temperature: Option<f64>,

    /// Electron effective mass: one value, or three comma-separated principal values.
    #[arg(long, value_name = "MASS", value_parser = parser::parse_mass)]
    pub electron_mass: Option<[f64; 3]>,

    /// Hole effective mass: one value, or three comma-separated principal values.
    #[arg(long, value_name = "MASS", value_parser = parser::parse_mass)]
    pub hole_mass: Option<[f64; 3]>,

    /// Write defect concentrations as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the full result (.json or .toml) to this path.
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EquilibriumArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub solver: SolverArgs,
}

#[derive(Args, Debug)]
pub struct QuenchArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Temperature in K at which defects form and are frozen in.
    #[arg(long, value_name = "KELVIN")]
    pub synthesis_temperature: Option<f64>,
}
