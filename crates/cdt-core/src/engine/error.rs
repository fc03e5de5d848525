use super::config::ConfigError;
use crate::core::corrections::CorrectionError;
use crate::core::math::RootError;
use crate::core::models::ModelError;
use crate::core::thermo::ThermoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Defect index {index} is out of range ({len} defects)")]
    DefectIndexOutOfRange { index: usize, len: usize },

    #[error("No defect named '{0}'")]
    UnknownDefect(String),

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Thermodynamics error: {source}")]
    Thermo {
        #[from]
        source: ThermoError,
    },

    #[error("Charge correction '{scheme}' failed: {source}")]
    Correction {
        scheme: &'static str,
        #[source]
        source: CorrectionError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Fermi level search in phase '{phase}' failed: {source}")]
    FermiLevel {
        phase: &'static str,
        #[source]
        source: RootError,
    },
}
