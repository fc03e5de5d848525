use super::{FileFormat, IoError};
use crate::core::models::defect::ParsedDefect;
use crate::core::models::entry::BulkEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Serializable snapshot of a defect analysis: the bulk reference, band edges, chemical
/// potentials and every parsed defect.
///
/// `formation_energies` is written for convenience and ignored when the document is turned
/// back into an analyzer, which recomputes them from the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerDocument {
    /// Energy of the valence-band maximum in eV.
    pub e_vbm: f64,
    /// Band gap in eV.
    pub band_gap: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formation_energies: Vec<f64>,
    /// Chemical potential of each element in eV/atom.
    #[serde(alias = "mu_elts")]
    pub chemical_potentials: BTreeMap<String, f64>,
    pub bulk: BulkEntry,
    #[serde(default)]
    pub defects: Vec<ParsedDefect>,
}

impl AnalyzerDocument {
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        read_document(path.as_ref())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        write_document(self, path.as_ref())
    }
}

/// Reads a JSON or TOML document, choosing the format from the file extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let format = FileFormat::from_path(path)?;
    debug!("Reading {:?} document from {:?}", format, path);
    let content = std::fs::read_to_string(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        FileFormat::Json => Ok(serde_json::from_str(&content)?),
        FileFormat::Toml => Ok(toml::from_str(&content)?),
        FileFormat::Csv => Err(IoError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Writes a JSON (pretty-printed) or TOML document, choosing the format from the extension.
pub fn write_document<T: Serialize>(value: &T, path: &Path) -> Result<(), IoError> {
    let format = FileFormat::from_path(path)?;
    let content = match format {
        FileFormat::Json => serde_json::to_string_pretty(value)?,
        FileFormat::Toml => toml::to_string(value)?,
        FileFormat::Csv => return Err(IoError::UnsupportedFormat(path.to_path_buf())),
    };
    debug!("Writing {:?} document to {:?}", format, path);
    std::fs::write(path, content).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}
