//! # File I/O Module
//!
//! Serde-backed persistence for analyzer inputs and tabular results.
//!
//! - [`document`] - The [`AnalyzerDocument`](document::AnalyzerDocument) and
//!   extension-driven JSON/TOML reading and writing
//! - [`tables`] - CSV output of result records

pub mod document;
pub mod tables;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error at path '{path}': {source}", path = path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Failed to encode TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported file format for '{path}' (expected .json, .toml or .csv)", path = .0.display())]
    UnsupportedFormat(PathBuf),
}

/// File formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some("csv") => Ok(Self::Csv),
            _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}
