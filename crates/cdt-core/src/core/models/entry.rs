use super::composition::Composition;
use super::structure::BulkStructure;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata an external correction tool needs to revisit a calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    /// Path to the electrostatic potential file (LOCPOT) of the calculation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locpot_path: Option<PathBuf>,
    /// Plane-wave energy cutoff in eV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encut: Option<f64>,
}

/// A total energy from a DFT calculation together with the composition of its cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedEntry {
    /// Total energy of the cell in eV.
    pub energy: f64,
    pub composition: Composition,
    #[serde(default)]
    pub data: EntryData,
}

impl ComputedEntry {
    pub fn new(energy: f64, composition: Composition) -> Self {
        Self {
            energy,
            composition,
            data: EntryData::default(),
        }
    }
}

/// The bulk reference calculation: its total energy and the supercell it was run on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEntry {
    pub entry: ComputedEntry,
    pub structure: BulkStructure,
}

impl BulkEntry {
    pub fn new(entry: ComputedEntry, structure: BulkStructure) -> Self {
        Self { entry, structure }
    }

    #[inline]
    pub fn energy(&self) -> f64 {
        self.entry.energy
    }

    #[inline]
    pub fn composition(&self) -> &Composition {
        &self.entry.composition
    }
}
