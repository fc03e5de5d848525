//! # Core Models Module
//!
//! Data structures describing the inputs of a defect calculation: the bulk reference
//! (total energy, composition, lattice and symmetry-equivalence labels of its sites) and
//! the parsed charged-defect supercells compared against it.
//!
//! - [`composition`] - Element amounts of a supercell
//! - [`entry`] - A computed total energy together with its composition and metadata
//! - [`structure`] - Lattice, bulk sites and equivalence-class lookups
//! - [`defect`] - A parsed defect calculation and band-edge alignment descriptors

pub mod composition;
pub mod defect;
pub mod entry;
pub mod structure;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Lattice is degenerate (volume {volume:.3e} Å³)")]
    DegenerateLattice { volume: f64 },

    #[error("No bulk site within {tolerance} (fractional) of [{:.4}, {:.4}, {:.4}]", .coords[0], .coords[1], .coords[2])]
    SiteNotFound { coords: [f64; 3], tolerance: f64 },

    #[error("Site multiplicity must be at least 1")]
    ZeroMultiplicity,

    #[error("Invalid composition amount for '{element}': {amount}")]
    InvalidAmount { element: String, amount: f64 },
}
