use super::ModelError;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Lattice vectors of a periodic cell, stored as the rows of a 3×3 matrix in Å.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Creates a lattice from its three row vectors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DegenerateLattice`] if the vectors span no volume.
    pub fn new(rows: [[f64; 3]; 3]) -> Result<Self, ModelError> {
        let matrix = Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]);
        let volume = matrix.determinant().abs();
        if !volume.is_finite() || volume < 1e-8 {
            return Err(ModelError::DegenerateLattice { volume });
        }
        Ok(Self { matrix })
    }

    pub fn cubic(a: f64) -> Result<Self, ModelError> {
        Self::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// Cell volume in Å³.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }
}

impl TryFrom<[[f64; 3]; 3]> for Lattice {
    type Error = ModelError;

    fn try_from(rows: [[f64; 3]; 3]) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Lattice> for [[f64; 3]; 3] {
    fn from(lattice: Lattice) -> Self {
        let m = lattice.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }
}

/// A site of the bulk supercell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkSite {
    pub species: String,
    pub frac_coords: [f64; 3],
    /// Symmetry-equivalence class of the site, as reported by a symmetry finder
    /// (e.g. spglib's `equivalent_atoms`). Unlabelled sites form their own class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalence: Option<usize>,
}

impl BulkSite {
    pub fn new(species: impl Into<String>, frac_coords: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            frac_coords,
            equivalence: None,
        }
    }

    pub fn with_equivalence(mut self, class: usize) -> Self {
        self.equivalence = Some(class);
        self
    }
}

/// The bulk supercell against which defects are referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkStructure {
    pub lattice: Lattice,
    #[serde(default)]
    pub sites: Vec<BulkSite>,
}

impl BulkStructure {
    pub fn new(lattice: Lattice, sites: Vec<BulkSite>) -> Self {
        Self { lattice, sites }
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.lattice.volume()
    }

    /// Index of the first site whose fractional coordinates lie within `tolerance` of
    /// `frac` along every axis, using the periodic minimum image.
    pub fn find_site(&self, frac: &[f64; 3], tolerance: f64) -> Option<usize> {
        self.sites.iter().position(|site| {
            site.frac_coords
                .iter()
                .zip(frac)
                .all(|(a, b)| periodic_distance(*a, *b) < tolerance)
        })
    }

    /// Number of sites in the equivalence class of the site matching `frac`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SiteNotFound`] if no bulk site lies within `tolerance`.
    pub fn equivalent_site_count(&self, frac: &[f64; 3], tolerance: f64) -> Result<usize, ModelError> {
        let index = self
            .find_site(frac, tolerance)
            .ok_or(ModelError::SiteNotFound {
                coords: *frac,
                tolerance,
            })?;
        match self.sites[index].equivalence {
            Some(class) => Ok(self
                .sites
                .iter()
                .filter(|s| s.equivalence == Some(class))
                .count()),
            None => Ok(1),
        }
    }
}

#[inline]
fn periodic_distance(a: f64, b: f64) -> f64 {
    let d = a - b;
    (d - d.round()).abs()
}
