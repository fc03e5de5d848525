use super::error::EngineError;
use super::state::{DefectConcentration, ProfilePoint, TransitionLevel};
use crate::core::corrections::ChargeCorrection;
use crate::core::io::document::AnalyzerDocument;
use crate::core::models::defect::{LevelAlignment, ParsedDefect};
use crate::core::models::entry::BulkEntry;
use crate::core::thermo::{concentration, formation};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fractional-coordinate tolerance used to match a defect position to a bulk site.
pub const SITE_MATCH_TOLERANCE: f64 = 0.1;

/// How far below the VBM the Fermi-level window used for transition levels extends (eV).
const WINDOW_BELOW_VBM: f64 = 0.5;
/// How far above the CBM the Fermi-level window used for transition levels extends (eV).
const WINDOW_ABOVE_CBM: f64 = 1.5;

/// Standard thermodynamic analysis of a set of charged-defect calculations.
///
/// The analyzer owns the bulk reference, the VBM energy, the band gap, the elemental
/// chemical potentials and the parsed defects. Formation energies at `E_F = 0` (the VBM) are
/// cached and recomputed whenever any of those inputs change, so they are always consistent
/// with the current state.
#[derive(Debug, Clone)]
pub struct DefectsAnalyzer {
    bulk: BulkEntry,
    e_vbm: f64,
    chemical_potentials: BTreeMap<String, f64>,
    band_gap: f64,
    defects: Vec<ParsedDefect>,
    formation_energies: Vec<f64>,
}

impl DefectsAnalyzer {
    /// Creates an analyzer without defects.
    ///
    /// # Arguments
    ///
    /// * `bulk` - The bulk reference calculation.
    /// * `e_vbm` - Energy of the valence-band maximum in eV.
    /// * `chemical_potentials` - Chemical potential of each element in eV/atom.
    /// * `band_gap` - The band gap in eV.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for non-finite energies or a negative gap.
    pub fn new(
        bulk: BulkEntry,
        e_vbm: f64,
        chemical_potentials: BTreeMap<String, f64>,
        band_gap: f64,
    ) -> Result<Self, EngineError> {
        if !bulk.energy().is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "bulk energy must be finite, got {}",
                bulk.energy()
            )));
        }
        if !e_vbm.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "VBM energy must be finite, got {}",
                e_vbm
            )));
        }
        check_band_gap(band_gap)?;
        if let Some((element, mu)) = chemical_potentials.iter().find(|(_, mu)| !mu.is_finite()) {
            return Err(EngineError::InvalidInput(format!(
                "chemical potential of '{}' must be finite, got {}",
                element, mu
            )));
        }
        Ok(Self {
            bulk,
            e_vbm,
            chemical_potentials,
            band_gap,
            defects: Vec::new(),
            formation_energies: Vec::new(),
        })
    }

    /// Rebuilds an analyzer from a document, replaying every defect through
    /// [`add_parsed_defect`](Self::add_parsed_defect). Stored formation energies are ignored.
    pub fn from_document(document: AnalyzerDocument) -> Result<Self, EngineError> {
        let mut analyzer = Self::new(
            document.bulk,
            document.e_vbm,
            document.chemical_potentials,
            document.band_gap,
        )?;
        for defect in document.defects {
            analyzer.add_parsed_defect(defect)?;
        }
        info!(
            "Loaded analyzer with {} defect calculation(s) across {} defect type(s).",
            analyzer.defects.len(),
            analyzer.defect_names().len()
        );
        Ok(analyzer)
    }

    pub fn to_document(&self) -> AnalyzerDocument {
        AnalyzerDocument {
            e_vbm: self.e_vbm,
            band_gap: self.band_gap,
            formation_energies: self.formation_energies.clone(),
            chemical_potentials: self.chemical_potentials.clone(),
            bulk: self.bulk.clone(),
            defects: self.defects.clone(),
        }
    }

    pub fn bulk(&self) -> &BulkEntry {
        &self.bulk
    }

    pub fn e_vbm(&self) -> f64 {
        self.e_vbm
    }

    pub fn band_gap(&self) -> f64 {
        self.band_gap
    }

    pub fn chemical_potentials(&self) -> &BTreeMap<String, f64> {
        &self.chemical_potentials
    }

    pub fn defects(&self) -> &[ParsedDefect] {
        &self.defects
    }

    /// Formation energies at the VBM (`E_F = 0`), in defect order.
    pub fn formation_energies(&self) -> &[f64] {
        &self.formation_energies
    }

    /// Distinct defect names in order of first appearance.
    pub fn defect_names(&self) -> Vec<&str> {
        self.defects.iter().map(|d| d.name.as_str()).unique().collect()
    }

    /// Adds a parsed defect and computes its formation energy.
    ///
    /// # Errors
    ///
    /// Fails, leaving the analyzer unchanged, if the defect exchanges an element with no
    /// chemical potential or carries non-finite energies.
    pub fn add_parsed_defect(&mut self, defect: ParsedDefect) -> Result<(), EngineError> {
        check_defect(&defect)?;
        let energy = self.formation_energy_at_vbm(&defect)?;
        debug!(
            "Added defect '{}' with formation energy {:.4} eV at the VBM.",
            defect.full_name(),
            energy
        );
        self.defects.push(defect);
        self.formation_energies.push(energy);
        Ok(())
    }

    /// Replaces the charge correction of the defect at `index`.
    pub fn change_charge_correction(&mut self, index: usize, correction: f64) -> Result<(), EngineError> {
        let len = self.defects.len();
        if !correction.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "charge correction must be finite, got {}",
                correction
            )));
        }
        let defect = self
            .defects
            .get_mut(index)
            .ok_or(EngineError::DefectIndexOutOfRange { index, len })?;
        defect.charge_correction = correction;
        self.recompute()
    }

    /// Sets every defect's charge correction from `scheme`.
    pub fn apply_correction<C: ChargeCorrection + ?Sized>(&mut self, scheme: &C) -> Result<(), EngineError> {
        let corrections = self
            .defects
            .iter()
            .map(|d| scheme.correction(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| EngineError::Correction {
                scheme: scheme.name(),
                source,
            })?;
        for (defect, correction) in self.defects.iter_mut().zip(corrections) {
            debug!(
                "Charge correction '{}' for {}: {:.4} eV",
                scheme.name(),
                defect.full_name(),
                correction
            );
            defect.charge_correction = correction;
        }
        self.recompute()
    }

    /// Opens the band gap by moving the VBM down by `vbm_shift` and the CBM up by `cbm_shift`.
    ///
    /// Defect levels are assumed to stay where they are.
    pub fn correct_band_gap_simple(&mut self, vbm_shift: f64, cbm_shift: f64) -> Result<(), EngineError> {
        self.shift_band_edges(vbm_shift, cbm_shift)?;
        self.recompute()
    }

    /// Opens the band gap and moves the levels of the defects listed in `levels` with the
    /// band edge they are derived from. Defects not listed keep their levels.
    pub fn correct_band_gap(
        &mut self,
        levels: &BTreeMap<String, LevelAlignment>,
        vbm_shift: f64,
        cbm_shift: f64,
    ) -> Result<(), EngineError> {
        self.shift_band_edges(vbm_shift, cbm_shift)?;
        for defect in &mut self.defects {
            if let Some(alignment) = levels.get(&defect.name) {
                defect.level_shift += alignment.shift(defect.charge, vbm_shift, cbm_shift);
            }
        }
        self.recompute()
    }

    fn shift_band_edges(&mut self, vbm_shift: f64, cbm_shift: f64) -> Result<(), EngineError> {
        if !(vbm_shift.is_finite() && cbm_shift.is_finite()) {
            return Err(EngineError::InvalidInput(
                "band-edge shifts must be finite".to_string(),
            ));
        }
        let band_gap = self.band_gap + vbm_shift + cbm_shift;
        check_band_gap(band_gap)?;
        info!(
            "Correcting band gap: {:.4} -> {:.4} eV (VBM {:.4} -> {:.4} eV).",
            self.band_gap,
            band_gap,
            self.e_vbm,
            self.e_vbm - vbm_shift
        );
        self.band_gap = band_gap;
        self.e_vbm -= vbm_shift;
        Ok(())
    }

    fn recompute(&mut self) -> Result<(), EngineError> {
        let energies = self
            .defects
            .iter()
            .map(|d| self.formation_energy_at_vbm(d))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Recomputed {} formation energies.", energies.len());
        self.formation_energies = energies;
        Ok(())
    }

    fn formation_energy_at_vbm(&self, defect: &ParsedDefect) -> Result<f64, EngineError> {
        let reservoirs = formation::reservoir_energy(
            self.bulk.composition(),
            &defect.entry.composition,
            &self.chemical_potentials,
        )?;
        Ok(defect.entry.energy - self.bulk.energy()
            + reservoirs
            + f64::from(defect.charge) * self.e_vbm
            + defect.charge_correction
            + defect.level_shift)
    }

    /// Formation energy of the defect at `index` for a Fermi level `fermi_level` (eV above the VBM).
    pub fn formation_energy(&self, index: usize, fermi_level: f64) -> Result<f64, EngineError> {
        let len = self.defects.len();
        let (defect, energy) = self
            .defects
            .get(index)
            .zip(self.formation_energies.get(index))
            .ok_or(EngineError::DefectIndexOutOfRange { index, len })?;
        Ok(formation::at_fermi_level(*energy, defect.charge, fermi_level))
    }

    /// Fermi-level window `[−0.5, E_g + 1.5)` eV over which transition levels are reported.
    pub fn fermi_window(&self) -> (f64, f64) {
        (-WINDOW_BELOW_VBM, self.band_gap + WINDOW_ABOVE_CBM)
    }

    /// Lowest formation energy at the VBM of each charge state of `name`, highest charge first.
    fn charge_state_lines(&self, name: &str) -> Vec<(i32, f64)> {
        let mut lines: BTreeMap<i32, f64> = BTreeMap::new();
        for (defect, energy) in self.defects.iter().zip(&self.formation_energies) {
            if defect.name == name {
                lines
                    .entry(defect.charge)
                    .and_modify(|e| *e = e.min(*energy))
                    .or_insert(*energy);
            }
        }
        lines.into_iter().rev().collect()
    }

    fn lines_for(&self, name: &str) -> Result<Vec<(i32, f64)>, EngineError> {
        let lines = self.charge_state_lines(name);
        if lines.is_empty() {
            return Err(EngineError::UnknownDefect(name.to_string()));
        }
        Ok(lines)
    }

    /// Crossing points of every pair of charge states of every defect inside the
    /// [`fermi_window`](Self::fermi_window), whether or not the states are stable there.
    pub fn transition_levels(&self) -> Vec<TransitionLevel> {
        let (lo, hi) = self.fermi_window();
        let mut levels = Vec::new();
        for name in self.defect_names() {
            let lines = self.charge_state_lines(name);
            for ((qa, ea), (qb, eb)) in lines.iter().tuple_combinations() {
                let Some(x) = formation::crossing_point(*ea, *qa, *eb, *qb) else {
                    continue;
                };
                if (lo..hi).contains(&x) {
                    levels.push(TransitionLevel {
                        name: name.to_string(),
                        charges: (*qa, *qb),
                        fermi_level: x,
                    });
                }
            }
        }
        levels
    }

    /// Thermodynamic transition levels of `name`: the Fermi levels inside the window at which
    /// the charge state with the lowest formation energy changes.
    pub fn stable_transition_levels(&self, name: &str) -> Result<Vec<TransitionLevel>, EngineError> {
        let lines = self.lines_for(name)?;
        let (lo, hi) = self.fermi_window();

        let mut current = lowest_line(&lines, lo);
        let mut x = lo;
        let mut levels = Vec::new();
        loop {
            let (qc, ec) = current;
            let next = lines
                .iter()
                .filter(|(q, _)| *q < qc)
                .filter_map(|&(q, e)| {
                    formation::crossing_point(ec, qc, e, q)
                        .filter(|xc| *xc > x)
                        .map(|xc| (xc, (q, e)))
                })
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.0.cmp(&b.1.0)));
            match next {
                Some((xc, line)) if xc < hi => {
                    levels.push(TransitionLevel {
                        name: name.to_string(),
                        charges: (qc, line.0),
                        fermi_level: xc,
                    });
                    current = line;
                    x = xc;
                }
                _ => break,
            }
        }
        Ok(levels)
    }

    /// Samples the lowest formation energy of `name` on `points` evenly spaced Fermi levels
    /// spanning the window, endpoints included.
    pub fn formation_energy_profile(&self, name: &str, points: usize) -> Result<Vec<ProfilePoint>, EngineError> {
        if points < 2 {
            return Err(EngineError::InvalidInput(format!(
                "a profile needs at least 2 points, got {}",
                points
            )));
        }
        let lines = self.lines_for(name)?;
        let (lo, hi) = self.fermi_window();
        let step = (hi - lo) / (points - 1) as f64;
        Ok((0..points)
            .map(|i| {
                let x = if i + 1 == points { hi } else { lo + step * i as f64 };
                let (charge, energy) = lowest_line(&lines, x);
                ProfilePoint {
                    fermi_level: x,
                    formation_energy: formation::at_fermi_level(energy, charge, x),
                    charge,
                }
            })
            .collect())
    }

    /// Density of available sites (m⁻³) for each defect, in defect order.
    ///
    /// Uses the explicit multiplicity when given, otherwise the size of the symmetry
    /// equivalence class of the bulk site matched within [`SITE_MATCH_TOLERANCE`].
    pub fn site_densities(&self) -> Result<Vec<f64>, EngineError> {
        let structure = &self.bulk.structure;
        let volume = structure.volume();
        self.defects
            .iter()
            .map(|d| {
                let multiplicity = match d.multiplicity {
                    Some(m) => m,
                    None => structure.equivalent_site_count(&d.site, SITE_MATCH_TOLERANCE)?,
                };
                Ok(concentration::site_density(multiplicity, volume)?)
            })
            .collect()
    }

    /// Equilibrium concentration of every defect for a temperature (K) and Fermi level (eV).
    pub fn defect_concentrations(
        &self,
        temperature: f64,
        fermi_level: f64,
    ) -> Result<Vec<DefectConcentration>, EngineError> {
        let densities = self.site_densities()?;
        self.concentrations_with(&densities, temperature, fermi_level)
    }

    pub(crate) fn concentrations_with(
        &self,
        site_densities: &[f64],
        temperature: f64,
        fermi_level: f64,
    ) -> Result<Vec<DefectConcentration>, EngineError> {
        self.defects
            .iter()
            .zip(&self.formation_energies)
            .zip(site_densities)
            .map(|((defect, energy), density)| {
                let e_f = formation::at_fermi_level(*energy, defect.charge, fermi_level);
                Ok(DefectConcentration {
                    name: defect.name.clone(),
                    charge: defect.charge,
                    concentration: concentration::boltzmann_concentration(*density, e_f, temperature)?,
                })
            })
            .collect()
    }
}

/// The line with the lowest value at `x`; ties go to the lower charge, which stays lowest
/// to the right of `x`.
fn lowest_line(lines: &[(i32, f64)], x: f64) -> (i32, f64) {
    let mut best = lines[0];
    for &(q, e) in &lines[1..] {
        let value = formation::at_fermi_level(e, q, x);
        let best_value = formation::at_fermi_level(best.1, best.0, x);
        if value <= best_value {
            best = (q, e);
        }
    }
    best
}

fn check_band_gap(band_gap: f64) -> Result<(), EngineError> {
    if band_gap.is_finite() && band_gap >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!(
            "band gap must be non-negative, got {}",
            band_gap
        )))
    }
}

fn check_defect(defect: &ParsedDefect) -> Result<(), EngineError> {
    if !defect.entry.energy.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "energy of '{}' must be finite",
            defect.full_name()
        )));
    }
    if !(defect.charge_correction.is_finite() && defect.level_shift.is_finite()) {
        return Err(EngineError::InvalidInput(format!(
            "corrections of '{}' must be finite",
            defect.full_name()
        )));
    }
    Ok(())
}
