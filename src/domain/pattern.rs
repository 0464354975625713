// ============================================================
// Layer 3 — Diffraction Pattern Record
// ============================================================
// One row of a simulated XRD dataset as it arrives from disk,
// before any validation or label re-indexing.
//
// Labels are 1-indexed, as in the simXRD database. The data
// layer shifts them to 0-indexed class ids for the loss.

use serde::{Deserialize, Serialize};

use crate::domain::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Diffraction intensity, normalised to 100, one value per lattice distance
    pub intensity: Vec<f32>,

    /// Lattice plane distances matching `intensity`
    #[serde(default)]
    pub latt_dis: Vec<f32>,

    /// Space group number, 1..=230
    pub spg: i64,

    /// Crystal system, 1..=7
    pub crysystem: i64,

    /// Bravais lattice type, 1..=6
    pub blt: i64,

    /// One symbol per atom in the unit cell, e.g. ["La", "La", "Pd", "Pd"]
    pub symbols: Vec<String>,

    #[serde(default)]
    pub formula: Option<String>,

    #[serde(default)]
    pub mass: Option<f64>,
}

impl PatternRecord {
    /// Raw 1-indexed label for a categorical task.
    pub fn label(&self, task: Task) -> Option<i64> {
        match task {
            Task::Spg         => Some(self.spg),
            Task::Crysystem   => Some(self.crysystem),
            Task::Blt         => Some(self.blt),
            Task::Composition => None,
        }
    }

    /// Formula if recorded, otherwise the symbols joined together.
    pub fn display_formula(&self) -> String {
        match &self.formula {
            Some(f) => f.clone(),
            None    => self.symbols.concat(),
        }
    }
}
