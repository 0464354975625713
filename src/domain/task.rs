// ============================================================
// Layer 3 — Prediction Tasks
// ============================================================
// The four supervised tasks attached to every XRD pattern, and
// the label-space size for each one.
//
//   Task         Key            Classes   Loss
//   ──────────   ────────────   ───────   ─────────────
//   Space group  "spg"          230       cross-entropy
//   Crystal sys  "crysystem"    7         cross-entropy
//   Bravais lat  "blt"          6         cross-entropy
//   Composition  "composition"  118       mean squared
//
// The string keys are the contract between the model output
// mapping and any loss/metric collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four supervised objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Spg,
    Crysystem,
    Blt,
    Composition,
}

impl Task {
    /// All tasks in output order.
    pub const ALL: [Task; 4] = [Task::Spg, Task::Crysystem, Task::Blt, Task::Composition];

    pub fn key(self) -> &'static str {
        match self {
            Task::Spg         => "spg",
            Task::Crysystem   => "crysystem",
            Task::Blt         => "blt",
            Task::Composition => "composition",
        }
    }

    pub fn is_classification(self) -> bool {
        !matches!(self, Task::Composition)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// Output cardinality of each task head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCardinalities {
    pub spg:         usize,
    pub crysystem:   usize,
    pub blt:         usize,
    pub composition: usize,
}

impl TaskCardinalities {
    /// The simXRD label spaces.
    pub const fn reference() -> Self {
        Self { spg: 230, crysystem: 7, blt: 6, composition: 118 }
    }

    pub fn get(&self, task: Task) -> usize {
        match task {
            Task::Spg         => self.spg,
            Task::Crysystem   => self.crysystem,
            Task::Blt         => self.blt,
            Task::Composition => self.composition,
        }
    }
}

impl Default for TaskCardinalities {
    fn default() -> Self {
        Self::reference()
    }
}

/// Human-readable name of a 1-indexed crystal system label.
pub fn crystal_system_name(label: u32) -> Option<&'static str> {
    match label {
        1 => Some("Cubic"),
        2 => Some("Hexagonal"),
        3 => Some("Tetragonal"),
        4 => Some("Orthorhombic"),
        5 => Some("Trigonal"),
        6 => Some("Monoclinic"),
        7 => Some("Triclinic"),
        _ => None,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_cardinalities() {
        let c = TaskCardinalities::reference();
        assert_eq!(c.get(Task::Spg), 230);
        assert_eq!(c.get(Task::Crysystem), 7);
        assert_eq!(c.get(Task::Blt), 6);
        assert_eq!(c.get(Task::Composition), 118);
    }

    #[test]
    fn test_task_keys() {
        let keys: Vec<&str> = Task::ALL.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["spg", "crysystem", "blt", "composition"]);
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&Task::Crysystem).unwrap();
        assert_eq!(json, "\"crysystem\"");
    }

    #[test]
    fn test_only_composition_is_regression() {
        for t in [Task::Spg, Task::Crysystem, Task::Blt] {
            assert!(t.is_classification());
        }
        assert!(!Task::Composition.is_classification());
    }

    #[test]
    fn test_crystal_system_names() {
        assert_eq!(crystal_system_name(1), Some("Cubic"));
        assert_eq!(crystal_system_name(7), Some("Triclinic"));
        assert_eq!(crystal_system_name(0), None);
    }
}
