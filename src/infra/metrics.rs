// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch:
//
//   epoch,train_loss,val_loss,spg_acc,crysystem_acc,blt_acc,composition_mse
//   1,5.312004,5.201113,0.041000,,,
//
// Tasks that the model does not predict leave their cell empty,
// so single-task runs only fill spg_acc.
//
// Output file: {checkpoint_dir}/metrics.csv

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::task::Task;

const HEADER: &str = "epoch,train_loss,val_loss,spg_acc,crysystem_acc,blt_acc,composition_mse";

/// Metrics for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    /// Accuracy for classification tasks, MSE for composition
    pub task_scores: BTreeMap<Task, f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, task_scores: BTreeMap<Task, f64>) -> Self {
        Self { epoch, train_loss, val_loss, task_scores }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }

    fn csv_row(&self) -> String {
        let cells: Vec<String> = Task::ALL
            .iter()
            .map(|t| self.task_scores.get(t).map(|v| format!("{v:.6}")).unwrap_or_default())
            .collect();
        format!(
            "{},{:.6},{:.6},{}",
            self.epoch,
            self.train_loss,
            self.val_loss,
            cells.join(",")
        )
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;
        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, BTreeMap::new());
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_single_task_row_leaves_cells_empty() {
        let scores = BTreeMap::from([(Task::Spg, 0.25)]);
        let m = EpochMetrics::new(1, 5.0, 4.5, scores);
        assert_eq!(m.csv_row(), "1,5.000000,4.500000,0.250000,,,");
    }

    #[test]
    fn test_log_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let scores = BTreeMap::from([
            (Task::Spg, 0.5),
            (Task::Crysystem, 0.75),
            (Task::Blt, 1.0),
            (Task::Composition, 0.125),
        ]);
        logger.log(&EpochMetrics::new(1, 1.0, 2.0, scores.clone())).unwrap();
        logger.log(&EpochMetrics::new(2, 0.5, 1.5, scores)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "2,0.500000,1.500000,0.500000,0.750000,1.000000,0.125000");
    }

    #[test]
    fn test_existing_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EpochMetrics::new(1, 1.0, 1.0, BTreeMap::new()))
            .unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let text   = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
