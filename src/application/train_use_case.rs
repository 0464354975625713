// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Check the architecture        (Layer 5 - ml)
//   Step 2: Load train / val patterns     (Layer 4 - data)
//   Step 3: Validate into samples         (Layer 4 - data)
//   Step 4: Build datasets                (Layer 4 - data)
//   Step 5: Save config                   (Layer 6 - infra)
//   Step 6: Run training loop             (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{samples_from_records, XrdDataset},
    loader::JsonlLoader,
};
use crate::domain::traits::PatternSource;
use crate::error::XrdError;
use crate::infra::{checkpoint::CheckpointManager, device::DeviceKind};
use crate::ml::config::ModelConfig;
use crate::ml::trainer::run_training;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialised next to the checkpoints so `evaluate` can rebuild
// the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_data:     String,
    pub val_data:       String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub num_workers:    usize,
    pub seed:           u64,
    pub optimizer:      OptimizerKind,
    pub device:         DeviceKind,
    pub model:          ModelConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_data:     "data/train.jsonl".to_string(),
            val_data:       "data/val.jsonl".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     32,
            epochs:         25,
            lr:             1e-3,
            num_workers:    8,
            seed:           42,
            optimizer:      OptimizerKind::Adam,
            device:         DeviceKind::Auto,
            model:          ModelConfig::single_task(),
        }
    }
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Fail before touching data if the model can't be built ────
        let plan = cfg.model.plan().map_err(XrdError::from)?;
        tracing::info!(
            "Architecture: {:?}, trunk output length {}, head extent {}",
            cfg.model.variant, plan.trunk_len(), plan.head_extent
        );

        // ── Step 2 + 3: Load and validate both splits ────────────────────────
        let train_dataset = load_split(&cfg.train_data, &cfg.model)?;
        let val_dataset   = load_split(&cfg.val_data, &cfg.model)?;
        tracing::info!(
            "Split: {} train, {} validation",
            train_dataset.sample_count(),
            val_dataset.sample_count()
        );

        // ── Step 5: Save config for evaluation ───────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Run training loop (Layer 5) ──────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager)
    }
}

/// Read one JSONL file into a validated dataset.
pub fn load_split(path: &str, model: &ModelConfig) -> Result<XrdDataset> {
    tracing::info!("Loading patterns from '{}'", path);
    let records = JsonlLoader::new(path).load_all()?;
    let samples = samples_from_records(&records, model.input_len, &model.cardinalities)
        .map_err(XrdError::from)
        .with_context(|| format!("Invalid patterns in '{}'", path))?;
    Ok(XrdDataset::new(samples))
}
