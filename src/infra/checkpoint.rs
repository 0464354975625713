// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's named
// MessagePack + gzip recorder at full precision, so a reloaded
// model reproduces the saved one bit for bit.
//
// Files per run:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     ...
//     latest_epoch.json      ← number of the latest epoch
//     train_config.json      ← TrainConfig incl. ModelConfig
//
// Loading is strict. It fails with a CheckpointError when:
//   1. the saved ModelConfig differs from the requested one
//   2. the record cannot be decoded (missing/unknown names)
//   3. any parameter shape differs from the live architecture
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::error::{CheckpointError, XrdError};
use crate::ml::config::ModelConfig;
use crate::ml::model::XrdNet;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights for a given epoch and mark it as latest.
    pub fn save_model<B: Backend>(&self, model: &XrdNet<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        save_weights(model, &path)?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest weights into `model`.
    ///
    /// `expected` is the architecture `model` was built from; it
    /// must match the config saved with the run.
    pub fn load_model<B: Backend>(
        &self,
        expected: &ModelConfig,
        model:    XrdNet<B>,
        device:   &B::Device,
    ) -> Result<XrdNet<B>> {
        let saved = self.load_config()?.model;
        if let Some(diff) = expected.describe_mismatch(&saved) {
            return Err(XrdError::from(CheckpointError::ConfigMismatch(diff)).into());
        }

        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        Ok(load_weights(model, &path, device).map_err(XrdError::from)?)
    }

    /// Must be called before training starts so evaluation can
    /// rebuild the exact model architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'evaluate'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training config '{}'", path.display()))
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

/// Write `model`'s parameters to `{path}.mpk.gz`.
pub fn save_weights<B: Backend>(model: &XrdNet<B>, path: &Path) -> Result<()> {
    CheckpointRecorder::new()
        .record(model.clone().into_record(), path.to_path_buf())
        .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
}

/// Read `{path}.mpk.gz` into `model`, then verify every parameter
/// kept the name and shape the live architecture expects.
///
/// The record must come from a model of the same variant; the
/// variant itself is checked against train_config.json in
/// `CheckpointManager::load_model`.
pub fn load_weights<B: Backend>(
    model:  XrdNet<B>,
    path:   &Path,
    device: &B::Device,
) -> Result<XrdNet<B>, CheckpointError> {
    let expected = model.param_shapes();

    let record = CheckpointRecorder::new()
        .load(path.to_path_buf(), device)
        .map_err(|e| CheckpointError::Decode {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let loaded = model.load_record(record);

    verify_shapes(&expected, &loaded.param_shapes())?;
    Ok(loaded)
}

fn verify_shapes(
    expected: &[(String, Vec<usize>)],
    actual:   &[(String, Vec<usize>)],
) -> Result<(), CheckpointError> {
    if expected.len() != actual.len() {
        return Err(CheckpointError::ParamCount { expected: expected.len(), actual: actual.len() });
    }
    for ((name, want), (_, got)) in expected.iter().zip(actual) {
        if want != got {
            return Err(CheckpointError::ParamShape {
                name:     name.clone(),
                expected: want.clone(),
                actual:   got.clone(),
            });
        }
    }
    Ok(())
}
