// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds the trained architecture from train_config.json,
// loads the latest checkpoint and runs the Evaluator over one
// pattern file.
//
//   Step 1: Load saved TrainConfig         (Layer 6 - infra)
//   Step 2: Load + validate patterns       (Layer 4 - data)
//   Step 3: Build model, load weights      (Layer 5 + 6)
//   Step 4: Evaluate in file order         (Layer 5 - ml)
//   Step 5: Print summary / write JSON     (Layer 2)

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::load_split;
use crate::data::{batcher::XrdBatcher, dataset::XrdDataset};
use crate::domain::task::Task;
use crate::error::XrdError;
use crate::infra::{
    checkpoint::CheckpointManager,
    device::{ComputeDevice, CpuBackend, DeviceKind, GpuBackend},
};
use crate::ml::{
    config::ModelConfig,
    evaluator::{EvaluationResult, Evaluator},
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    data:           String,
    batch_size:     usize,
    device:         DeviceKind,
    output:         Option<PathBuf>,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: String,
        data:           String,
        batch_size:     usize,
        device:         DeviceKind,
        output:         Option<PathBuf>,
    ) -> Self {
        Self { checkpoint_dir, data, batch_size, device, output }
    }

    pub fn execute(&self) -> Result<EvaluationResult> {
        self.execute_on(self.device.resolve()?)
    }

    /// Run on an already resolved device.
    pub fn execute_on(&self, device: ComputeDevice) -> Result<EvaluationResult> {
        let manager   = CheckpointManager::new(&self.checkpoint_dir)?;
        let model_cfg = manager.load_config()?.model;
        let dataset   = load_split(&self.data, &model_cfg)?;
        tracing::info!("Evaluating {} patterns", dataset.sample_count());

        let result = match device {
            ComputeDevice::Wgpu(device) => {
                evaluate::<GpuBackend>(&manager, &model_cfg, dataset, self.batch_size, device)?
            }
            ComputeDevice::Cpu(device) => {
                evaluate::<CpuBackend>(&manager, &model_cfg, dataset, self.batch_size, device)?
            }
        };

        if result.predictions[&Task::Spg].is_empty() {
            tracing::warn!("'{}' holds no patterns, nothing was evaluated", self.data);
        }
        println!("{}", result.summary());

        if let Some(path) = &self.output {
            let json = serde_json::to_string_pretty(&result)?;
            fs::write(path, json)
                .with_context(|| format!("Cannot write predictions to '{}'", path.display()))?;
            tracing::info!("Wrote predictions to '{}'", path.display());
        }
        Ok(result)
    }
}

fn evaluate<B: Backend>(
    manager:    &CheckpointManager,
    model_cfg:  &ModelConfig,
    dataset:    XrdDataset,
    batch_size: usize,
    device:     B::Device,
) -> Result<EvaluationResult> {
    let model = model_cfg.init::<B>(&device).map_err(XrdError::from)?;
    let model = manager.load_model(model_cfg, model, &device)?;

    // No shuffle, no workers: batches must arrive in file order
    let loader = DataLoaderBuilder::new(XrdBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);

    Ok(Evaluator::new(model, device).run(loader.iter())?)
}
