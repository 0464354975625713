// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Joint train + validation loop using Burn's DataLoader.
//
//   - Training runs on Autodiff<Wgpu> or Autodiff<NdArray>
//   - One backward pass per batch over the summed task losses;
//     heads only receive gradient from their own loss, the
//     trunk receives all of them
//   - model.valid() drops to the inner backend: dropout off,
//     no gradient tape
//   - One checkpoint and one metrics row per epoch
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::collections::BTreeMap;

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::{batcher::XrdBatcher, dataset::XrdDataset};
use crate::domain::task::Task;
use crate::error::XrdError;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::device::{ComputeDevice, CpuBackend, GpuBackend};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::argmax_rows;
use crate::ml::model::XrdNet;

type GpuTrainBackend = burn::backend::Autodiff<GpuBackend>;
type CpuTrainBackend = burn::backend::Autodiff<CpuBackend>;

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: XrdDataset,
    val_dataset:   XrdDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<()> {
    match cfg.device.resolve()? {
        ComputeDevice::Wgpu(device) => {
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<GpuTrainBackend>(cfg, train_dataset, val_dataset, ckpt_manager, device)
        }
        ComputeDevice::Cpu(device) => {
            tracing::info!("Using NdArray CPU device");
            train_loop::<CpuTrainBackend>(cfg, train_dataset, val_dataset, ckpt_manager, device)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: XrdDataset,
    val_dataset:   XrdDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<()> {
    let model: XrdNet<B> = cfg.model.init(&device).map_err(XrdError::from)?;
    tracing::info!(
        "Model ready: {:?}, input length {}, {} parameters",
        model.variant(), cfg.model.input_len, model.num_params()
    );

    match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().with_epsilon(1e-8).init::<B, XrdNet<B>>();
            epoch_loop(cfg, model, optim, train_dataset, val_dataset, ckpt_manager, device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().init::<B, XrdNet<B>>();
            epoch_loop(cfg, model, optim, train_dataset, val_dataset, ckpt_manager, device)
        }
    }
}

fn epoch_loop<B, O>(
    cfg:           &TrainConfig,
    mut model:     XrdNet<B>,
    mut optim:     O,
    train_dataset: XrdDataset,
    val_dataset:   XrdDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<XrdNet<B>, B>,
{
    let metrics = MetricsLogger::new(ckpt_manager.dir())?;

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(XrdBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers.max(1))
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(XrdBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers.max(1))
        .build(val_dataset);

    let mut best_val_loss = f64::INFINITY;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _, _) = model.forward_loss(&batch).map_err(XrdError::from)?;

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut tally   = ValidationTally::default();

        for batch in val_loader.iter() {
            let (loss, terms, output) = model_valid.forward_loss(&batch).map_err(XrdError::from)?;
            let n = batch.batch_size();
            tally.add_loss(loss.into_scalar().elem::<f64>());
            tally.samples += n;

            for (task, term) in terms {
                if let Some(labels) = batch.class_labels(task) {
                    let Some(logits) = output.get(task) else { continue };
                    let predicted = argmax_rows(logits.clone());
                    let labels: Vec<i64> = labels.into_data().iter::<i64>().collect();
                    let correct = predicted.iter().zip(&labels).filter(|(p, l)| p == l).count();
                    *tally.correct.entry(task).or_default() += correct;
                } else {
                    // batch mean → weighted by batch size
                    *tally.squared_error.entry(task).or_default() +=
                        term.into_scalar().elem::<f64>() * n as f64;
                }
            }
        }

        let row = tally.into_metrics(epoch, avg_train_loss, model.variant().tasks());
        let scores = row
            .task_scores
            .iter()
            .map(|(task, v)| if task.is_classification() {
                format!("{task}_acc={:.1}%", v * 100.0)
            } else {
                format!("{task}_mse={v:.4}")
            })
            .collect::<Vec<_>>()
            .join(" | ");

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | {}",
            epoch, cfg.epochs, row.train_loss, row.val_loss, scores,
        );

        if row.is_improvement(best_val_loss) {
            tracing::info!("Validation loss improved: {:.4} → {:.4}", best_val_loss, row.val_loss);
            best_val_loss = row.val_loss;
        }
        metrics.log(&row)?;

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    Ok(())
}

/// Running sums over one validation pass.
#[derive(Default)]
struct ValidationTally {
    loss_sum:      f64,
    batches:       usize,
    samples:       usize,
    correct:       BTreeMap<Task, usize>,
    squared_error: BTreeMap<Task, f64>,
}

impl ValidationTally {
    fn add_loss(&mut self, loss: f64) {
        self.loss_sum += loss;
        self.batches  += 1;
    }

    fn into_metrics(self, epoch: usize, train_loss: f64, tasks: &[Task]) -> EpochMetrics {
        let val_loss = if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN };
        let total    = self.samples.max(1) as f64;

        let task_scores = tasks
            .iter()
            .map(|&task| {
                let score = if task.is_classification() {
                    self.correct.get(&task).copied().unwrap_or(0) as f64 / total
                } else {
                    self.squared_error.get(&task).copied().unwrap_or(0.0) / total
                };
                (task, score)
            })
            .collect();

        EpochMetrics::new(epoch, train_loss, val_loss, task_scores)
    }
}
