// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `evaluate` and `inspect`.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::infra::device::DeviceKind;
use crate::ml::config::{ModelConfig, REFERENCE_INPUT_LEN};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on JSON-lines pattern files
    Train(TrainArgs),

    /// Predict every task on a pattern file with the latest checkpoint
    Evaluate(EvaluateArgs),

    /// Print label and composition statistics for a pattern file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training patterns, one JSON object per line
    #[arg(long, default_value = "data/train.jsonl")]
    pub train_data: String,

    /// Validation patterns, same format
    #[arg(long, default_value = "data/val.jsonl")]
    pub val_data: String,

    /// Directory for checkpoints, config and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Train all four heads instead of space group only
    #[arg(long)]
    pub multi_task: bool,

    /// Points per diffraction pattern
    #[arg(long, default_value_t = REFERENCE_INPUT_LEN)]
    pub input_len: usize,

    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 25)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// DataLoader worker threads for training batches
    #[arg(long, default_value_t = 8)]
    pub num_workers: usize,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    #[arg(long, value_enum, default_value_t = DeviceKind::Auto)]
    pub device: DeviceKind,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let model = (if a.multi_task { ModelConfig::multi_task() } else { ModelConfig::single_task() })
            .with_input_len(a.input_len)
            .with_dropout(a.dropout);

        TrainConfig {
            train_data:     a.train_data,
            val_data:       a.val_data,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            num_workers:    a.num_workers,
            seed:           a.seed,
            optimizer:      a.optimizer,
            device:         a.device,
            model,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Patterns to predict
    #[arg(long)]
    pub data: String,

    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = DeviceKind::Auto)]
    pub device: DeviceKind,

    /// Write predictions and labels as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long)]
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::ml::config::ModelVariant;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["xrd-fcn", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model.variant, ModelVariant::SingleTask);
        assert_eq!(cfg.model.input_len, 3501);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.device, DeviceKind::Auto);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "xrd-fcn", "train", "--multi-task", "--device", "cpu", "--optimizer", "sgd", "--epochs", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model.variant, ModelVariant::MultiTask);
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.device, DeviceKind::Cpu);
        assert_eq!(cfg.epochs, 3);
    }

    #[test]
    fn test_evaluate_requires_data() {
        assert!(Cli::try_parse_from(["xrd-fcn", "evaluate"]).is_err());
        let cli = Cli::try_parse_from(["xrd-fcn", "evaluate", "--data", "t.jsonl", "--output", "p.json"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(args.output, Some(PathBuf::from("p.json")));
    }
}
