// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// Layer 2 use case:
//
//   1. `train`    — fit the model on JSONL patterns
//   2. `evaluate` — load a checkpoint and predict a file
//   3. `inspect`  — dataset statistics, no model

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, InspectArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "xrd-fcn",
    version = "0.1.0",
    about = "Classify crystal structure from 1-D X-ray diffraction patterns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.train_data);
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    EvaluateUseCase::new(args.checkpoint_dir, args.data, args.batch_size, args.device, args.output)
        .execute()?;
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let summary = InspectUseCase::new(args.data).execute()?;
    print!("{}", summary.report());
    Ok(())
}
