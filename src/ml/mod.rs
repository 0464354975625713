// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn module code for the XRD classifier:
//
//   blocks.rs    — conv → ReLU → (max-pool) → dropout unit
//   trunk.rs     — ten shared reduction blocks, 1 → 256 channels
//   heads.rs     — per-task branches and the single / multi head
//   config.rs    — ModelConfig, shape planning, construction
//   model.rs     — XrdNet: validated forward pass and losses
//   trainer.rs   — training loop with per-epoch validation
//   evaluator.rs — ordered predictions + labels per task
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

pub mod blocks;
pub mod trunk;
pub mod heads;
pub mod config;

/// Fully-convolutional multi-task network
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Batch-stream evaluation
pub mod evaluator;
