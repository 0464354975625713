// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs — model weights + TrainConfig on disk, strict
//                   reload with name / shape verification
//   metrics.rs    — one CSV row per epoch
//   device.rs     — WGPU or NdArray backend selection
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Compute device selection
pub mod device;
