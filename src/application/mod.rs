// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// ml and infra layers together for one CLI command. No tensor
// math lives here.

/// Load data, build the model, run the training loop
pub mod train_use_case;

/// Load a checkpoint and predict every task on a pattern file
pub mod evaluate_use_case;

/// Dataset statistics without a model
pub mod inspect_use_case;
