// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a dataset file on disk to device tensors:
//
//   patterns.jsonl
//       │
//       ▼
//   JsonlLoader       → reads PatternRecords
//       │
//       ▼
//   XrdSample         → validates length/labels, builds composition
//       │
//       ▼
//   XrdDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   XrdBatcher        → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to training / evaluation
//
// stats.rs summarises a record list for the `inspect` command.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON-lines pattern files
pub mod loader;

/// Validated samples and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Label and composition statistics for inspection
pub mod stats;
