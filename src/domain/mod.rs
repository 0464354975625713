// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the problem:
//
//   task.rs     — the four prediction tasks and their label sizes
//   pattern.rs  — one raw XRD record as stored on disk
//   elements.rs — periodic table lookup for composition vectors
//   traits.rs   — the PatternSource abstraction
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod task;

pub mod pattern;

pub mod elements;

pub mod traits;
