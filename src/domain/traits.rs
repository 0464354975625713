// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The model never knows where its patterns come from. Anything
// that can hand over a list of PatternRecords is a source:
//   - JsonlLoader → one JSON object per line
//   - (future) an ASE database reader
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::pattern::PatternRecord;

// ─── PatternSource ────────────────────────────────────────────────────────────
/// Any component that can load diffraction patterns.
pub trait PatternSource {
    /// Load every available record, in storage order.
    fn load_all(&self) -> Result<Vec<PatternRecord>>;
}
