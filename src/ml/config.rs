// ============================================================
// Layer 5 — Model Configuration and Shape Plan
// ============================================================
// ModelConfig names every knob of the architecture: variant,
// task label sizes, input length, dropout. Channel widths and
// kernel sizes stay fixed in the block tables.
//
// `plan()` walks the block tables over the configured input
// length before any weights exist. It rejects:
//   - consecutive blocks whose channel counts disagree
//   - an input too short to survive ten halvings
//   - a head whose final spatial extent is not exactly 1, since
//     its flattened width would then not be the class count
//
// At L = 3501 the trunk ends at length 2 and each head conv
// brings that to 1.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::task::{Task, TaskCardinalities};
use crate::error::ConstructionError;
use crate::ml::blocks::BlockSpec;
use crate::ml::heads::{head_block_spec, Head, MultiTaskHeads, TaskBranch};
use crate::ml::model::XrdNet;
use crate::ml::trunk::{FeatureTrunk, INPUT_CHANNELS, TRUNK_BLOCKS};

pub const REFERENCE_INPUT_LEN: usize = 3501;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Space-group head only
    SingleTask,
    /// spg, crysystem, blt and composition heads
    MultiTask,
}

impl ModelVariant {
    pub fn tasks(self) -> &'static [Task] {
        match self {
            ModelVariant::SingleTask => &[Task::Spg],
            ModelVariant::MultiTask  => &Task::ALL,
        }
    }
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct ModelConfig {
    pub variant:       ModelVariant,
    pub cardinalities: TaskCardinalities,
    #[config(default = 3501)]
    pub input_len:     usize,
    #[config(default = 0.3)]
    pub dropout:       f64,
}

/// Sequence lengths the configured input goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapePlan {
    /// Length after each trunk block
    pub trunk_lengths: Vec<usize>,
    /// Spatial extent left after each head's block
    pub head_extent:   usize,
}

impl ShapePlan {
    pub fn trunk_len(&self) -> usize {
        self.trunk_lengths.last().copied().unwrap_or(0)
    }
}

impl ModelConfig {
    pub fn single_task() -> Self {
        Self::new(ModelVariant::SingleTask, TaskCardinalities::reference())
    }

    pub fn multi_task() -> Self {
        Self::new(ModelVariant::MultiTask, TaskCardinalities::reference())
    }

    /// Architecture fields that a checkpoint must agree on.
    pub fn describe_mismatch(&self, other: &ModelConfig) -> Option<String> {
        if self.variant != other.variant {
            return Some(format!("variant {:?} vs {:?}", other.variant, self.variant));
        }
        if self.cardinalities != other.cardinalities {
            return Some(format!(
                "cardinalities {:?} vs {:?}",
                other.cardinalities, self.cardinalities
            ));
        }
        if self.input_len != other.input_len {
            return Some(format!("input length {} vs {}", other.input_len, self.input_len));
        }
        None
    }

    pub fn plan(&self) -> Result<ShapePlan, ConstructionError> {
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConstructionError::InvalidDropout(self.dropout));
        }

        let trunk_lengths = walk_blocks("trunk", &TRUNK_BLOCKS, INPUT_CHANNELS, self.input_len)?;
        let trunk_len     = trunk_lengths.last().copied().unwrap_or(self.input_len);
        let trunk_out     = TRUNK_BLOCKS[TRUNK_BLOCKS.len() - 1].out_channels;

        let mut head_extent = 0;
        for &task in self.variant.tasks() {
            let spec    = head_block_spec(task);
            let lengths = walk_blocks(&format!("{task} head"), &[spec], trunk_out, trunk_len)
                .map_err(|e| match e {
                    ConstructionError::NonPositiveExtent { stage, .. } => {
                        ConstructionError::NonPositiveExtent { stage, input_len: self.input_len }
                    }
                    other => other,
                })?;
            // The k=1 projection keeps length.
            let extent      = lengths[0];
            let cardinality = self.cardinalities.get(task);
            if extent != 1 {
                return Err(ConstructionError::SpatialExtentMismatch {
                    task,
                    input_len: self.input_len,
                    extent,
                    width: cardinality * extent,
                    cardinality,
                });
            }
            head_extent = extent;
        }

        Ok(ShapePlan { trunk_lengths, head_extent })
    }

    /// Validate the shape plan, then allocate weights on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<XrdNet<B>, ConstructionError> {
        let plan = self.plan()?;
        tracing::debug!(
            "Shape plan for L={}: trunk lengths {:?}, head extent {}",
            self.input_len, plan.trunk_lengths, plan.head_extent
        );

        let trunk = FeatureTrunk::new(&TRUNK_BLOCKS, self.dropout, device);
        let head = match self.variant {
            ModelVariant::SingleTask => Head::SingleTask(TaskBranch::new(
                Task::Spg,
                self.cardinalities.spg,
                self.dropout,
                device,
            )),
            ModelVariant::MultiTask => Head::MultiTask(MultiTaskHeads::new(
                &self.cardinalities,
                self.dropout,
                device,
            )),
        };

        Ok(XrdNet { trunk, head, input_len: self.input_len })
    }
}

/// Check channel continuity and return the length after each block.
fn walk_blocks(
    stage:       &str,
    specs:       &[BlockSpec],
    in_channels: usize,
    input_len:   usize,
) -> Result<Vec<usize>, ConstructionError> {
    let mut channels = in_channels;
    let mut len      = input_len;
    let mut lengths  = Vec::with_capacity(specs.len());

    for (i, spec) in specs.iter().enumerate() {
        if spec.in_channels != channels {
            return Err(ConstructionError::ChannelMismatch {
                stage:    format!("{stage} block {i}"),
                expected: channels,
                actual:   spec.in_channels,
            });
        }
        len = spec.output_len(len).ok_or_else(|| ConstructionError::NonPositiveExtent {
            stage: format!("{stage} block {i}"),
            input_len,
        })?;
        channels = spec.out_channels;
        lengths.push(len);
    }

    Ok(lengths)
}
