// ============================================================
// Layer 5 — Task Heads
// ============================================================
// A head branch turns the [batch, 256, L_trunk] trunk output
// into one flattened prediction row per sample:
//
//   unpooled block (256 → hidden) → conv k=1 (hidden → classes) → flatten
//
// Hidden widths per task:
//   spg 256, crysystem 64, blt 64, composition 256
//
// Branches share nothing below the trunk: each has its own
// convolutions and its own dropout.

use burn::{
    nn::conv::{Conv1d, Conv1dConfig},
    prelude::*,
};

use crate::domain::task::{Task, TaskCardinalities};
use crate::ml::blocks::{conv_shapes, BlockSpec, ReductionBlock};
use crate::ml::trunk::TRUNK_CHANNELS;

/// Intermediate channel width of a task's head block.
pub fn hidden_channels(task: Task) -> usize {
    match task {
        Task::Spg         => 256,
        Task::Crysystem   => 64,
        Task::Blt         => 64,
        Task::Composition => 256,
    }
}

/// The non-pooling block that opens a task's head.
pub fn head_block_spec(task: Task) -> BlockSpec {
    BlockSpec::unpooled(TRUNK_CHANNELS, hidden_channels(task))
}

#[derive(Module, Debug)]
pub struct TaskBranch<B: Backend> {
    pub block:      ReductionBlock<B>,
    pub projection: Conv1d<B>,
}

impl<B: Backend> TaskBranch<B> {
    pub fn new(task: Task, classes: usize, dropout: f64, device: &B::Device) -> Self {
        let spec       = head_block_spec(task);
        let block      = spec.init(dropout, device);
        let projection = Conv1dConfig::new(spec.out_channels, classes, 1).init(device);
        Self { block, projection }
    }

    /// x: [batch, 256, L_trunk] → [batch, classes · L_head]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = self.block.forward(x);
        self.projection.forward(x).flatten::<2>(1, 2)
    }

    pub fn collect_shapes(&self, prefix: &str, out: &mut Vec<(String, Vec<usize>)>) {
        self.block.collect_shapes(&format!("{prefix}.block"), out);
        conv_shapes(&self.projection, &format!("{prefix}.projection"), out);
    }
}

#[derive(Module, Debug)]
pub struct MultiTaskHeads<B: Backend> {
    pub spg:         TaskBranch<B>,
    pub crysystem:   TaskBranch<B>,
    pub blt:         TaskBranch<B>,
    pub composition: TaskBranch<B>,
}

impl<B: Backend> MultiTaskHeads<B> {
    pub fn new(cards: &TaskCardinalities, dropout: f64, device: &B::Device) -> Self {
        let branch = |task| TaskBranch::new(task, cards.get(task), dropout, device);
        Self {
            spg:         branch(Task::Spg),
            crysystem:   branch(Task::Crysystem),
            blt:         branch(Task::Blt),
            composition: branch(Task::Composition),
        }
    }

    pub fn branch(&self, task: Task) -> &TaskBranch<B> {
        match task {
            Task::Spg         => &self.spg,
            Task::Crysystem   => &self.crysystem,
            Task::Blt         => &self.blt,
            Task::Composition => &self.composition,
        }
    }

    /// All four branches, always computed together.
    pub fn forward(&self, x: Tensor<B, 3>) -> TaskOutputs<B> {
        TaskOutputs {
            spg:         self.spg.forward(x.clone()),
            crysystem:   self.crysystem.forward(x.clone()),
            blt:         self.blt.forward(x.clone()),
            composition: self.composition.forward(x),
        }
    }
}

/// Output-side variant of the network.
#[derive(Module, Debug)]
pub enum Head<B: Backend> {
    /// Space group only.
    SingleTask(TaskBranch<B>),
    /// All four tasks from one trunk pass.
    MultiTask(MultiTaskHeads<B>),
}

impl<B: Backend> Head<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> ModelOutput<B> {
        match self {
            Head::SingleTask(branch) => ModelOutput::SingleTask(branch.forward(x)),
            Head::MultiTask(heads)   => ModelOutput::MultiTask(heads.forward(x)),
        }
    }

    pub fn collect_shapes(&self, out: &mut Vec<(String, Vec<usize>)>) {
        match self {
            Head::SingleTask(branch) => branch.collect_shapes("head.spg", out),
            Head::MultiTask(heads) => {
                for task in Task::ALL {
                    heads.branch(task).collect_shapes(&format!("head.{task}"), out);
                }
            }
        }
    }
}

/// The four named prediction streams of a multi-task pass.
#[derive(Debug, Clone)]
pub struct TaskOutputs<B: Backend> {
    pub spg:         Tensor<B, 2>,
    pub crysystem:   Tensor<B, 2>,
    pub blt:         Tensor<B, 2>,
    pub composition: Tensor<B, 2>,
}

impl<B: Backend> TaskOutputs<B> {
    pub fn get(&self, task: Task) -> &Tensor<B, 2> {
        match task {
            Task::Spg         => &self.spg,
            Task::Crysystem   => &self.crysystem,
            Task::Blt         => &self.blt,
            Task::Composition => &self.composition,
        }
    }

    /// Keyed by task, e.g. {"spg": .., "crysystem": .., "blt": .., "composition": ..}
    pub fn into_map(self) -> std::collections::BTreeMap<Task, Tensor<B, 2>> {
        [
            (Task::Spg,         self.spg),
            (Task::Crysystem,   self.crysystem),
            (Task::Blt,         self.blt),
            (Task::Composition, self.composition),
        ]
        .into_iter()
        .collect()
    }
}

/// Result of one forward pass.
#[derive(Debug, Clone)]
pub enum ModelOutput<B: Backend> {
    /// [batch, 230] space-group logits
    SingleTask(Tensor<B, 2>),
    MultiTask(TaskOutputs<B>),
}

impl<B: Backend> ModelOutput<B> {
    /// Tasks that carry a prediction in this output.
    pub fn tasks(&self) -> &'static [Task] {
        match self {
            ModelOutput::SingleTask(_) => &[Task::Spg],
            ModelOutput::MultiTask(_)  => &Task::ALL,
        }
    }

    /// Predictions keyed by task; single-task output holds only spg.
    pub fn into_map(self) -> std::collections::BTreeMap<Task, Tensor<B, 2>> {
        match self {
            ModelOutput::SingleTask(spg)   => [(Task::Spg, spg)].into_iter().collect(),
            ModelOutput::MultiTask(outputs) => outputs.into_map(),
        }
    }

    pub fn get(&self, task: Task) -> Option<&Tensor<B, 2>> {
        match (self, task) {
            (ModelOutput::SingleTask(spg), Task::Spg) => Some(spg),
            (ModelOutput::SingleTask(_), _)           => None,
            (ModelOutput::MultiTask(outputs), task)   => Some(outputs.get(task)),
        }
    }
}
