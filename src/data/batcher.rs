// ============================================================
// Layer 4 — XRD Batcher
// ============================================================
// Implements Burn's Batcher trait to stack XrdSamples into
// device tensors.
//
//   Input:  Vec of N samples, each intensity of length L
//   Output: XrdBatch
//             intensity    [N, 1, L]  float
//             spg          [N]        int (class id)
//             crysystem    [N]        int
//             blt          [N]        int
//             composition  [N, 118]   float (atom counts)
//
// Every sample already has the same length, so no padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::XrdSample;
use crate::domain::task::Task;

#[derive(Debug, Clone)]
pub struct XrdBatch<B: Backend> {
    pub intensity:   Tensor<B, 3>,
    pub spg:         Tensor<B, 1, Int>,
    pub crysystem:   Tensor<B, 1, Int>,
    pub blt:         Tensor<B, 1, Int>,
    pub composition: Tensor<B, 2>,
}

impl<B: Backend> XrdBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.intensity.dims()[0]
    }

    /// Class-id tensor for a categorical task, None for composition.
    pub fn class_labels(&self, task: Task) -> Option<Tensor<B, 1, Int>> {
        match task {
            Task::Spg         => Some(self.spg.clone()),
            Task::Crysystem   => Some(self.crysystem.clone()),
            Task::Blt         => Some(self.blt.clone()),
            Task::Composition => None,
        }
    }

    /// Number of label rows carried for a task.
    pub fn label_len(&self, task: Task) -> usize {
        match task {
            Task::Spg         => self.spg.dims()[0],
            Task::Crysystem   => self.crysystem.dims()[0],
            Task::Blt         => self.blt.dims()[0],
            Task::Composition => self.composition.dims()[0],
        }
    }

    pub fn to_device(self, device: &B::Device) -> Self {
        Self {
            intensity:   self.intensity.to_device(device),
            spg:         self.spg.to_device(device),
            crysystem:   self.crysystem.to_device(device),
            blt:         self.blt.to_device(device),
            composition: self.composition.to_device(device),
        }
    }
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct XrdBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> XrdBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<XrdSample, XrdBatch<B>> for XrdBatcher<B> {
    fn batch(&self, items: Vec<XrdSample>) -> XrdBatch<B> {
        let batch_size = items.len();
        let signal_len = items.first().map_or(0, |s| s.intensity.len());
        let comp_len   = items.first().map_or(0, |s| s.composition.len());

        let intensity_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.intensity.iter().copied())
            .collect();

        let composition_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.composition.iter().copied())
            .collect();

        let ids = |task: Task| -> Vec<i32> {
            items
                .iter()
                .map(|s| s.class_id(task).unwrap_or_default() as i32)
                .collect()
        };

        let intensity = Tensor::<B, 1>::from_floats(
            intensity_flat.as_slice(), &self.device
        ).reshape([batch_size, 1, signal_len]);

        let composition = Tensor::<B, 1>::from_floats(
            composition_flat.as_slice(), &self.device
        ).reshape([batch_size, comp_len]);

        let spg       = Tensor::<B, 1, Int>::from_ints(ids(Task::Spg).as_slice(), &self.device);
        let crysystem = Tensor::<B, 1, Int>::from_ints(ids(Task::Crysystem).as_slice(), &self.device);
        let blt       = Tensor::<B, 1, Int>::from_ints(ids(Task::Blt).as_slice(), &self.device);

        XrdBatch { intensity, spg, crysystem, blt, composition }
    }
}
