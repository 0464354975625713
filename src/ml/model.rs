use burn::{
    nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
};

use crate::data::batcher::XrdBatch;
use crate::domain::task::Task;
use crate::error::ShapeError;
use crate::ml::config::ModelVariant;
use crate::ml::heads::{Head, ModelOutput};
use crate::ml::trunk::{FeatureTrunk, INPUT_CHANNELS};

/// Shared trunk plus a single- or multi-task head.
/// Build it with `ModelConfig::init`.
#[derive(Module, Debug)]
pub struct XrdNet<B: Backend> {
    pub trunk:     FeatureTrunk<B>,
    pub head:      Head<B>,
    pub input_len: usize,
}

impl<B: Backend> XrdNet<B> {
    pub fn variant(&self) -> ModelVariant {
        match self.head {
            Head::SingleTask(_) => ModelVariant::SingleTask,
            Head::MultiTask(_)  => ModelVariant::MultiTask,
        }
    }

    /// intensity: [batch, 1, input_len] → logits per active task
    pub fn forward(&self, intensity: Tensor<B, 3>) -> Result<ModelOutput<B>, ShapeError> {
        let [_, channels, len] = intensity.dims();
        if channels != INPUT_CHANNELS {
            return Err(ShapeError::InputChannels { expected: INPUT_CHANNELS, actual: channels });
        }
        if len != self.input_len {
            return Err(ShapeError::InputLength { expected: self.input_len, actual: len });
        }
        self.check_device("intensity", &intensity.device())?;

        let features = self.trunk.forward(intensity);
        Ok(self.head.forward(features))
    }

    /// Sum of the active task losses. Also returns each task's own term.
    ///
    ///   spg, crysystem, blt → cross-entropy on logits vs class ids
    ///   composition         → mean squared error vs element counts
    pub fn forward_loss(
        &self,
        batch: &XrdBatch<B>,
    ) -> Result<(Tensor<B, 1>, Vec<(Task, Tensor<B, 1>)>, ModelOutput<B>), ShapeError> {
        let output = self.forward(batch.intensity.clone())?;
        let [batch_size, _, _] = batch.intensity.dims();

        let mut terms = Vec::with_capacity(output.tasks().len());
        for &task in output.tasks() {
            let labels_len = batch.label_len(task);
            if labels_len != batch_size {
                return Err(ShapeError::LabelBatch { task, expected: batch_size, actual: labels_len });
            }
            // tasks() lists exactly the tasks get() answers for
            let Some(pred) = output.get(task) else { continue };
            terms.push((task, task_loss(task, pred.clone(), batch)));
        }

        let total = terms
            .iter()
            .map(|(_, loss)| loss.clone())
            .reduce(|a, b| a + b)
            .unwrap_or_else(|| Tensor::zeros([1], &batch.intensity.device()));

        Ok((total, terms, output))
    }

    /// Every parameter path and its shape, in a fixed order.
    pub fn param_shapes(&self) -> Vec<(String, Vec<usize>)> {
        let mut out = Vec::new();
        self.trunk.collect_shapes(&mut out);
        self.head.collect_shapes(&mut out);
        out
    }

    fn check_device(&self, tensor: &'static str, device: &B::Device) -> Result<(), ShapeError> {
        let devices = self.devices();
        if devices.is_empty() || devices.contains(device) {
            return Ok(());
        }
        Err(ShapeError::WrongDevice {
            tensor,
            expected: format!("{:?}", devices[0]),
            actual:   format!("{device:?}"),
        })
    }
}

/// Loss of one task head against its label stream.
pub fn task_loss<B: Backend>(task: Task, pred: Tensor<B, 2>, batch: &XrdBatch<B>) -> Tensor<B, 1> {
    match batch.class_labels(task) {
        Some(labels) => {
            let ce = CrossEntropyLossConfig::new().init(&pred.device());
            ce.forward(pred, labels)
        }
        None => MseLoss::new().forward(pred, batch.composition.clone(), Reduction::Mean),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    use crate::ml::config::ModelConfig;

    type TestBackend = NdArray;

    fn zeros(batch: usize) -> Tensor<TestBackend, 3> {
        Tensor::zeros([batch, 1, 3501], &Default::default())
    }

    fn rows_finite(t: &Tensor<TestBackend, 2>) -> bool {
        t.clone().into_data().iter::<f32>().all(|v| v.is_finite())
    }

    #[test]
    fn test_single_task_zeros_end_to_end() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();

        let ModelOutput::SingleTask(logits) = model.forward(zeros(4)).unwrap() else {
            panic!("single-task model returned multi-task output");
        };
        assert_eq!(logits.dims(), [4, 230]);
        assert!(rows_finite(&logits));

        let classes: Vec<i64> = logits.argmax(1).into_data().iter::<i64>().collect();
        assert_eq!(classes.len(), 4);
        assert!(classes.iter().all(|&c| (0..230).contains(&c)));
    }

    #[test]
    fn test_multi_task_zeros_end_to_end() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::multi_task().init(&device).unwrap();

        let ModelOutput::MultiTask(outputs) = model.forward(zeros(4)).unwrap() else {
            panic!("multi-task model returned single-task output");
        };
        let map = outputs.into_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&Task::Spg].dims(), [4, 230]);
        assert_eq!(map[&Task::Crysystem].dims(), [4, 7]);
        assert_eq!(map[&Task::Blt].dims(), [4, 6]);
        assert_eq!(map[&Task::Composition].dims(), [4, 118]);
    }

    #[test]
    fn test_multi_task_shapes_on_noise() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::multi_task().init(&device).unwrap();
        let noise = Tensor::<TestBackend, 3>::random([2, 1, 3501], Distribution::Normal(0.0, 1.0), &device);

        let output = model.forward(noise).unwrap();
        assert_eq!(output.tasks(), &Task::ALL);
        for task in Task::ALL {
            let pred = output.get(task).unwrap();
            assert_eq!(pred.dims(), [2, ModelConfig::multi_task().cardinalities.get(task)]);
        }
    }

    #[test]
    fn test_single_task_exposes_only_spg() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let output = model.forward(zeros(1)).unwrap();
        assert!(output.get(Task::Spg).is_some());
        assert!(output.get(Task::Blt).is_none());
        assert_eq!(model.variant(), ModelVariant::SingleTask);
    }

    #[test]
    fn test_output_width_is_stable() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        for _ in 0..2 {
            let out = model.forward(zeros(2)).unwrap();
            assert_eq!(out.get(Task::Spg).unwrap().dims(), [2, 230]);
        }
    }

    #[test]
    fn test_rejects_multi_channel_input() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::zeros([2, 3, 3501], &device);
        assert_eq!(
            model.forward(x).unwrap_err(),
            ShapeError::InputChannels { expected: 1, actual: 3 }
        );
    }

    #[test]
    fn test_rejects_other_length() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::zeros([1, 1, 4000], &device);
        assert_eq!(
            model.forward(x).unwrap_err(),
            ShapeError::InputLength { expected: 3501, actual: 4000 }
        );
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::multi_task().init(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([2, 1, 3501], Distribution::Uniform(0.0, 1.0), &device);

        let a = model.forward(x.clone()).unwrap();
        let b = model.forward(x).unwrap();
        for task in Task::ALL {
            let a: Vec<f32> = a.get(task).unwrap().clone().into_data().iter::<f32>().collect();
            let b: Vec<f32> = b.get(task).unwrap().clone().into_data().iter::<f32>().collect();
            assert_eq!(a, b, "{task} differs between evaluation passes");
        }
    }

    #[test]
    fn test_training_mode_is_stochastic() {
        type TrainBackend = Autodiff<NdArray>;
        let device = Default::default();
        let model: XrdNet<TrainBackend> = ModelConfig::single_task().init(&device).unwrap();
        let x = Tensor::<TrainBackend, 3>::random([2, 1, 3501], Distribution::Uniform(0.0, 100.0), &device);

        let a = model.forward(x.clone()).unwrap();
        let b = model.forward(x).unwrap();
        let a: Vec<f32> = a.get(Task::Spg).unwrap().clone().into_data().iter::<f32>().collect();
        let b: Vec<f32> = b.get(Task::Spg).unwrap().clone().into_data().iter::<f32>().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_composition_loss_uses_counts_not_class_ids() {
        use burn::data::dataloader::batcher::Batcher;
        use crate::data::{batcher::XrdBatcher, dataset::XrdSample};

        let sample = XrdSample {
            intensity:   vec![0.0; 3501],
            spg:         5,
            crysystem:   1,
            blt:         2,
            composition: vec![2.0; 118],
        };
        let batch = XrdBatcher::<TestBackend>::new(Default::default()).batch(vec![sample]);

        // prediction equal to the count vector: zero loss
        let exact = task_loss(Task::Composition, batch.composition.clone(), &batch).into_scalar();
        assert_eq!(exact, 0.0);

        let off = task_loss(Task::Composition, batch.composition.clone() + 1.0, &batch).into_scalar();
        assert!((off - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_param_shapes_cover_all_heads() {
        let device = Default::default();
        let single: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let multi: XrdNet<TestBackend>  = ModelConfig::multi_task().init(&device).unwrap();

        // 10 trunk convs + 2 convs per head, weight and bias each
        assert_eq!(single.param_shapes().len(), 2 * (10 + 2));
        assert_eq!(multi.param_shapes().len(), 2 * (10 + 4 * 2));

        let shapes = multi.param_shapes();
        let proj = shapes
            .iter()
            .find(|(name, _)| name == "head.blt.projection.weight")
            .unwrap();
        assert_eq!(proj.1, vec![6, 64, 1]);
    }
}
