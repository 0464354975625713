// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a trained model over a batch stream and gathers one
// ordered prediction sequence and one label sequence per task.
//
//   classification tasks → argmax class id per sample
//   composition          → raw predicted count vector per sample
//
// prediction[i] and label[i] always refer to the same sample:
// batches are consumed in iteration order and rows are appended
// in batch order. Any shape or device error aborts the pass.
//
// Gradient tracking is off because the model lives on a plain
// (non-autodiff) backend here; take `model.valid()` first when
// evaluating a model from the training loop.

use burn::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::batcher::XrdBatch;
use crate::domain::task::Task;
use crate::error::XrdError;
use crate::ml::model::XrdNet;

/// One task's stream of per-sample values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskSeries {
    Classes(Vec<i64>),
    Vectors(Vec<Vec<f32>>),
}

impl TaskSeries {
    fn empty_for(task: Task) -> Self {
        if task.is_classification() {
            TaskSeries::Classes(Vec::new())
        } else {
            TaskSeries::Vectors(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TaskSeries::Classes(v) => v.len(),
            TaskSeries::Vectors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Predictions and labels for every task, keyed "spg", "crysystem", ...
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub predictions: BTreeMap<Task, TaskSeries>,
    pub labels:      BTreeMap<Task, TaskSeries>,
}

impl Default for EvaluationResult {
    fn default() -> Self {
        let empty = || -> BTreeMap<Task, TaskSeries> {
            Task::ALL.iter().map(|&t| (t, TaskSeries::empty_for(t))).collect()
        };
        Self { predictions: empty(), labels: empty() }
    }
}

impl EvaluationResult {
    pub fn sample_count(&self, task: Task) -> usize {
        self.predictions.get(&task).map_or(0, TaskSeries::len)
    }

    /// Fraction of correct class predictions, None if the task is empty.
    pub fn accuracy(&self, task: Task) -> Option<f64> {
        match (self.predictions.get(&task)?, self.labels.get(&task)?) {
            (TaskSeries::Classes(p), TaskSeries::Classes(l)) if !p.is_empty() => {
                let correct = p.iter().zip(l).filter(|(a, b)| a == b).count();
                Some(correct as f64 / p.len() as f64)
            }
            _ => None,
        }
    }

    /// Mean squared error over all vector entries, None if empty.
    pub fn mean_squared_error(&self, task: Task) -> Option<f64> {
        match (self.predictions.get(&task)?, self.labels.get(&task)?) {
            (TaskSeries::Vectors(p), TaskSeries::Vectors(l)) if !p.is_empty() => {
                let (sum, n) = p
                    .iter()
                    .zip(l)
                    .flat_map(|(a, b)| a.iter().zip(b))
                    .fold((0.0f64, 0usize), |(s, n), (a, b)| {
                        let d = (*a - *b) as f64;
                        (s + d * d, n + 1)
                    });
                Some(sum / n.max(1) as f64)
            }
            _ => None,
        }
    }

    /// One line per populated task.
    pub fn summary(&self) -> String {
        Task::ALL
            .iter()
            .filter_map(|&task| {
                let n = self.sample_count(task);
                if let Some(acc) = self.accuracy(task) {
                    Some(format!("{task:<12} n={n:<6} accuracy={:.2}%", acc * 100.0))
                } else {
                    self.mean_squared_error(task)
                        .map(|mse| format!("{task:<12} n={n:<6} mse={mse:.4}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, task: Task, prediction: TaskSeries, label: TaskSeries) {
        append(self.predictions.entry(task).or_insert_with(|| TaskSeries::empty_for(task)), prediction);
        append(self.labels.entry(task).or_insert_with(|| TaskSeries::empty_for(task)), label);
    }
}

fn append(into: &mut TaskSeries, from: TaskSeries) {
    match (into, from) {
        (TaskSeries::Classes(a), TaskSeries::Classes(b)) => a.extend(b),
        (TaskSeries::Vectors(a), TaskSeries::Vectors(b)) => a.extend(b),
        // empty_for() fixes the kind per task
        _ => {}
    }
}

pub struct Evaluator<B: Backend> {
    model:  XrdNet<B>,
    device: B::Device,
}

impl<B: Backend> Evaluator<B> {
    pub fn new(model: XrdNet<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn run<I>(&self, batches: I) -> Result<EvaluationResult, XrdError>
    where
        I: IntoIterator<Item = XrdBatch<B>>,
    {
        let mut result  = EvaluationResult::default();
        let mut batches_seen = 0usize;

        for batch in batches {
            let batch  = batch.to_device(&self.device);
            let output = self.model.forward(batch.intensity.clone())?;

            for (task, pred) in output.into_map() {
                let (prediction, label) = match batch.class_labels(task) {
                    Some(labels) => (
                        TaskSeries::Classes(argmax_rows(pred)),
                        TaskSeries::Classes(int_values(labels)),
                    ),
                    None => (
                        TaskSeries::Vectors(float_rows(pred)),
                        TaskSeries::Vectors(float_rows(batch.composition.clone())),
                    ),
                };
                result.push(task, prediction, label);
            }
            batches_seen += 1;
        }

        tracing::info!(
            "Evaluated {} batches, {} samples",
            batches_seen,
            result.sample_count(Task::Spg)
        );
        Ok(result)
    }
}

/// Row-wise argmax: [n, classes] → n class ids.
pub fn argmax_rows<B: Backend>(logits: Tensor<B, 2>) -> Vec<i64> {
    // argmax(1) returns [n, 1]
    int_values(logits.argmax(1).flatten::<1>(0, 1))
}

fn int_values<B: Backend>(t: Tensor<B, 1, Int>) -> Vec<i64> {
    t.into_data().iter::<i64>().collect()
}

fn float_rows<B: Backend>(t: Tensor<B, 2>) -> Vec<Vec<f32>> {
    let [_, width] = t.dims();
    let flat: Vec<f32> = t.into_data().iter::<f32>().collect();
    flat.chunks(width.max(1)).map(<[f32]>::to_vec).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataloader::batcher::Batcher;
    use burn::backend::NdArray;

    use crate::data::batcher::XrdBatcher;
    use crate::data::dataset::XrdSample;
    use crate::ml::config::ModelConfig;

    type TestBackend = NdArray;

    fn sample(i: usize) -> XrdSample {
        let mut composition = vec![0.0; 118];
        composition[i % 118] = 2.0;
        XrdSample {
            intensity: (0..3501).map(|x| ((x * (i + 1)) % 97) as f32).collect(),
            spg:       (i * 17) % 230,
            crysystem: i % 7,
            blt:       i % 6,
            composition,
        }
    }

    fn batches(sizes: &[usize]) -> Vec<XrdBatch<TestBackend>> {
        let batcher = XrdBatcher::<TestBackend>::new(Default::default());
        let mut next = 0;
        sizes
            .iter()
            .map(|&n| {
                let items = (next..next + n).map(sample).collect();
                next += n;
                batcher.batch(items)
            })
            .collect()
    }

    #[test]
    fn test_multi_task_streams_align() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::multi_task().init(&device).unwrap();
        let evaluator = Evaluator::new(model, device);

        let result = evaluator.run(batches(&[2, 3])).unwrap();
        for task in Task::ALL {
            assert_eq!(result.sample_count(task), 5);
            assert_eq!(result.labels[&task].len(), 5);
        }

        // Labels come back in sample order
        let expected_spg: Vec<i64> = (0..5).map(|i| sample(i).spg as i64).collect();
        assert_eq!(result.labels[&Task::Spg], TaskSeries::Classes(expected_spg));
        let TaskSeries::Vectors(comp) = &result.labels[&Task::Composition] else {
            panic!("composition labels should be vectors");
        };
        assert_eq!(comp[4][4], 2.0);
    }

    #[test]
    fn test_predictions_follow_batch_order() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();

        // Reference: argmax batch by batch
        let mut expected = Vec::new();
        for batch in batches(&[3, 1]) {
            let out = model.forward(batch.intensity).unwrap();
            expected.extend(argmax_rows(out.get(Task::Spg).unwrap().clone()));
        }

        let result = Evaluator::new(model, device).run(batches(&[3, 1])).unwrap();
        assert_eq!(result.predictions[&Task::Spg], TaskSeries::Classes(expected));
    }

    #[test]
    fn test_single_task_leaves_other_streams_empty() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let result = Evaluator::new(model, device).run(batches(&[2])).unwrap();

        assert_eq!(result.sample_count(Task::Spg), 2);
        for task in [Task::Crysystem, Task::Blt, Task::Composition] {
            assert!(result.predictions[&task].is_empty());
            assert!(result.labels[&task].is_empty());
        }
        assert!(result.accuracy(Task::Blt).is_none());
        assert!(!result.summary().contains("blt"));
    }

    #[test]
    fn test_wrong_length_aborts_pass() {
        let device = Default::default();
        let model: XrdNet<TestBackend> = ModelConfig::single_task().init(&device).unwrap();
        let batcher = XrdBatcher::<TestBackend>::new(Default::default());
        let mut short = sample(0);
        short.intensity.truncate(3000);

        let err = Evaluator::new(model, device)
            .run(vec![batcher.batch(vec![sample(1)]), batcher.batch(vec![short])])
            .unwrap_err();
        assert!(matches!(err, XrdError::Shape(_)));
    }

    #[test]
    fn test_metrics() {
        let mut result = EvaluationResult::default();
        result.push(Task::Spg, TaskSeries::Classes(vec![1, 2, 3, 4]), TaskSeries::Classes(vec![1, 2, 0, 4]));
        result.push(
            Task::Composition,
            TaskSeries::Vectors(vec![vec![1.0, 2.0]]),
            TaskSeries::Vectors(vec![vec![1.0, 4.0]]),
        );
        assert_eq!(result.accuracy(Task::Spg), Some(0.75));
        assert_eq!(result.mean_squared_error(Task::Composition), Some(2.0));
        assert!(result.accuracy(Task::Composition).is_none());
    }

    #[test]
    fn test_result_serialises_by_task_key() {
        let mut result = EvaluationResult::default();
        result.push(Task::Spg, TaskSeries::Classes(vec![7]), TaskSeries::Classes(vec![7]));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["predictions"]["spg"], serde_json::json!([7]));
        assert_eq!(json["labels"]["blt"], serde_json::json!([]));
    }
}
