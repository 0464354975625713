use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::elements::composition_counts;
use crate::domain::pattern::PatternRecord;
use crate::domain::task::{Task, TaskCardinalities};
use crate::error::DataError;

/// One validated sample with 0-indexed class ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrdSample {
    pub intensity:   Vec<f32>,
    pub spg:         usize,
    pub crysystem:   usize,
    pub blt:         usize,
    /// Atom count per element, indexed by atomic number - 1
    pub composition: Vec<f32>,
}

impl XrdSample {
    /// Validate a raw record and shift its 1-indexed labels to class ids.
    pub fn from_record(
        index:     usize,
        record:    &PatternRecord,
        input_len: usize,
        cards:     &TaskCardinalities,
    ) -> Result<Self, DataError> {
        if record.intensity.len() != input_len {
            return Err(DataError::SignalLength {
                index,
                expected: input_len,
                actual:   record.intensity.len(),
            });
        }

        let class_id = |task: Task| -> Result<usize, DataError> {
            let value = record.label(task).unwrap_or_default();
            let max   = cards.get(task);
            if value < 1 || value as usize > max {
                return Err(DataError::LabelOutOfRange { index, task, value, max });
            }
            Ok(value as usize - 1)
        };

        let mut composition = composition_counts(&record.symbols)
            .map_err(|symbol| DataError::UnknownElement { index, symbol })?;
        composition.resize(cards.composition, 0.0);

        Ok(Self {
            intensity: record.intensity.clone(),
            spg:       class_id(Task::Spg)?,
            crysystem: class_id(Task::Crysystem)?,
            blt:       class_id(Task::Blt)?,
            composition,
        })
    }

    pub fn class_id(&self, task: Task) -> Option<usize> {
        match task {
            Task::Spg         => Some(self.spg),
            Task::Crysystem   => Some(self.crysystem),
            Task::Blt         => Some(self.blt),
            Task::Composition => None,
        }
    }
}

/// Convert a whole record list, stopping at the first bad record.
pub fn samples_from_records(
    records:   &[PatternRecord],
    input_len: usize,
    cards:     &TaskCardinalities,
) -> Result<Vec<XrdSample>, DataError> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| XrdSample::from_record(i, r, input_len, cards))
        .collect()
}

#[derive(Debug)]
pub struct XrdDataset {
    samples: Vec<XrdSample>,
}

impl XrdDataset {
    pub fn new(samples: Vec<XrdSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<XrdSample> for XrdDataset {
    fn get(&self, index: usize) -> Option<XrdSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
