//! Error types for model construction, forward passes, checkpoint
//! loading and dataset ingestion.
//!
//! Every variant is fatal to the stage that raised it. Nothing in the
//! crate retries or masks these.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::task::Task;

/// Architecture cannot be assembled for the requested configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConstructionError {
    /// Consecutive blocks disagree on channel width.
    #[error("channel mismatch at {stage}: expected {expected} input channels, got {actual}")]
    ChannelMismatch {
        stage:    String,
        expected: usize,
        actual:   usize,
    },

    /// The sequence collapsed to nothing before the last layer.
    #[error("input length {input_len} leaves no spatial extent at {stage}")]
    NonPositiveExtent {
        stage:     String,
        input_len: usize,
    },

    /// Head output would flatten to more than one logit per class.
    #[error(
        "{task} head ends with spatial extent {extent} for input length {input_len}; \
         flattened width {width} would not equal {cardinality} classes"
    )]
    SpatialExtentMismatch {
        task:        Task,
        input_len:   usize,
        extent:      usize,
        width:       usize,
        cardinality: usize,
    },

    #[error("dropout probability {0} outside [0, 1)")]
    InvalidDropout(f64),
}

/// A tensor fed to the model does not fit the built architecture.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("input has {actual} channels, model expects {expected}")]
    InputChannels { expected: usize, actual: usize },

    #[error("input length {actual} differs from configured length {expected}")]
    InputLength { expected: usize, actual: usize },

    #[error("batch tensor for {tensor} is on device {actual}, model is on {expected}")]
    WrongDevice {
        tensor:   &'static str,
        expected: String,
        actual:   String,
    },

    #[error("label tensor for {task} has batch size {actual}, input has {expected}")]
    LabelBatch {
        task:     Task,
        expected: usize,
        actual:   usize,
    },
}

/// A persisted model does not match the live architecture.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("saved architecture differs from requested one: {0}")]
    ConfigMismatch(String),

    #[error("cannot decode checkpoint '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("parameter count differs: checkpoint has {actual}, model has {expected}")]
    ParamCount { expected: usize, actual: usize },

    #[error("parameter '{name}' has shape {actual:?} in checkpoint, model expects {expected:?}")]
    ParamShape {
        name:     String,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },
}

/// A dataset record cannot be turned into a training sample.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("sample {index}: intensity has length {actual}, expected {expected}")]
    SignalLength {
        index:    usize,
        expected: usize,
        actual:   usize,
    },

    #[error("sample {index}: {task} label {value} outside 1..={max}")]
    LabelOutOfRange {
        index: usize,
        task:  Task,
        value: i64,
        max:   usize,
    },

    #[error("sample {index}: unknown element symbol '{symbol}'")]
    UnknownElement { index: usize, symbol: String },
}

/// Umbrella error that tags the failing stage.
#[derive(Debug, Error)]
pub enum XrdError {
    #[error("construction failed: {0}")]
    Construction(#[from] ConstructionError),

    #[error("forward pass failed: {0}")]
    Shape(#[from] ShapeError),

    #[error("checkpoint load failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("dataset ingestion failed: {0}")]
    Data(#[from] DataError),
}
