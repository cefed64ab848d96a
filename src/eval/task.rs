//! Shared vocabulary of the evaluators: inputs, predictions, records and
//! the per-task capability every sub-evaluator implements.
use crate::field::{GravityField, ScalarField};
use crate::geometry::CameraPose;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-example results keyed by task name.
pub type EvaluationRecord = BTreeMap<String, Value>;
/// Metric name → value for one task.
pub type TaskMetrics = BTreeMap<String, f64>;
/// Final metrics keyed by task name.
pub type Metrics = BTreeMap<String, TaskMetrics>;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{task}: example from `{dataset}` has no ground truth")]
    MissingGroundTruth { task: &'static str, dataset: String },
    #[error("{task}: prediction is missing")]
    MissingPrediction { task: &'static str },
    #[error("{task}: prediction is {found:?} but ground truth is {expected:?}")]
    SizeMismatch {
        task: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("{task}: malformed record: {reason}")]
    MalformedRecord { task: &'static str, reason: String },
}

/// Camera parameters compared by the parameter evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub pose: CameraPose,
    /// Principal point relative to the image size, `[cx / w, cy / h]`.
    pub principal_point: Option<[f64; 2]>,
}

/// Ground truth for one example.
#[derive(Clone, Debug, Default)]
pub struct EvalInput {
    pub dataset: String,
    pub gravity: Option<GravityField>,
    pub latitude: Option<ScalarField>,
    pub camera: Option<CameraParams>,
}

/// Model output for one example.
#[derive(Clone, Debug, Default)]
pub struct Prediction {
    pub gravity: Option<GravityField>,
    pub latitude: Option<ScalarField>,
    pub camera: Option<CameraParams>,
}

/// One independently pluggable family of metrics.
///
/// `process` returns the payload stored under [`TaskEvaluator::task`] in the
/// example's record; `evaluate` receives every payload of that task across
/// the reduced record list, in record order.
pub trait TaskEvaluator: Send {
    fn task(&self) -> &'static str;

    fn process(&self, input: &EvalInput, prediction: &Prediction) -> Result<Value, EvalError>;

    fn evaluate(&self, payloads: &[&Value]) -> Result<TaskMetrics, EvalError>;
}
