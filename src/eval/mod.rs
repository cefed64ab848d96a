//! Evaluation of perspective-field predictions.
//!
//! - `task`: inputs, predictions, records and the [`TaskEvaluator`] seam.
//! - `gravity`, `latitude`, `param`: the built-in sub-evaluators.
//! - `composite`: configuration-driven fan-out over sub-evaluators.
//! - `dist`, `reducer`: per-worker buffers and coordinator-side reduction.
pub mod composite;
pub mod dist;
pub mod gravity;
pub mod latitude;
pub mod param;
pub mod reducer;
pub mod stats;
pub mod task;

pub use self::composite::{EvaluatorComposite, EvaluatorKind};
pub use self::dist::{DistributedContext, LocalGroup, LocalWorker, SingleProcess, COORDINATOR_RANK};
pub use self::gravity::{GravityEvaluator, GRAVITY_TASK};
pub use self::latitude::{LatitudeEvaluator, LATITUDE_TASK};
pub use self::param::{ParamEvaluator, PARAM_TASK};
pub use self::reducer::{PerspectiveEvaluator, ReduceError, ReducerState};
pub use self::task::{
    CameraParams, EvalError, EvalInput, EvaluationRecord, Metrics, Prediction, TaskEvaluator,
    TaskMetrics,
};
