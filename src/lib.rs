#![doc = include_str!("../README.md")]

// Ground truth: geometry → field → target.
pub mod dispatch;
pub mod encode;
pub mod field;
pub mod geometry;
pub mod store;

// Evaluation and reduction.
pub mod eval;

// Shared utilities.
pub mod angle;
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::dispatch::{
    DatasetFamily, DatasetRecord, DispatchError, GravityTransform, LabeledExample, Mode,
    ResolvedLabel,
};
pub use crate::encode::{encode_field, EncodeError, GravityTarget, LossType};
pub use crate::eval::{EvaluatorComposite, PerspectiveEvaluator};
pub use crate::field::{synthesize, GravityField};
pub use crate::geometry::{CameraGeometry, CameraPose, PinholeGeometry, VanishingPoint};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use perspective_fields::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::default();
/// let transform = GravityTransform::from_config(&config, Mode::Eval)?;
/// let record = DatasetRecord {
///     dataset: "gsv".into(),
///     height: 480,
///     width: 640,
///     roll: Some(3.0),
///     pitch: Some(-10.0),
///     vfov: Some(55.0),
///     ..Default::default()
/// };
/// let label = transform.resolve_record(&record)?;
/// println!("vp={:?}", label.vanishing_point);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::dispatch::{DatasetRecord, GravityTransform, Mode};
    pub use crate::eval::{EvalInput, PerspectiveEvaluator, Prediction};
    pub use crate::field::GravityField;
    pub use crate::geometry::VanishingPoint;
}
