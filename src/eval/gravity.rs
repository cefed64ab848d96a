//! Gravity-field angular error.
use super::stats::{aggregate_summaries, ErrorSummary};
use super::task::{EvalError, EvalInput, Prediction, TaskEvaluator, TaskMetrics};
use crate::angle::angle_between;
use crate::field::FieldView;
use serde_json::Value;

pub const GRAVITY_TASK: &str = "gravity";

/// Per-pixel angle between predicted and ground-truth up directions,
/// measured where the ground truth is defined.
#[derive(Clone, Debug, Default)]
pub struct GravityEvaluator;

impl TaskEvaluator for GravityEvaluator {
    fn task(&self) -> &'static str {
        GRAVITY_TASK
    }

    fn process(&self, input: &EvalInput, prediction: &Prediction) -> Result<Value, EvalError> {
        let gt = input
            .gravity
            .as_ref()
            .ok_or_else(|| EvalError::MissingGroundTruth {
                task: GRAVITY_TASK,
                dataset: input.dataset.clone(),
            })?;
        let pred = prediction
            .gravity
            .as_ref()
            .ok_or(EvalError::MissingPrediction { task: GRAVITY_TASK })?;
        if !gt.same_size(pred) {
            return Err(EvalError::SizeMismatch {
                task: GRAVITY_TASK,
                expected: (gt.w, gt.h),
                found: (pred.w, pred.h),
            });
        }

        let errors: Vec<f64> = gt
            .data
            .iter()
            .zip(pred.data.iter())
            .filter(|(g, _)| g[0] != 0.0 || g[1] != 0.0)
            .map(|(g, p)| angle_between(g, p).to_degrees() as f64)
            .collect();
        Ok(ErrorSummary::from_errors(&errors).to_value())
    }

    fn evaluate(&self, payloads: &[&Value]) -> Result<TaskMetrics, EvalError> {
        aggregate_summaries(GRAVITY_TASK, payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{synthesize, GravityField};
    use crate::geometry::VanishingPoint;

    #[test]
    fn perfect_prediction_has_zero_error() {
        let field = synthesize(6, 8, &VanishingPoint::new(4.0, -50.0, 1.0));
        let input = EvalInput {
            dataset: "gsv".into(),
            gravity: Some(field.clone()),
            ..Default::default()
        };
        let prediction = Prediction {
            gravity: Some(field),
            ..Default::default()
        };
        let payload = GravityEvaluator.process(&input, &prediction).expect("process");
        assert_eq!(payload["pixels"], 48);
        assert!(payload["mean_deg"].as_f64().unwrap() < 0.1);
    }

    #[test]
    fn undefined_ground_truth_pixels_are_skipped() {
        let mut gt = GravityField::new(2, 1);
        gt.set(0, 0, [0.0, -1.0]);
        let mut pred = GravityField::new(2, 1);
        pred.set(0, 0, [1.0, 0.0]);
        pred.set(1, 0, [1.0, 0.0]);
        let input = EvalInput {
            gravity: Some(gt),
            ..Default::default()
        };
        let prediction = Prediction {
            gravity: Some(pred),
            ..Default::default()
        };
        let payload = GravityEvaluator.process(&input, &prediction).expect("process");
        assert_eq!(payload["pixels"], 1);
        assert!((payload["mean_deg"].as_f64().unwrap() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn missing_ground_truth_fails_fast() {
        let input = EvalInput {
            dataset: "unlabeled".into(),
            ..Default::default()
        };
        let err = GravityEvaluator
            .process(&input, &Prediction::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::MissingGroundTruth { task: "gravity", .. }));
    }
}
