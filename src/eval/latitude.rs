//! Latitude-map absolute error.
use super::stats::{aggregate_summaries, ErrorSummary};
use super::task::{EvalError, EvalInput, Prediction, TaskEvaluator, TaskMetrics};
use crate::field::FieldView;
use serde_json::Value;

pub const LATITUDE_TASK: &str = "latitude";

/// Absolute per-pixel latitude difference in degrees over finite pixels.
#[derive(Clone, Debug, Default)]
pub struct LatitudeEvaluator;

impl TaskEvaluator for LatitudeEvaluator {
    fn task(&self) -> &'static str {
        LATITUDE_TASK
    }

    fn process(&self, input: &EvalInput, prediction: &Prediction) -> Result<Value, EvalError> {
        let gt = input
            .latitude
            .as_ref()
            .ok_or_else(|| EvalError::MissingGroundTruth {
                task: LATITUDE_TASK,
                dataset: input.dataset.clone(),
            })?;
        let pred = prediction
            .latitude
            .as_ref()
            .ok_or(EvalError::MissingPrediction {
                task: LATITUDE_TASK,
            })?;
        if !gt.same_size(pred) {
            return Err(EvalError::SizeMismatch {
                task: LATITUDE_TASK,
                expected: (gt.w, gt.h),
                found: (pred.w, pred.h),
            });
        }

        let errors: Vec<f64> = gt
            .data
            .iter()
            .zip(pred.data.iter())
            .filter(|(g, p)| g.is_finite() && p.is_finite())
            .map(|(&g, &p)| (g - p).abs() as f64)
            .collect();
        Ok(ErrorSummary::from_errors(&errors).to_value())
    }

    fn evaluate(&self, payloads: &[&Value]) -> Result<TaskMetrics, EvalError> {
        aggregate_summaries(LATITUDE_TASK, payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarField;

    #[test]
    fn absolute_error_in_degrees() {
        let gt = ScalarField::from_fn(2, 2, |x, y| (x + y) as f32);
        let pred = ScalarField::from_fn(2, 2, |x, y| (x + y) as f32 + 2.0);
        let input = EvalInput {
            latitude: Some(gt),
            ..Default::default()
        };
        let prediction = Prediction {
            latitude: Some(pred),
            ..Default::default()
        };
        let payload = LatitudeEvaluator.process(&input, &prediction).expect("process");
        assert_eq!(payload["mean_deg"].as_f64(), Some(2.0));
        assert_eq!(payload["median_deg"].as_f64(), Some(2.0));
    }

    #[test]
    fn size_mismatch_is_reported() {
        let input = EvalInput {
            latitude: Some(ScalarField::new(2, 2)),
            ..Default::default()
        };
        let prediction = Prediction {
            latitude: Some(ScalarField::new(3, 2)),
            ..Default::default()
        };
        assert!(matches!(
            LatitudeEvaluator.process(&input, &prediction),
            Err(EvalError::SizeMismatch { .. })
        ));
    }
}
