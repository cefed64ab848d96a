//! Camera-parameter recovery error.
use super::stats::{mean, median};
use super::task::{CameraParams, EvalError, EvalInput, Prediction, TaskEvaluator, TaskMetrics};
use serde_json::{Map, Value};

pub const PARAM_TASK: &str = "param";

/// Absolute roll / pitch / vertical-FoV error in degrees and principal-point
/// distance in image-relative units, for whichever parameters are recovered.
#[derive(Clone, Debug)]
pub struct ParamEvaluator {
    pub recover_rpf: bool,
    pub recover_pp: bool,
}

impl ParamEvaluator {
    pub fn new(recover_rpf: bool, recover_pp: bool) -> Self {
        Self {
            recover_rpf,
            recover_pp,
        }
    }

    fn errors(&self, gt: &CameraParams, pred: &CameraParams) -> Result<Map<String, Value>, EvalError> {
        let mut out = Map::new();
        if self.recover_rpf {
            out.insert("roll_err".into(), (gt.pose.roll_deg - pred.pose.roll_deg).abs().into());
            out.insert("pitch_err".into(), (gt.pose.pitch_deg - pred.pose.pitch_deg).abs().into());
            out.insert("vfov_err".into(), (gt.pose.vfov_deg - pred.pose.vfov_deg).abs().into());
        }
        if self.recover_pp {
            let (Some(g), Some(p)) = (gt.principal_point, pred.principal_point) else {
                return Err(EvalError::MalformedRecord {
                    task: PARAM_TASK,
                    reason: "principal point missing from ground truth or prediction".into(),
                });
            };
            let d = ((g[0] - p[0]).powi(2) + (g[1] - p[1]).powi(2)).sqrt();
            out.insert("pp_err".into(), d.into());
        }
        Ok(out)
    }
}

impl TaskEvaluator for ParamEvaluator {
    fn task(&self) -> &'static str {
        PARAM_TASK
    }

    fn process(&self, input: &EvalInput, prediction: &Prediction) -> Result<Value, EvalError> {
        let gt = input.camera.as_ref().ok_or_else(|| EvalError::MissingGroundTruth {
            task: PARAM_TASK,
            dataset: input.dataset.clone(),
        })?;
        let pred = prediction
            .camera
            .as_ref()
            .ok_or(EvalError::MissingPrediction { task: PARAM_TASK })?;
        Ok(Value::Object(self.errors(gt, pred)?))
    }

    fn evaluate(&self, payloads: &[&Value]) -> Result<TaskMetrics, EvalError> {
        let mut names: Vec<&str> = Vec::new();
        if self.recover_rpf {
            names.extend(["roll_err", "pitch_err", "vfov_err"]);
        }
        if self.recover_pp {
            names.push("pp_err");
        }

        let mut metrics = TaskMetrics::new();
        metrics.insert("examples".into(), payloads.len() as f64);
        for name in names {
            let values = payloads
                .iter()
                .map(|p| {
                    p.get(name).and_then(Value::as_f64).ok_or_else(|| EvalError::MalformedRecord {
                        task: PARAM_TASK,
                        reason: format!("missing `{name}`"),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            if let (Some(m), Some(md)) = (mean(&values), median(&values)) {
                metrics.insert(format!("mean_{name}"), m);
                metrics.insert(format!("median_{name}"), md);
            }
        }
        Ok(metrics)
    }
}
