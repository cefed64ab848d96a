//! Composition of the per-task evaluators selected by the configuration.
use super::gravity::GravityEvaluator;
use super::latitude::LatitudeEvaluator;
use super::param::ParamEvaluator;
use super::task::{EvalError, EvalInput, EvaluationRecord, Metrics, Prediction, TaskEvaluator};
use crate::config::{ConfigError, PipelineConfig};
use log::debug;
use std::collections::BTreeSet;

/// The closed set of built-in sub-evaluators, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluatorKind {
    Gravity,
    Latitude,
    ParamRecovery,
}

impl EvaluatorKind {
    pub const ALL: [EvaluatorKind; 3] = [
        EvaluatorKind::Gravity,
        EvaluatorKind::Latitude,
        EvaluatorKind::ParamRecovery,
    ];

    /// Inclusion policy: the dense heads are evaluated only when enabled and
    /// neither frozen nor in synthetic pretraining; parameter recovery
    /// whenever roll/pitch/FoV or principal-point recovery is on.
    pub fn is_enabled(&self, config: &PipelineConfig) -> bool {
        match self {
            EvaluatorKind::Gravity => config.gravity_on && config.dense_heads_active(),
            EvaluatorKind::Latitude => config.latitude_on && config.dense_heads_active(),
            EvaluatorKind::ParamRecovery => config.param_recovery_on(),
        }
    }

    pub fn enabled(config: &PipelineConfig) -> Vec<EvaluatorKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| kind.is_enabled(config))
            .collect()
    }

    pub fn build(&self, config: &PipelineConfig) -> Box<dyn TaskEvaluator> {
        match self {
            EvaluatorKind::Gravity => Box::new(GravityEvaluator),
            EvaluatorKind::Latitude => Box::new(LatitudeEvaluator),
            EvaluatorKind::ParamRecovery => {
                Box::new(ParamEvaluator::new(config.recover_rpf, config.recover_pp))
            }
        }
    }
}

/// Fans each (input, prediction) pair out to every sub-evaluator and merges
/// their outputs by task name.
pub struct EvaluatorComposite {
    evaluators: Vec<Box<dyn TaskEvaluator>>,
}

impl EvaluatorComposite {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let kinds = EvaluatorKind::enabled(config);
        debug!("EvaluatorComposite: enabled {kinds:?}");
        Self::new(kinds.iter().map(|kind| kind.build(config)).collect())
    }

    /// Task names must be unique.
    pub fn new(evaluators: Vec<Box<dyn TaskEvaluator>>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for evaluator in &evaluators {
            if !seen.insert(evaluator.task()) {
                return Err(ConfigError::TaskCollision(evaluator.task().to_string()));
            }
        }
        Ok(Self { evaluators })
    }

    pub fn tasks(&self) -> Vec<&'static str> {
        self.evaluators.iter().map(|e| e.task()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    pub fn process(
        &self,
        input: &EvalInput,
        prediction: &Prediction,
    ) -> Result<EvaluationRecord, EvalError> {
        let mut record = EvaluationRecord::new();
        for evaluator in &self.evaluators {
            record.insert(
                evaluator.task().to_string(),
                evaluator.process(input, prediction)?,
            );
        }
        Ok(record)
    }

    /// Each sub-evaluator sees only its own task's payloads.
    pub fn evaluate(&self, records: &[EvaluationRecord]) -> Result<Metrics, EvalError> {
        let mut metrics = Metrics::new();
        for evaluator in &self.evaluators {
            let task = evaluator.task();
            let payloads = records
                .iter()
                .enumerate()
                .map(|(i, record)| {
                    record.get(task).ok_or_else(|| EvalError::MalformedRecord {
                        task,
                        reason: format!("record {i} has no `{task}` entry"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            metrics.insert(task.to_string(), evaluator.evaluate(&payloads)?);
        }
        Ok(metrics)
    }
}
