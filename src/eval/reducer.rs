//! Per-worker accumulation and coordinator-side reduction of evaluation
//! records.
//!
//! Every worker runs `reset → process… → evaluate` against its own buffer.
//! With distribution enabled, `evaluate` waits on a barrier, gathers all
//! buffers on the coordinator and flattens them rank by rank; only the
//! coordinator computes metrics, the others return an empty mapping.
use super::composite::EvaluatorComposite;
use super::dist::{DistributedContext, SingleProcess};
use super::task::{EvalError, EvalInput, EvaluationRecord, Metrics, Prediction};
use crate::config::{ConfigError, PipelineConfig};
use log::{debug, info};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReducerState {
    Idle,
    Accumulating,
    Reducing,
    Done,
}

#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("`{operation}` called in state {state:?}; call reset() first")]
    InvalidState {
        operation: &'static str,
        state: ReducerState,
    },
    #[error("batch has {inputs} input(s) but {predictions} prediction(s)")]
    BatchMismatch { inputs: usize, predictions: usize },
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Evaluates perspective fields for one dataset across one or more workers.
pub struct PerspectiveEvaluator {
    dataset_name: String,
    composite: EvaluatorComposite,
    context: Box<dyn DistributedContext>,
    distributed: bool,
    state: ReducerState,
    predictions: Vec<EvaluationRecord>,
}

impl PerspectiveEvaluator {
    /// Builds the evaluator set from `config`; `config.distributed` decides
    /// whether `context` is synchronized at evaluation time.
    pub fn from_config(
        dataset_name: impl Into<String>,
        config: &PipelineConfig,
        context: Box<dyn DistributedContext>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            dataset_name,
            EvaluatorComposite::from_config(config)?,
            context,
            config.distributed,
        ))
    }

    pub fn new(
        dataset_name: impl Into<String>,
        composite: EvaluatorComposite,
        context: Box<dyn DistributedContext>,
        distributed: bool,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            composite,
            context,
            distributed,
            state: ReducerState::Idle,
            predictions: Vec::new(),
        }
    }

    /// Non-distributed evaluator over the local buffer only.
    pub fn single_process(dataset_name: impl Into<String>, composite: EvaluatorComposite) -> Self {
        Self::new(dataset_name, composite, Box::new(SingleProcess), false)
    }

    pub fn state(&self) -> ReducerState {
        self.state
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Records buffered on this worker so far.
    pub fn local_records(&self) -> &[EvaluationRecord] {
        &self.predictions
    }

    /// Starts a new evaluation round.
    pub fn reset(&mut self) {
        self.predictions.clear();
        self.state = ReducerState::Accumulating;
    }

    /// Appends one record per (input, prediction) pair.
    pub fn process(
        &mut self,
        inputs: &[EvalInput],
        predictions: &[Prediction],
    ) -> Result<(), ReduceError> {
        self.expect_state("process")?;
        if inputs.len() != predictions.len() {
            return Err(ReduceError::BatchMismatch {
                inputs: inputs.len(),
                predictions: predictions.len(),
            });
        }
        for (input, prediction) in inputs.iter().zip(predictions.iter()) {
            let record = self.composite.process(input, prediction)?;
            self.predictions.push(record);
        }
        Ok(())
    }

    /// Reduces the round. Non-coordinating workers of a distributed run
    /// return an empty mapping.
    pub fn evaluate(&mut self) -> Result<Metrics, ReduceError> {
        self.expect_state("evaluate")?;
        self.state = ReducerState::Reducing;
        let local = std::mem::take(&mut self.predictions);

        let records = if self.distributed {
            self.context.barrier();
            let rank = self.context.rank();
            let gathered = self.context.gather_to_coordinator(local);
            let Some(per_worker) = gathered.filter(|_| self.context.is_coordinator()) else {
                debug!("PerspectiveEvaluator[{}]: rank {rank} handed off its records", self.dataset_name);
                self.state = ReducerState::Done;
                return Ok(Metrics::new());
            };
            per_worker.into_iter().flatten().collect::<Vec<_>>()
        } else {
            local
        };

        info!(
            "PerspectiveEvaluator[{}]: reducing {} record(s) over tasks {:?}",
            self.dataset_name,
            records.len(),
            self.composite.tasks()
        );
        let result = self.composite.evaluate(&records);
        self.state = ReducerState::Done;
        Ok(result?)
    }

    fn expect_state(&self, operation: &'static str) -> Result<(), ReduceError> {
        if self.state != ReducerState::Accumulating {
            return Err(ReduceError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}
