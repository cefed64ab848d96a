use perspective_fields::config::PipelineConfig;
use perspective_fields::eval::{
    CameraParams, EvalError, EvalInput, EvaluatorComposite, LocalGroup, Metrics,
    PerspectiveEvaluator, Prediction, ReducerState, TaskEvaluator, TaskMetrics, GRAVITY_TASK,
    LATITUDE_TASK, PARAM_TASK,
};
use perspective_fields::field::{synthesize, ScalarField};
use perspective_fields::geometry::{CameraPose, VanishingPoint};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

const W: usize = 8;
const H: usize = 6;

/// Example whose latitude prediction is off by `offset` degrees everywhere
/// and whose gravity prediction is exact.
fn example(offset: f32) -> (EvalInput, Prediction) {
    let vp = VanishingPoint::new(4.0, -1.0e6, 1.0);
    let gravity = synthesize(H, W, &vp);
    let latitude = ScalarField::from_fn(W, H, |_, y| 10.0 - y as f32);
    let shifted = ScalarField::from_fn(W, H, |_, y| 10.0 - y as f32 + offset);
    (
        EvalInput {
            dataset: "gsv".into(),
            gravity: Some(gravity.clone()),
            latitude: Some(latitude),
            camera: None,
        },
        Prediction {
            gravity: Some(gravity),
            latitude: Some(shifted),
            camera: None,
        },
    )
}

/// Runs one distributed round where worker `r` processes `sizes[r]` examples.
/// Worker `r`'s examples carry latitude error `r + 1`.
fn run_round(sizes: &[usize]) -> Vec<(usize, Metrics)> {
    let config = PipelineConfig {
        distributed: true,
        ..PipelineConfig::default()
    };
    let handles: Vec<_> = LocalGroup::spawn(sizes.len())
        .into_iter()
        .zip(sizes.iter().copied())
        .enumerate()
        .map(|(rank, (worker, size))| {
            let config = config.clone();
            thread::spawn(move || {
                let mut ev = PerspectiveEvaluator::from_config("gsv_val", &config, Box::new(worker))
                    .expect("evaluator");
                ev.reset();
                let (inputs, predictions): (Vec<_>, Vec<_>) =
                    (0..size).map(|_| example(rank as f32 + 1.0)).unzip();
                ev.process(&inputs, &predictions).expect("process");
                assert_eq!(ev.local_records().len(), size);
                let metrics = ev.evaluate().expect("evaluate");
                assert_eq!(ev.state(), ReducerState::Done);
                (rank, metrics)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("worker thread"))
        .collect()
}

#[test]
fn coordinator_reduces_every_worker() {
    let _ = env_logger::builder().is_test(true).try_init();
    let sizes = [3, 0, 2, 1];
    let results = run_round(&sizes);

    for (rank, metrics) in &results {
        if *rank == 0 {
            continue;
        }
        assert!(metrics.is_empty(), "rank {rank} must not report metrics");
    }

    let (_, metrics) = &results[0];
    let total: usize = sizes.iter().sum();
    for task in [GRAVITY_TASK, LATITUDE_TASK] {
        assert_eq!(metrics[task]["examples"], total as f64, "{task}");
    }
    assert!(!metrics.contains_key(PARAM_TASK));
    assert!(metrics[GRAVITY_TASK]["mean_error"] < 0.1);

    // Rank r contributes sizes[r] examples with error r + 1.
    let weighted: f64 = sizes
        .iter()
        .enumerate()
        .map(|(r, &n)| (r as f64 + 1.0) * n as f64)
        .sum();
    let expected = weighted / total as f64;
    assert!((metrics[LATITUDE_TASK]["mean_error"] - expected).abs() < 1e-4);
}

#[test]
fn single_worker_group_matches_local_evaluation() {
    let results = run_round(&[4]);
    let (_, metrics) = &results[0];
    assert_eq!(metrics[LATITUDE_TASK]["examples"], 4.0);
    assert!((metrics[LATITUDE_TASK]["mean_error"] - 1.0).abs() < 1e-6);
    assert_eq!(metrics[LATITUDE_TASK]["within_1deg"], 0.0);
    assert_eq!(metrics[LATITUDE_TASK]["within_2deg"], 100.0);
}

#[test]
fn frozen_heads_leave_only_parameter_metrics() {
    let mut config = PipelineConfig {
        recover_rpf: true,
        ..PipelineConfig::default()
    };
    config.freeze.insert("persformer_heads".into());
    let composite = EvaluatorComposite::from_config(&config).expect("composite");
    assert_eq!(composite.tasks(), vec![PARAM_TASK]);

    let mut ev = PerspectiveEvaluator::single_process("gsv_val", composite);
    ev.reset();
    let pose = CameraPose::new(2.0, -5.0, 60.0);
    let input = EvalInput {
        dataset: "gsv".into(),
        camera: Some(CameraParams {
            pose,
            principal_point: None,
        }),
        ..Default::default()
    };
    let prediction = Prediction {
        camera: Some(CameraParams {
            pose: CameraPose::new(3.0, -5.0, 62.0),
            principal_point: None,
        }),
        ..Default::default()
    };
    ev.process(&[input], &[prediction]).expect("process");
    let metrics = ev.evaluate().expect("evaluate");
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[PARAM_TASK]["mean_roll_err"], 1.0);
    assert_eq!(metrics[PARAM_TASK]["mean_vfov_err"], 2.0);
}

/// Tags each record with `(rank, local index)` and remembers the order in
/// which the reduced payloads arrive.
struct OrderTracker {
    rank: usize,
    next: AtomicUsize,
    seen: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl TaskEvaluator for OrderTracker {
    fn task(&self) -> &'static str {
        "order"
    }

    fn process(&self, _: &EvalInput, _: &Prediction) -> Result<Value, EvalError> {
        Ok(json!([self.rank, self.next.fetch_add(1, Ordering::SeqCst)]))
    }

    fn evaluate(&self, payloads: &[&Value]) -> Result<TaskMetrics, EvalError> {
        let order: Vec<(usize, usize)> = payloads
            .iter()
            .map(|p| serde_json::from_value((*p).clone()).expect("(rank, index) payload"))
            .collect();
        self.seen.lock().expect("order lock").extend(order);
        let mut metrics = TaskMetrics::new();
        metrics.insert("examples".into(), payloads.len() as f64);
        Ok(metrics)
    }
}

#[test]
fn coordinator_flattens_rank_major() {
    let sizes = [3usize, 0, 2, 1];
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = LocalGroup::spawn(sizes.len())
        .into_iter()
        .zip(sizes)
        .enumerate()
        .map(|(rank, (worker, size))| {
            let tracker = OrderTracker {
                rank,
                next: AtomicUsize::new(0),
                seen: Arc::clone(&seen),
            };
            thread::spawn(move || {
                let composite = EvaluatorComposite::new(vec![Box::new(tracker) as Box<dyn TaskEvaluator>])
                    .expect("composite");
                let mut ev = PerspectiveEvaluator::new("order_val", composite, Box::new(worker), true);
                ev.reset();
                let inputs = vec![EvalInput::default(); size];
                let predictions = vec![Prediction::default(); size];
                ev.process(&inputs, &predictions).expect("process");
                ev.evaluate().expect("evaluate")
            })
        })
        .collect();
    let metrics: Vec<Metrics> = handles
        .into_iter()
        .map(|h| h.join().expect("worker thread"))
        .collect();

    assert_eq!(metrics[0]["order"]["examples"], 6.0);
    assert!(metrics[1..].iter().all(|m| m.is_empty()));
    assert_eq!(
        *seen.lock().expect("order lock"),
        vec![(0, 0), (0, 1), (0, 2), (2, 0), (2, 1), (3, 0)]
    );
}
