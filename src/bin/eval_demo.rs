use log::info;
use perspective_fields::config::PipelineConfig;
use perspective_fields::dispatch::{GravityTransform, LabeledExample, Mode};
use perspective_fields::eval::{EvalInput, LocalGroup, PerspectiveEvaluator, Prediction};
use perspective_fields::field::GravityField;
use perspective_fields::geometry::{CameraPose, PinholeGeometry};
use std::env;
use std::thread;

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const EXAMPLES_PER_WORKER: usize = 4;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let workers: usize = match env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .map_err(|_| format!("invalid worker count `{arg}`\n{}", usage()))?,
        None => 2,
    };
    if workers == 0 {
        return Err(usage());
    }

    let config = PipelineConfig {
        distributed: true,
        ..PipelineConfig::default()
    };

    let handles: Vec<_> = LocalGroup::spawn(workers)
        .into_iter()
        .enumerate()
        .map(|(rank, worker)| {
            let config = config.clone();
            thread::spawn(move || -> Result<_, String> {
                let mut evaluator =
                    PerspectiveEvaluator::from_config("gsv_demo", &config, Box::new(worker))
                        .map_err(|e| e.to_string())?;
                let (inputs, predictions) = worker_batch(&config, rank)?;
                evaluator.reset();
                evaluator
                    .process(&inputs, &predictions)
                    .map_err(|e| e.to_string())?;
                info!("rank {rank}: processed {} example(s)", inputs.len());
                evaluator.evaluate().map_err(|e| e.to_string())
            })
        })
        .collect();

    let mut coordinator_metrics = None;
    for (rank, handle) in handles.into_iter().enumerate() {
        let metrics = handle
            .join()
            .map_err(|_| format!("worker {rank} panicked"))??;
        if !metrics.is_empty() {
            coordinator_metrics = Some(metrics);
        }
    }

    let metrics = coordinator_metrics.ok_or("coordinator returned no metrics")?;
    let text = serde_json::to_string_pretty(&metrics).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn usage() -> String {
    "Usage: eval_demo [workers]".to_string()
}

/// Ground truth from a sweep of camera poses; predictions are the fields of a
/// slightly perturbed pose.
fn worker_batch(
    config: &PipelineConfig,
    rank: usize,
) -> Result<(Vec<EvalInput>, Vec<Prediction>), String> {
    let transform = GravityTransform::from_config(config, Mode::Eval).map_err(|e| e.to_string())?;
    let geometry = PinholeGeometry;
    let mut inputs = Vec::with_capacity(EXAMPLES_PER_WORKER);
    let mut predictions = Vec::with_capacity(EXAMPLES_PER_WORKER);

    for i in 0..EXAMPLES_PER_WORKER {
        let step = (rank * EXAMPLES_PER_WORKER + i) as f64;
        let gt_pose = CameraPose::new(-10.0 + 2.5 * step, -20.0 + 4.0 * step, 60.0);
        let pred_pose = CameraPose::new(gt_pose.roll_deg + 1.5, gt_pose.pitch_deg - 2.0, 60.0);

        inputs.push(EvalInput {
            dataset: "gsv".into(),
            gravity: Some(field_for(&transform, &gt_pose)?),
            latitude: Some(geometry.latitude_field(&gt_pose, HEIGHT, WIDTH)),
            camera: None,
        });
        predictions.push(Prediction {
            gravity: Some(field_for(&transform, &pred_pose)?),
            latitude: Some(geometry.latitude_field(&pred_pose, HEIGHT, WIDTH)),
            camera: None,
        });
    }
    Ok((inputs, predictions))
}

fn field_for(transform: &GravityTransform, pose: &CameraPose) -> Result<GravityField, String> {
    let example = LabeledExample::Angles {
        dataset: "gsv".into(),
        height: HEIGHT,
        width: WIDTH,
        pose: *pose,
    };
    transform
        .resolve(&example)
        .map_err(|e| e.to_string())?
        .field
        .ok_or_else(|| "evaluation mode produced no field".to_string())
}
