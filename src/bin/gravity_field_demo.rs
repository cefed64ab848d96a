use perspective_fields::config::gravity_demo;
use perspective_fields::dispatch::{GravityTransform, LabeledExample, Mode};
use perspective_fields::encode::GravityTarget;
use perspective_fields::io::{save_field_png, write_json_file};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = gravity_demo::load_config(Path::new(&config_path))?;
    let mode = if config.eval_mode { Mode::Eval } else { Mode::Train };
    let transform =
        GravityTransform::from_config(&config.pipeline, mode).map_err(|e| e.to_string())?;

    let mut outputs = Vec::with_capacity(config.records.len());
    for (index, record) in config.records.iter().enumerate() {
        let example = LabeledExample::from_record(record)
            .map_err(|e| format!("record {index}: {e}"))?;
        let label = transform
            .resolve(&example)
            .map_err(|e| format!("record {index} ({}): {e}", record.dataset))?;
        let (height, width) = example.size();
        let target = transform
            .encode_label(height, width, &label)
            .map_err(|e| format!("record {index} ({}): {e}", record.dataset))?;

        let field_png = match &label.field {
            Some(field) => {
                let path = config
                    .output
                    .field_dir
                    .join(format!("{index:04}_{}.png", record.dataset));
                save_field_png(field, &path)?;
                Some(path.display().to_string())
            }
            None => None,
        };

        outputs.push(RecordOutput {
            index,
            dataset: record.dataset.clone(),
            family: format!("{:?}", example.family()),
            vanishing_point: label.vanishing_point.map(|vp| vp.to_array()),
            field_png,
            undefined_pixels: label.field.as_ref().map(|f| f.undefined_count()),
            target: target.as_ref().map(TargetOutput::from),
        });
    }

    let summary = DemoSummary {
        mode: format!("{mode:?}"),
        loss_type: config.pipeline.gravity_decoder.loss_type.clone(),
        num_classes: transform.num_classes(),
        records: outputs,
    };
    write_json_file(&config.output.summary_json, &summary)?;

    println!(
        "Resolved {} record(s); summary written to {}",
        summary.records.len(),
        config.output.summary_json.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: gravity_field_demo <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoSummary {
    mode: String,
    loss_type: String,
    num_classes: usize,
    records: Vec<RecordOutput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOutput {
    index: usize,
    dataset: String,
    family: String,
    vanishing_point: Option<[f64; 3]>,
    field_png: Option<String>,
    undefined_pixels: Option<usize>,
    target: Option<TargetOutput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetOutput {
    kind: String,
    shape: [usize; 3],
}

impl From<&GravityTarget> for TargetOutput {
    fn from(target: &GravityTarget) -> Self {
        Self {
            kind: target.loss_type().to_string(),
            shape: target.shape(),
        }
    }
}
