use super::pipeline::PipelineConfig;
use crate::dispatch::DatasetRecord;
use crate::io::load_json_file;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct GravityDemoConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Evaluation mode materializes fields for every labeled record.
    #[serde(default)]
    pub eval_mode: bool,
    pub records: Vec<DatasetRecord>,
    pub output: GravityDemoOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GravityDemoOutputConfig {
    pub field_dir: PathBuf,
    pub summary_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<GravityDemoConfig, String> {
    load_json_file(path)
}
