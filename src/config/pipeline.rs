use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Frozen-component name that disables the gravity and latitude evaluators.
pub const PERSFORMER_HEADS: &str = "persformer_heads";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown meta architecture `{0}` (expected PerspectiveNet, PersFormer or ParamNetStandalone)")]
    UnknownArchitecture(String),
    #[error("evaluator task `{0}` is registered more than once")]
    TaskCollision(String),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Model architecture; decides which head supplies the gravity class count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaArchitecture {
    PerspectiveNet,
    PersFormer,
    ParamNetStandalone,
}

impl FromStr for MetaArchitecture {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PerspectiveNet" => Ok(MetaArchitecture::PerspectiveNet),
            "PersFormer" => Ok(MetaArchitecture::PersFormer),
            "ParamNetStandalone" => Ok(MetaArchitecture::ParamNetStandalone),
            other => Err(ConfigError::UnknownArchitecture(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeadConfig {
    pub num_classes: usize,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self { num_classes: 72 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GravityDecoderConfig {
    pub num_classes: usize,
    /// `regression` or `classification`; validated when a target is encoded.
    pub loss_type: String,
}

impl Default for GravityDecoderConfig {
    fn default() -> Self {
        Self {
            num_classes: 72,
            loss_type: "classification".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParamDecoderConfig {
    pub synthetic_pretrain: bool,
}

/// Settings consumed by the gravity transform and the evaluator.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target `[height, width]` applied by the data loader, if any.
    pub resize: Option<[usize; 2]>,
    /// Channel order of input images (`RGB` / `BGR`).
    pub input_format: String,
    pub meta_architecture: String,
    pub fpn_gravity_head: HeadConfig,
    pub gravity_decoder: GravityDecoderConfig,
    pub param_decoder: ParamDecoderConfig,
    pub gravity_on: bool,
    pub latitude_on: bool,
    /// Recover roll / pitch / vertical FoV.
    pub recover_rpf: bool,
    /// Recover the principal point.
    pub recover_pp: bool,
    pub freeze: BTreeSet<String>,
    pub distributed: bool,
    pub output_dir: Option<PathBuf>,
    /// Directory against which relative array-store keys are resolved.
    pub store_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resize: None,
            input_format: "RGB".to_string(),
            meta_architecture: "PersFormer".to_string(),
            fpn_gravity_head: HeadConfig::default(),
            gravity_decoder: GravityDecoderConfig::default(),
            param_decoder: ParamDecoderConfig::default(),
            gravity_on: true,
            latitude_on: true,
            recover_rpf: false,
            recover_pp: false,
            freeze: BTreeSet::new(),
            distributed: false,
            output_dir: None,
            store_root: None,
        }
    }
}

impl PipelineConfig {
    pub fn architecture(&self) -> Result<MetaArchitecture, ConfigError> {
        self.meta_architecture.parse()
    }

    /// Gravity class count taken from the head the architecture uses.
    pub fn gravity_num_classes(&self) -> Result<usize, ConfigError> {
        Ok(match self.architecture()? {
            MetaArchitecture::PerspectiveNet => self.fpn_gravity_head.num_classes,
            MetaArchitecture::PersFormer | MetaArchitecture::ParamNetStandalone => {
                self.gravity_decoder.num_classes
            }
        })
    }

    pub fn is_frozen(&self, component: &str) -> bool {
        self.freeze.contains(component)
    }

    /// Whether the dense perspective heads are trained and evaluated.
    pub fn dense_heads_active(&self) -> bool {
        !self.is_frozen(PERSFORMER_HEADS) && !self.param_decoder.synthetic_pretrain
    }

    pub fn param_recovery_on(&self) -> bool {
        self.recover_rpf || self.recover_pp
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
