//! Ground-truth dispatch: which gravity label an example gets depends on the
//! dataset family it came from.
//!
//! The raw loader record is converted once into a [`LabeledExample`], a
//! closed enum whose variants carry exactly the fields their family needs.
//! [`GravityTransform`] then resolves the vanishing point and, depending on
//! the [`Mode`], the dense field, and encodes training targets.
use crate::config::{ConfigError, PipelineConfig};
use crate::encode::{encode_field, EncodeError, GravityTarget};
use crate::field::GravityField;
use crate::geometry::{CameraGeometry, CameraPose, PinholeGeometry, VanishingPoint};
use crate::store::{ArrayStore, ChannelLayout, JsonArrayStore, StoreError};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ANGLE_DATASETS: &[&str] = &[
    "cities360",
    "rgbdpano",
    "sun360",
    "tartanair",
    "stanford2d3d",
    "objectron",
    "gsv",
    "edina",
];

const STORED_VP_DATASETS: &[&str] = &[
    "hypersim",
    "sun360_warp",
    "sun360_crop",
    "sun360_uncrop",
    "tartanair_warp",
    "tartanair_crop",
    "stanford2d3d_warp",
    "stanford2d3d_crop",
    "objectron_crop",
    "objectron_crop_mask",
    "gsv_crop",
    "edina_crop",
];

const UNLABELED_DATASETS: &[&str] = &["unlabeled"];
const SYNTHETIC_DISTORT_DATASETS: &[&str] = &["cities360_distort"];
const PSEUDO_LABELED_DATASETS: &[&str] = &["coco-pseudo"];

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported dataset `{0}`")]
    UnsupportedDataset(String),
    #[error("dataset `{dataset}` record is missing `{field}`")]
    MissingField {
        dataset: String,
        field: &'static str,
    },
    #[error("dataset `{0}` has no ground truth; it can only be used for training")]
    MissingGroundTruth(String),
    #[error("stored field `{key}` is {found:?} (h, w) but the example is {expected:?}")]
    FieldSizeMismatch {
        key: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Raw example mapping produced by the data loader.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub dataset: String,
    pub height: usize,
    pub width: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vfov: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vvp_abs: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity_file_name: Option<String>,
}

/// How a dataset family supplies its gravity ground truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatasetFamily {
    /// Roll / pitch / vertical FoV labels.
    Angles,
    /// Absolute vanishing point stored with the example.
    StoredVp,
    /// No gravity label at all.
    Unlabeled,
    /// Channel-last field in the array store.
    SyntheticDistort,
    /// Channel-first field in the array store.
    PseudoLabeled,
}

impl DatasetFamily {
    pub fn from_dataset_name(name: &str) -> Result<Self, DispatchError> {
        let table: [(&[&str], DatasetFamily); 5] = [
            (ANGLE_DATASETS, DatasetFamily::Angles),
            (STORED_VP_DATASETS, DatasetFamily::StoredVp),
            (UNLABELED_DATASETS, DatasetFamily::Unlabeled),
            (SYNTHETIC_DISTORT_DATASETS, DatasetFamily::SyntheticDistort),
            (PSEUDO_LABELED_DATASETS, DatasetFamily::PseudoLabeled),
        ];
        table
            .iter()
            .find(|(names, _)| names.contains(&name))
            .map(|&(_, family)| family)
            .ok_or_else(|| DispatchError::UnsupportedDataset(name.to_string()))
    }
}

/// One example, tagged by the way its gravity label is obtained.
#[derive(Clone, Debug, PartialEq)]
pub enum LabeledExample {
    Angles {
        dataset: String,
        height: usize,
        width: usize,
        pose: CameraPose,
    },
    StoredVp {
        dataset: String,
        height: usize,
        width: usize,
        vp: VanishingPoint,
    },
    Unlabeled {
        dataset: String,
        height: usize,
        width: usize,
    },
    SyntheticDistort {
        dataset: String,
        height: usize,
        width: usize,
        key: String,
    },
    PseudoLabeled {
        dataset: String,
        height: usize,
        width: usize,
        key: String,
    },
}

impl LabeledExample {
    pub fn from_record(record: &DatasetRecord) -> Result<Self, DispatchError> {
        let family = DatasetFamily::from_dataset_name(&record.dataset)?;
        let dataset = record.dataset.clone();
        let (height, width) = (record.height, record.width);
        let missing = |field| DispatchError::MissingField {
            dataset: record.dataset.clone(),
            field,
        };
        Ok(match family {
            DatasetFamily::Angles => LabeledExample::Angles {
                pose: CameraPose {
                    roll_deg: record.roll.ok_or_else(|| missing("roll"))?,
                    pitch_deg: record.pitch.ok_or_else(|| missing("pitch"))?,
                    vfov_deg: record.vfov.ok_or_else(|| missing("vfov"))?,
                },
                dataset,
                height,
                width,
            },
            DatasetFamily::StoredVp => LabeledExample::StoredVp {
                vp: VanishingPoint::from_array(record.vvp_abs.ok_or_else(|| missing("vvp_abs"))?),
                dataset,
                height,
                width,
            },
            DatasetFamily::Unlabeled => LabeledExample::Unlabeled {
                dataset,
                height,
                width,
            },
            DatasetFamily::SyntheticDistort => LabeledExample::SyntheticDistort {
                key: record
                    .gravity_file_name
                    .clone()
                    .ok_or_else(|| missing("gravity_file_name"))?,
                dataset,
                height,
                width,
            },
            DatasetFamily::PseudoLabeled => LabeledExample::PseudoLabeled {
                key: record
                    .gravity_file_name
                    .clone()
                    .ok_or_else(|| missing("gravity_file_name"))?,
                dataset,
                height,
                width,
            },
        })
    }

    pub fn family(&self) -> DatasetFamily {
        match self {
            LabeledExample::Angles { .. } => DatasetFamily::Angles,
            LabeledExample::StoredVp { .. } => DatasetFamily::StoredVp,
            LabeledExample::Unlabeled { .. } => DatasetFamily::Unlabeled,
            LabeledExample::SyntheticDistort { .. } => DatasetFamily::SyntheticDistort,
            LabeledExample::PseudoLabeled { .. } => DatasetFamily::PseudoLabeled,
        }
    }

    pub fn dataset(&self) -> &str {
        match self {
            LabeledExample::Angles { dataset, .. }
            | LabeledExample::StoredVp { dataset, .. }
            | LabeledExample::Unlabeled { dataset, .. }
            | LabeledExample::SyntheticDistort { dataset, .. }
            | LabeledExample::PseudoLabeled { dataset, .. } => dataset,
        }
    }

    /// `(height, width)`
    pub fn size(&self) -> (usize, usize) {
        match *self {
            LabeledExample::Angles { height, width, .. }
            | LabeledExample::StoredVp { height, width, .. }
            | LabeledExample::Unlabeled { height, width, .. }
            | LabeledExample::SyntheticDistort { height, width, .. }
            | LabeledExample::PseudoLabeled { height, width, .. } => (height, width),
        }
    }
}

impl TryFrom<&DatasetRecord> for LabeledExample {
    type Error = DispatchError;

    fn try_from(record: &DatasetRecord) -> Result<Self, Self::Error> {
        LabeledExample::from_record(record)
    }
}

/// Training skips dense fields for VP-labeled families; evaluation
/// materializes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// Vanishing point and (optionally) dense field resolved for one example.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLabel {
    pub vanishing_point: Option<VanishingPoint>,
    pub field: Option<GravityField>,
}

impl ResolvedLabel {
    fn vp_only(vp: VanishingPoint) -> Self {
        Self {
            vanishing_point: Some(vp),
            field: None,
        }
    }
}

/// Turns labeled examples into gravity ground truth and training targets.
pub struct GravityTransform<G = PinholeGeometry, S = JsonArrayStore> {
    geometry: G,
    store: S,
    mode: Mode,
    num_classes: usize,
    loss_type: String,
}

impl GravityTransform<PinholeGeometry, JsonArrayStore> {
    /// Pinhole geometry and a JSON store rooted at `config.store_root`.
    pub fn from_config(config: &PipelineConfig, mode: Mode) -> Result<Self, ConfigError> {
        Self::new(
            config,
            mode,
            PinholeGeometry,
            JsonArrayStore::new(config.store_root.clone()),
        )
    }
}

impl<G: CameraGeometry, S: ArrayStore> GravityTransform<G, S> {
    pub fn new(
        config: &PipelineConfig,
        mode: Mode,
        geometry: G,
        store: S,
    ) -> Result<Self, ConfigError> {
        let num_classes = config.gravity_num_classes()?;
        Ok(Self {
            geometry,
            store,
            mode,
            num_classes,
            loss_type: config.gravity_decoder.loss_type.clone(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Resolves the absolute vanishing point and, where the mode or family
    /// requires it, the dense ground-truth field.
    pub fn resolve(&self, example: &LabeledExample) -> Result<ResolvedLabel, DispatchError> {
        match example {
            LabeledExample::Angles {
                height,
                width,
                pose,
                ..
            } => {
                let vp = self.vanishing_point_from_pose(pose, *height, *width);
                Ok(self.materialize(*height, *width, vp))
            }
            LabeledExample::StoredVp {
                height, width, vp, ..
            } => Ok(self.materialize(*height, *width, *vp)),
            LabeledExample::Unlabeled { dataset, .. } => match self.mode {
                Mode::Train => Ok(ResolvedLabel {
                    vanishing_point: None,
                    field: None,
                }),
                Mode::Eval => Err(DispatchError::MissingGroundTruth(dataset.clone())),
            },
            LabeledExample::SyntheticDistort {
                key, height, width, ..
            } => self.stored_field(key, ChannelLayout::Last, (*height, *width)),
            LabeledExample::PseudoLabeled {
                key, height, width, ..
            } => self.stored_field(key, ChannelLayout::First, (*height, *width)),
        }
    }

    /// Converts a raw loader record and resolves it.
    pub fn resolve_record(&self, record: &DatasetRecord) -> Result<ResolvedLabel, DispatchError> {
        self.resolve(&LabeledExample::from_record(record)?)
    }

    /// Synthesizes the field for `vp` and encodes it.
    pub fn to_target(
        &self,
        height: usize,
        width: usize,
        vp: &VanishingPoint,
    ) -> Result<GravityTarget, EncodeError> {
        let field = self.geometry.gravity_field(height, width, vp);
        self.to_target_from_field(&field)
    }

    /// Encodes an already materialized field.
    pub fn to_target_from_field(&self, field: &GravityField) -> Result<GravityTarget, EncodeError> {
        encode_field(field, &self.loss_type, self.num_classes)
    }

    /// Full target path for one example. `None` for unlabeled examples in
    /// training mode.
    pub fn target_for(
        &self,
        example: &LabeledExample,
    ) -> Result<Option<GravityTarget>, DispatchError> {
        let (height, width) = example.size();
        let label = self.resolve(example)?;
        Ok(self.encode_label(height, width, &label)?)
    }

    /// Encodes a resolved label: its field when materialized, otherwise the
    /// field synthesized from its vanishing point.
    pub fn encode_label(
        &self,
        height: usize,
        width: usize,
        label: &ResolvedLabel,
    ) -> Result<Option<GravityTarget>, EncodeError> {
        match (&label.field, &label.vanishing_point) {
            (Some(field), _) => self.to_target_from_field(field).map(Some),
            (None, Some(vp)) => self.to_target(height, width, vp).map(Some),
            (None, None) => Ok(None),
        }
    }

    fn vanishing_point_from_pose(
        &self,
        pose: &CameraPose,
        height: usize,
        width: usize,
    ) -> VanishingPoint {
        let elevation = pose.pitch_deg.to_radians();
        let roll = pose.roll_deg.to_radians();
        let vfov = pose.vfov_deg.to_radians();
        let horizon = self
            .geometry
            .relative_horizon(elevation, roll, vfov, height, width);
        let rel = self
            .geometry
            .relative_vanishing_point(elevation, roll, vfov, height, width);
        self.geometry
            .absolute_vanishing_point(height, width, &horizon, &rel)
    }

    fn materialize(&self, height: usize, width: usize, vp: VanishingPoint) -> ResolvedLabel {
        match self.mode {
            Mode::Train => ResolvedLabel::vp_only(vp),
            Mode::Eval => ResolvedLabel {
                vanishing_point: Some(vp),
                field: Some(self.geometry.gravity_field(height, width, &vp)),
            },
        }
    }

    fn stored_field(
        &self,
        key: &str,
        layout: ChannelLayout,
        expected: (usize, usize),
    ) -> Result<ResolvedLabel, DispatchError> {
        let field = self.store.read_array(key)?.into_gravity_field(layout)?;
        if (field.h, field.w) != expected {
            return Err(DispatchError::FieldSizeMismatch {
                key: key.to_string(),
                expected,
                found: (field.h, field.w),
            });
        }
        debug!(
            "GravityTransform: loaded stored field `{key}` ({}x{}, {layout:?})",
            field.w, field.h
        );
        Ok(ResolvedLabel {
            vanishing_point: Some(VanishingPoint::NONE),
            field: Some(field),
        })
    }
}
