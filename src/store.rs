//! Keyed array store for precomputed gravity fields.
//!
//! Arrays are stored as `{"shape": [...], "data": [...]}` JSON documents,
//! row-major. `ArrayStore` is the seam: the dispatcher only ever asks for an
//! array by key.
use crate::field::GravityField;
use crate::io::write_json_file;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("array `{0}` not found")]
    NotFound(String),
    #[error("failed to read array {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse array {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("array `{key}` is corrupt: shape {shape:?} needs {expected} values, found {found}")]
    Corrupt {
        key: String,
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },
    #[error("array shape {found:?} does not match the {expected} layout")]
    Shape {
        expected: &'static str,
        found: Vec<usize>,
    },
    #[error("failed to write array: {0}")]
    Write(String),
}

/// Raw row-major array as read from a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Axis order of a stored two-channel field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelLayout {
    /// `(h, w, 2)`: consumed as-is
    Last,
    /// `(2, h, w)`: the channel axis is moved to the end
    First,
}

impl RawArray {
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn from_field(field: &GravityField) -> Self {
        Self {
            shape: vec![field.h, field.w, 2],
            data: field
                .data
                .iter()
                .flat_map(|v| [v[0] as f64, v[1] as f64])
                .collect(),
        }
    }

    /// Casts the array to f32 and arranges it as a channel-last field.
    pub fn into_gravity_field(self, layout: ChannelLayout) -> Result<GravityField, StoreError> {
        let shape_err = |expected| StoreError::Shape {
            expected,
            found: self.shape.clone(),
        };
        match layout {
            ChannelLayout::Last => {
                let [h, w, c] = self.shape[..] else {
                    return Err(shape_err("(h, w, 2)"));
                };
                if c != 2 || self.data.len() != h * w * 2 {
                    return Err(shape_err("(h, w, 2)"));
                }
                let data = self
                    .data
                    .chunks_exact(2)
                    .map(|px| [px[0] as f32, px[1] as f32])
                    .collect();
                Ok(GravityField { w, h, data })
            }
            ChannelLayout::First => {
                let [c, h, w] = self.shape[..] else {
                    return Err(shape_err("(2, h, w)"));
                };
                if c != 2 || self.data.len() != h * w * 2 {
                    return Err(shape_err("(2, h, w)"));
                }
                let n = h * w;
                let (dx, dy) = self.data.split_at(n);
                let data = dx
                    .iter()
                    .zip(dy.iter())
                    .map(|(&x, &y)| [x as f32, y as f32])
                    .collect();
                Ok(GravityField { w, h, data })
            }
        }
    }
}

pub trait ArrayStore: Send + Sync {
    fn read_array(&self, key: &str) -> Result<RawArray, StoreError>;
}

impl<S: ArrayStore + ?Sized> ArrayStore for std::sync::Arc<S> {
    fn read_array(&self, key: &str) -> Result<RawArray, StoreError> {
        (**self).read_array(key)
    }
}

/// Store backed by JSON files; keys are paths, resolved against `root` when
/// relative.
#[derive(Clone, Debug, Default)]
pub struct JsonArrayStore {
    root: Option<PathBuf>,
}

impl JsonArrayStore {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let key_path = Path::new(key);
        match &self.root {
            Some(root) if key_path.is_relative() => root.join(key_path),
            _ => key_path.to_path_buf(),
        }
    }

    /// Writes `array` under `key`, creating parent directories.
    pub fn write_array(&self, key: &str, array: &RawArray) -> Result<(), StoreError> {
        write_json_file(&self.path_for(key), array).map_err(StoreError::Write)
    }
}

impl ArrayStore for JsonArrayStore {
    fn read_array(&self, key: &str) -> Result<RawArray, StoreError> {
        let path = self.path_for(key);
        let text = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let array: RawArray =
            serde_json::from_str(&text).map_err(|source| StoreError::Parse { path, source })?;
        validate(key, &array)?;
        debug!("JsonArrayStore: read `{key}` with shape {:?}", array.shape);
        Ok(array)
    }
}

/// In-memory store, mostly for tests and synthetic data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    arrays: HashMap<String, RawArray>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, array: RawArray) {
        self.arrays.insert(key.into(), array);
    }
}

impl ArrayStore for MemoryStore {
    fn read_array(&self, key: &str) -> Result<RawArray, StoreError> {
        let array = self
            .arrays
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        validate(key, &array)?;
        Ok(array)
    }
}

fn validate(key: &str, array: &RawArray) -> Result<(), StoreError> {
    let expected = array.element_count();
    if expected != array.data.len() {
        return Err(StoreError::Corrupt {
            key: key.to_string(),
            shape: array.shape.clone(),
            expected,
            found: array.data.len(),
        });
    }
    Ok(())
}
