//! I/O helpers for JSON and field visualizations.
//!
//! - `load_json_file`: parse a deserializable value from disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `save_field_png`: write a gravity field as a colour-wheel PNG.
use crate::angle::direction_angle;
use crate::field::{FieldView, GravityField};
use image::{Rgb, RgbImage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Deserialize a JSON document from `path`.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Save a gravity field as an RGB PNG: hue encodes direction, undefined
/// pixels are black.
pub fn save_field_png(field: &GravityField, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = RgbImage::new(field.width() as u32, field.height() as u32);
    for (y, row) in field.rows().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            out.put_pixel(x as u32, y as u32, direction_color(v));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

fn direction_color(v: [f32; 2]) -> Rgb<u8> {
    if v[0] == 0.0 && v[1] == 0.0 {
        return Rgb([0, 0, 0]);
    }
    let hue = direction_angle(v) / std::f64::consts::TAU * 6.0;
    let sector = hue.floor();
    let frac = hue - sector;
    let (r, g, b) = match sector as i32 {
        0 => (1.0, frac, 0.0),
        1 => (1.0 - frac, 1.0, 0.0),
        2 => (0.0, 1.0, frac),
        3 => (0.0, 1.0 - frac, 1.0),
        4 => (frac, 0.0, 1.0),
        _ => (1.0, 0.0, 1.0 - frac),
    };
    let to_u8 = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_pixels_are_black() {
        assert_eq!(direction_color([0.0, 0.0]), Rgb([0, 0, 0]));
        assert_eq!(direction_color([-1.0, 0.0]), Rgb([255, 0, 0]));
    }

    #[test]
    fn writes_png_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut field = GravityField::new(4, 3);
        field.set(1, 1, [0.0, -1.0]);
        let png = dir.path().join("nested/field.png");
        save_field_png(&field, &png).expect("png");
        assert!(png.exists());

        let json = dir.path().join("summary.json");
        write_json_file(&json, &vec![1u32, 2, 3]).expect("json");
        let back: Vec<u32> = load_json_file(&json).expect("load");
        assert_eq!(back, vec![1, 2, 3]);
    }
}
