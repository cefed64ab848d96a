use perspective_fields::dispatch::DatasetRecord;
use perspective_fields::field::GravityField;
use perspective_fields::geometry::{
    CameraGeometry, PinholeGeometry, RelativeHorizon, RelativeVanishingPoint, VanishingPoint,
};
use perspective_fields::store::RawArray;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Pinhole geometry that counts how many dense fields it synthesizes.
#[derive(Clone, Default)]
pub struct CountingGeometry {
    inner: PinholeGeometry,
    fields: Arc<AtomicUsize>,
}

impl CountingGeometry {
    pub fn fields_synthesized(&self) -> usize {
        self.fields.load(Ordering::SeqCst)
    }
}

impl CameraGeometry for CountingGeometry {
    fn relative_horizon(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeHorizon {
        self.inner
            .relative_horizon(elevation, roll, vfov, height, width)
    }

    fn relative_vanishing_point(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeVanishingPoint {
        self.inner
            .relative_vanishing_point(elevation, roll, vfov, height, width)
    }

    fn absolute_vanishing_point(
        &self,
        height: usize,
        width: usize,
        horizon: &RelativeHorizon,
        vp: &RelativeVanishingPoint,
    ) -> VanishingPoint {
        self.inner
            .absolute_vanishing_point(height, width, horizon, vp)
    }

    fn gravity_field(&self, height: usize, width: usize, vp: &VanishingPoint) -> GravityField {
        self.fields.fetch_add(1, Ordering::SeqCst);
        self.inner.gravity_field(height, width, vp)
    }
}

pub fn angles_record(dataset: &str, roll: f64, pitch: f64, vfov: f64) -> DatasetRecord {
    DatasetRecord {
        dataset: dataset.to_string(),
        height: 24,
        width: 32,
        roll: Some(roll),
        pitch: Some(pitch),
        vfov: Some(vfov),
        ..Default::default()
    }
}

pub fn stored_vp_record(dataset: &str, vp: [f64; 3]) -> DatasetRecord {
    DatasetRecord {
        dataset: dataset.to_string(),
        height: 24,
        width: 32,
        vvp_abs: Some(vp),
        ..Default::default()
    }
}

pub fn store_record(dataset: &str, key: &str, height: usize, width: usize) -> DatasetRecord {
    DatasetRecord {
        dataset: dataset.to_string(),
        height,
        width,
        gravity_file_name: Some(key.to_string()),
        ..Default::default()
    }
}

/// Field whose pixel `(x, y)` holds `(x, y)`; makes layout mistakes obvious.
pub fn coordinate_field(width: usize, height: usize) -> GravityField {
    let mut field = GravityField::new(width, height);
    for y in 0..height {
        for x in 0..width {
            field.set(x, y, [x as f32, y as f32]);
        }
    }
    field
}

/// The same field as [`coordinate_field`], stored channel-first `(2, h, w)`.
pub fn coordinate_array_channel_first(width: usize, height: usize) -> RawArray {
    let xs = (0..height).flat_map(|_| (0..width).map(|x| x as f64));
    let ys = (0..height).flat_map(|y| (0..width).map(move |_| y as f64));
    RawArray {
        shape: vec![2, height, width],
        data: xs.chain(ys).collect(),
    }
}
