//! Channel-first training targets.
//!
//! `PlanarField` is the `(2, height, width)` f32 regression target and
//! `BinnedField` the `(1, height, width)` class-index target.
use super::gravity::GravityField;

/// Channel-first f32 tensor with `channels` planes of `h × w` values.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanarField {
    pub channels: usize,
    pub h: usize,
    pub w: usize,
    /// Plane-major storage: plane `c` starts at `c * h * w`.
    pub data: Vec<f32>,
}

impl PlanarField {
    /// `[channels, height, width]`
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.h, self.w]
    }

    #[inline]
    pub fn get(&self, c: usize, x: usize, y: usize) -> f32 {
        self.data[(c * self.h + y) * self.w + x]
    }

    /// Borrow one channel plane.
    pub fn plane(&self, c: usize) -> &[f32] {
        let n = self.h * self.w;
        &self.data[c * n..(c + 1) * n]
    }
}

impl From<&GravityField> for PlanarField {
    fn from(field: &GravityField) -> Self {
        let n = field.w * field.h;
        let mut data = vec![0.0f32; 2 * n];
        let (dx, dy) = data.split_at_mut(n);
        for (i, v) in field.data.iter().enumerate() {
            dx[i] = v[0];
            dy[i] = v[1];
        }
        Self {
            channels: 2,
            h: field.h,
            w: field.w,
            data,
        }
    }
}

impl From<&PlanarField> for GravityField {
    /// Reads the first two planes back into a channel-last field.
    fn from(planar: &PlanarField) -> Self {
        let n = planar.w * planar.h;
        let data = (0..n)
            .map(|i| [planar.data[i], planar.data[n + i]])
            .collect();
        GravityField {
            w: planar.w,
            h: planar.h,
            data,
        }
    }
}

/// Per-pixel class indices with shape `(1, height, width)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinnedField {
    pub h: usize,
    pub w: usize,
    pub data: Vec<i64>,
}

impl BinnedField {
    /// `[1, height, width]`
    pub fn shape(&self) -> [usize; 3] {
        [1, self.h, self.w]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> i64 {
        self.data[y * self.w + x]
    }
}
