//! Channel-last gravity field `(height, width, 2)` and its synthesis from an
//! absolute vertical vanishing point.
//!
//! Every pixel stores the 2D direction of the projected "up" axis. Pixels
//! where the direction is undefined hold the zero vector.
use super::traits::FieldView;
use crate::geometry::VanishingPoint;
use log::debug;
use rayon::prelude::*;

/// Dense unit-vector field in row-major, channel-last layout.
#[derive(Clone, Debug, PartialEq)]
pub struct GravityField {
    /// Field width in pixels
    pub w: usize,
    /// Field height in pixels
    pub h: usize,
    /// `[dx, dy]` per pixel, row-major
    pub data: Vec<[f32; 2]>,
}

impl GravityField {
    /// Construct a zero field of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![[0.0; 2]; w * h],
        }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [f32; 2] {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: [f32; 2]) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Number of pixels holding the zero vector.
    pub fn undefined_count(&self) -> usize {
        self.data.iter().filter(|v| v[0] == 0.0 && v[1] == 0.0).count()
    }
}

impl FieldView for GravityField {
    type Pixel = [f32; 2];

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[[f32; 2]] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

/// Synthesizes the gravity field for an image of `height × width` pixels.
///
/// For pixel `(x, y)` the displacement `(vp.x - x, vp.y - y)` is normalized
/// and multiplied by `vp.scale`; a negative scale flips the field so it
/// points away from the vanishing point. A pixel that coincides with the
/// vanishing point has no direction and receives the zero vector, as does
/// every pixel when `vp.scale == 0`.
pub fn synthesize(height: usize, width: usize, vp: &VanishingPoint) -> GravityField {
    let mut field = GravityField::new(width, height);
    if width == 0 || height == 0 {
        return field;
    }

    let degenerate: usize = field
        .data
        .par_chunks_mut(width)
        .enumerate()
        .map(|(y, row)| {
            let mut clamped = 0usize;
            for (x, px) in row.iter_mut().enumerate() {
                let dx = vp.x - x as f64;
                let dy = vp.y - y as f64;
                let norm = (dx * dx + dy * dy).sqrt();
                if norm > 0.0 && norm.is_finite() {
                    *px = [
                        (dx / norm * vp.scale) as f32,
                        (dy / norm * vp.scale) as f32,
                    ];
                } else {
                    clamped += 1;
                }
            }
            clamped
        })
        .sum();

    if degenerate > 0 {
        debug!(
            "synthesize: {degenerate} pixel(s) coincide with the vanishing point ({:.3}, {:.3}); clamped to zero",
            vp.x, vp.y
        );
    }
    field
}
