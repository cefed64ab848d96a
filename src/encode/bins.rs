//! Direction binning for classification targets.
//!
//! `num_classes` bins of width `2π / num_classes` tile the circle of
//! directions; bin `c` is centered on angle `c · 2π / num_classes` as
//! measured by [`direction_angle`]. Rounding to the nearest center bounds the
//! round-trip angular error by `π / num_classes`. Zero vectors carry no
//! direction and map to [`IGNORE_BIN`], which decodes back to zero.
use super::EncodeError;
use crate::angle::{angle_direction, direction_angle};
use crate::field::{BinnedField, GravityField};
use std::f64::consts::TAU;

/// Class index assigned to pixels whose direction is undefined.
pub const IGNORE_BIN: i64 = -1;

/// Angular width of one bin in radians.
#[inline]
pub fn bin_width(num_classes: usize) -> f64 {
    TAU / num_classes as f64
}

/// Class index for a single vector.
#[inline]
pub fn encode_direction(v: [f32; 2], num_classes: usize) -> i64 {
    if !(v[0].is_finite() && v[1].is_finite()) || (v[0] == 0.0 && v[1] == 0.0) {
        return IGNORE_BIN;
    }
    let k = num_classes as i64;
    let bin = (direction_angle(v) / bin_width(num_classes)).round() as i64;
    bin.rem_euclid(k)
}

/// Unit vector at the center of class `bin`; zero for [`IGNORE_BIN`] or any
/// index outside `[0, num_classes)`.
#[inline]
pub fn decode_direction(bin: i64, num_classes: usize) -> [f32; 2] {
    if bin < 0 || bin >= num_classes as i64 {
        return [0.0, 0.0];
    }
    angle_direction(bin as f64 * bin_width(num_classes))
}

/// Quantizes every pixel direction of `field` into a `(1, h, w)` class map.
pub fn encode_bins(field: &GravityField, num_classes: usize) -> Result<BinnedField, EncodeError> {
    check_class_count(num_classes)?;
    Ok(BinnedField {
        h: field.h,
        w: field.w,
        data: field
            .data
            .iter()
            .map(|&v| encode_direction(v, num_classes))
            .collect(),
    })
}

/// Lossy inverse of [`encode_bins`]: unit vectors at the bin centers.
pub fn decode_bins(binned: &BinnedField, num_classes: usize) -> Result<GravityField, EncodeError> {
    check_class_count(num_classes)?;
    Ok(GravityField {
        w: binned.w,
        h: binned.h,
        data: binned
            .data
            .iter()
            .map(|&bin| decode_direction(bin, num_classes))
            .collect(),
    })
}

fn check_class_count(num_classes: usize) -> Result<(), EncodeError> {
    if num_classes < 2 {
        return Err(EncodeError::InvalidClassCount(num_classes));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::circular_difference;
    use crate::field::synthesize;
    use crate::geometry::VanishingPoint;

    #[test]
    fn round_trip_error_is_bounded_by_half_bin() {
        for k in [2usize, 3, 8, 36, 72, 73, 360] {
            let bound = std::f64::consts::PI / k as f64 + 1e-6;
            let field = synthesize(17, 23, &VanishingPoint::new(7.3, 9.1, 1.0));
            let binned = encode_bins(&field, k).expect("encode");
            assert!(binned.data.iter().all(|&c| c == IGNORE_BIN || (0..k as i64).contains(&c)));
            let decoded = decode_bins(&binned, k).expect("decode");
            for (a, b) in field.data.iter().zip(decoded.data.iter()) {
                let err = circular_difference(direction_angle(*a), direction_angle(*b));
                assert!(err <= bound, "k={k} a={a:?} b={b:?}");
            }
        }
    }

    #[test]
    fn every_direction_maps_into_range() {
        let k = 12usize;
        for i in 0..3600 {
            let a = i as f64 * TAU / 3600.0;
            let v = [a.cos() as f32, a.sin() as f32];
            let c = encode_direction(v, k);
            assert!((0..k as i64).contains(&c), "angle {a} -> {c}");
        }
    }

    #[test]
    fn zero_vectors_are_ignored() {
        let field = GravityField::new(3, 2);
        let binned = encode_bins(&field, 8).expect("encode");
        assert_eq!(binned.shape(), [1, 2, 3]);
        assert!(binned.data.iter().all(|&c| c == IGNORE_BIN));
        let decoded = decode_bins(&binned, 8).expect("decode");
        assert_eq!(decoded, field);
    }

    #[test]
    fn encoding_ignores_magnitude() {
        assert_eq!(encode_direction([0.0, -5.0], 4), encode_direction([0.0, -1.0], 4));
        assert_eq!(encode_direction([-1.0, 0.0], 4), 0);
        assert_eq!(encode_direction([0.0, -1.0], 4), 1);
    }

    #[test]
    fn rejects_degenerate_class_counts() {
        let field = GravityField::new(1, 1);
        assert_eq!(
            encode_bins(&field, 1).unwrap_err(),
            EncodeError::InvalidClassCount(1)
        );
    }
}
