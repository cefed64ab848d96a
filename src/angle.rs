//! Angle utilities shared by the bin encoder and the evaluators.

use std::f64::consts::TAU;

/// Converts a 2D direction into its polar angle, wrapped into [0, 2π).
///
/// The angle is measured with `atan2(y, x)` and shifted by π, so the
/// direction (-1, 0) maps to 0 and the angle grows counter-clockwise in
/// array coordinates.
#[inline]
pub fn direction_angle(v: [f32; 2]) -> f64 {
    let a = (v[1] as f64).atan2(v[0] as f64) + std::f64::consts::PI;
    let wrapped = a.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Inverse of [`direction_angle`]: unit vector for an angle in [0, 2π).
#[inline]
pub fn angle_direction(angle: f64) -> [f32; 2] {
    let a = angle - std::f64::consts::PI;
    [a.cos() as f32, a.sin() as f32]
}

/// Computes the unsigned angle between two 2D vectors in radians.
/// Returns a value in [0, π]. Zero if the vectors are parallel
/// and pointing in the same direction; π if they are opposite.
#[inline]
pub fn angle_between(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    let dot = a[0] * b[0] + a[1] * b[1];
    let na = (a[0] * a[0] + a[1] * a[1]).sqrt().max(1e-6);
    let nb = (b[0] * b[0] + b[1] * b[1]).sqrt().max(1e-6);
    (dot / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Smallest unsigned difference between two angles on the circle, in [0, π].
#[inline]
pub fn circular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > std::f64::consts::PI {
        TAU - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn direction_angle_covers_full_circle() {
        assert!(approx_eq(direction_angle([-1.0, 0.0]), 0.0));
        assert!(approx_eq(direction_angle([0.0, -1.0]), FRAC_PI_2));
        assert!(approx_eq(direction_angle([1.0, 0.0]), PI));
        assert!(approx_eq(direction_angle([0.0, 1.0]), 3.0 * FRAC_PI_2));
    }

    #[test]
    fn angle_direction_inverts_direction_angle() {
        for v in [[0.6f32, 0.8], [-0.8, 0.6], [0.0, -1.0], [-1.0, 0.0]] {
            let back = angle_direction(direction_angle(v));
            assert!((back[0] - v[0]).abs() < 1e-5);
            assert!((back[1] - v[1]).abs() < 1e-5);
        }
    }

    #[test]
    fn circular_difference_handles_wrap() {
        assert!(approx_eq(circular_difference(0.1, TAU - 0.1), 0.2));
        assert!(approx_eq(circular_difference(0.0, PI), PI));
        assert!(approx_eq(circular_difference(1.0, 1.0), 0.0));
    }

    #[test]
    fn angle_between_basic() {
        let a = [1.0f32, 0.0];
        assert!(angle_between(&a, &a).abs() < 1e-4);

        let c = [-1.0f32, 0.0];
        assert!((angle_between(&a, &c) - std::f32::consts::PI).abs() < 1e-4);

        let d = [0.0f32, 1.0];
        assert!((angle_between(&a, &d) - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }
}
