//! Camera geometry: from roll / pitch / vertical FoV to the horizon line and
//! the vertical vanishing point.
//!
//! Image coordinates follow the array convention (x right, y down, pixel
//! `(0, 0)` at the top-left). The camera frame is x right, y down, z
//! forward. A positive pitch tilts the camera up; a positive roll rotates the
//! projected up direction toward +x.
use crate::field::{synthesize, GravityField, ScalarField};
use nalgebra::{Rotation3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Distance (pixels) at which a vanishing point at infinity is placed when
/// converted to absolute coordinates.
pub const FAR_VANISHING_DISTANCE: f64 = 1.0e8;

const PARALLEL_EPS: f64 = 1e-9;

/// Camera orientation and field of view in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub vfov_deg: f64,
}

impl CameraPose {
    pub fn new(roll_deg: f64, pitch_deg: f64, vfov_deg: f64) -> Self {
        Self {
            roll_deg,
            pitch_deg,
            vfov_deg,
        }
    }
}

/// Absolute vertical vanishing point in pixel coordinates.
///
/// `scale` is signed: positive when "up" points toward `(x, y)` (the zenith
/// projects into the image plane), negative when it points away (the nadir
/// does). Zero means the example carries no vertical direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VanishingPoint {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl VanishingPoint {
    /// `(0, 0, 0)`, used by examples whose field comes from a store.
    pub const NONE: VanishingPoint = VanishingPoint {
        x: 0.0,
        y: 0.0,
        scale: 0.0,
    };

    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale }
    }

    pub fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.scale]
    }
}

/// Horizon line as fractions of image height at the left (`x = 0`) and right
/// (`x = width`) image borders. Non-finite when the horizon is undefined
/// (camera pointing straight up or down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativeHorizon {
    pub left: f64,
    pub right: f64,
}

impl RelativeHorizon {
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.right.is_finite()
    }
}

/// Vertical vanishing point as fractions of image width / height. Non-finite
/// when the vertical direction is parallel to the image plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativeVanishingPoint {
    pub x: f64,
    pub y: f64,
    /// The point is the zenith (up lies in front of the camera) rather than
    /// the nadir.
    pub zenith_ahead: bool,
}

impl RelativeVanishingPoint {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Geometry capability used to turn camera angles into a vanishing point.
/// All angles are in radians.
pub trait CameraGeometry: Send + Sync {
    fn relative_horizon(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeHorizon;

    fn relative_vanishing_point(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeVanishingPoint;

    fn absolute_vanishing_point(
        &self,
        height: usize,
        width: usize,
        horizon: &RelativeHorizon,
        vp: &RelativeVanishingPoint,
    ) -> VanishingPoint;

    fn gravity_field(&self, height: usize, width: usize, vp: &VanishingPoint) -> GravityField {
        synthesize(height, width, vp)
    }
}

/// Ideal pinhole camera with square pixels and the principal point at the
/// image center.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinholeGeometry;

struct Intrinsics {
    f: f64,
    cx: f64,
    cy: f64,
}

impl Intrinsics {
    fn new(vfov: f64, height: usize, width: usize) -> Self {
        let h = height as f64;
        Self {
            f: 0.5 * h / (0.5 * vfov).tan(),
            cx: 0.5 * width as f64,
            cy: 0.5 * h,
        }
    }
}

impl PinholeGeometry {
    /// World up axis expressed in the camera frame.
    pub fn up_in_camera(elevation: f64, roll: f64) -> Vector3<f64> {
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), -elevation);
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), roll);
        roll * pitch * Vector3::new(0.0, -1.0, 0.0)
    }

    /// Per-pixel latitude (degrees) of the viewing ray: the angle between the
    /// ray and the horizon plane, positive above the horizon.
    pub fn latitude_field(&self, pose: &CameraPose, height: usize, width: usize) -> ScalarField {
        let k = Intrinsics::new(pose.vfov_deg.to_radians(), height, width);
        let up = Self::up_in_camera(pose.pitch_deg.to_radians(), pose.roll_deg.to_radians());
        ScalarField::from_fn(width, height, |x, y| {
            let ray = Vector3::new((x as f64 - k.cx) / k.f, (y as f64 - k.cy) / k.f, 1.0);
            let s = (ray.normalize().dot(&up)).clamp(-1.0, 1.0);
            s.asin().to_degrees() as f32
        })
    }
}

impl CameraGeometry for PinholeGeometry {
    fn relative_horizon(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeHorizon {
        let k = Intrinsics::new(vfov, height, width);
        let up = Self::up_in_camera(elevation, roll);
        if up.y.abs() < PARALLEL_EPS {
            return RelativeHorizon {
                left: f64::INFINITY,
                right: f64::INFINITY,
            };
        }
        // Rays perpendicular to `up`: ux (x - cx) + uy (y - cy) + uz f = 0.
        let y_at = |x: f64| k.cy - (up.x * (x - k.cx) + up.z * k.f) / up.y;
        let h = height as f64;
        RelativeHorizon {
            left: y_at(0.0) / h,
            right: y_at(width as f64) / h,
        }
    }

    fn relative_vanishing_point(
        &self,
        elevation: f64,
        roll: f64,
        vfov: f64,
        height: usize,
        width: usize,
    ) -> RelativeVanishingPoint {
        let k = Intrinsics::new(vfov, height, width);
        let up = Self::up_in_camera(elevation, roll);
        if up.z.abs() < PARALLEL_EPS {
            return RelativeVanishingPoint {
                x: f64::INFINITY,
                y: f64::INFINITY,
                zenith_ahead: false,
            };
        }
        RelativeVanishingPoint {
            x: (k.cx + k.f * up.x / up.z) / width as f64,
            y: (k.cy + k.f * up.y / up.z) / height as f64,
            zenith_ahead: up.z > 0.0,
        }
    }

    fn absolute_vanishing_point(
        &self,
        height: usize,
        width: usize,
        horizon: &RelativeHorizon,
        vp: &RelativeVanishingPoint,
    ) -> VanishingPoint {
        let (h, w) = (height as f64, width as f64);
        if vp.is_finite() {
            // Up points toward the zenith and away from the nadir.
            let scale = if vp.zenith_ahead { 1.0 } else { -1.0 };
            return VanishingPoint::new(vp.x * w, vp.y * h, scale);
        }

        // Vertical direction parallel to the image plane: every pixel shares
        // the horizon normal, so park the point far along it.
        let along = Vector2::new(w, (horizon.right - horizon.left) * h);
        let normal = Vector2::new(along.y, -along.x);
        let normal = if normal.norm() > 0.0 {
            normal.normalize()
        } else {
            Vector2::new(0.0, -1.0)
        };
        let mid = Vector2::new(0.5 * w, 0.5 * h * (horizon.left + horizon.right));
        let far = mid + normal * FAR_VANISHING_DISTANCE;
        VanishingPoint::new(far.x, far.y, 1.0)
    }
}
