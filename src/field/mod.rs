//! Dense per-pixel fields: the channel-last gravity field, scalar maps such
//! as latitude, and the channel-first training targets derived from them.

pub mod gravity;
pub mod planar;
pub mod scalar;
pub mod traits;

pub use self::gravity::{synthesize, GravityField};
pub use self::planar::{BinnedField, PlanarField};
pub use self::scalar::ScalarField;
pub use self::traits::{FieldView, Rows};
