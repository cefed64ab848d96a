//! Encoding of a gravity field into a training target.
//!
//! Regression keeps the continuous field in channel-first layout;
//! classification quantizes it into per-pixel direction classes.
pub mod bins;

use crate::field::{BinnedField, GravityField, PlanarField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use self::bins::{decode_bins, encode_bins, IGNORE_BIN};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("unsupported loss type `{0}` (expected `regression` or `classification`)")]
    UnsupportedLossType(String),
    #[error("classification needs at least 2 classes, got {0}")]
    InvalidClassCount(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossType {
    Regression,
    Classification,
}

impl FromStr for LossType {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regression" => Ok(LossType::Regression),
            "classification" => Ok(LossType::Classification),
            other => Err(EncodeError::UnsupportedLossType(other.to_string())),
        }
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossType::Regression => f.write_str("regression"),
            LossType::Classification => f.write_str("classification"),
        }
    }
}

/// Training target produced from a gravity field.
#[derive(Clone, Debug, PartialEq)]
pub enum GravityTarget {
    /// `(2, h, w)` f32 field
    Regression(PlanarField),
    /// `(1, h, w)` class indices
    Classification(BinnedField),
}

impl GravityTarget {
    pub fn shape(&self) -> [usize; 3] {
        match self {
            GravityTarget::Regression(p) => p.shape(),
            GravityTarget::Classification(b) => b.shape(),
        }
    }

    pub fn loss_type(&self) -> LossType {
        match self {
            GravityTarget::Regression(_) => LossType::Regression,
            GravityTarget::Classification(_) => LossType::Classification,
        }
    }
}

/// Encodes `field` according to `loss_type`.
///
/// The loss type is parsed here so an unknown value surfaces at encode time.
pub fn encode_field(
    field: &GravityField,
    loss_type: &str,
    num_classes: usize,
) -> Result<GravityTarget, EncodeError> {
    match loss_type.parse::<LossType>()? {
        LossType::Regression => Ok(GravityTarget::Regression(PlanarField::from(field))),
        LossType::Classification => Ok(GravityTarget::Classification(encode_bins(
            field,
            num_classes,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::synthesize;
    use crate::geometry::VanishingPoint;

    #[test]
    fn regression_is_identity_up_to_layout() {
        let field = synthesize(5, 7, &VanishingPoint::new(2.5, -30.0, -1.0));
        let target = encode_field(&field, "regression", 72).expect("encode");
        let GravityTarget::Regression(planar) = target else {
            panic!("expected regression target");
        };
        assert_eq!(planar.shape(), [2, 5, 7]);
        for y in 0..5 {
            for x in 0..7 {
                let v = field.get(x, y);
                assert_eq!(planar.get(0, x, y), v[0]);
                assert_eq!(planar.get(1, x, y), v[1]);
            }
        }
    }

    #[test]
    fn classification_produces_single_channel() {
        let field = synthesize(4, 6, &VanishingPoint::new(3.0, 100.0, 1.0));
        let target = encode_field(&field, "classification", 36).expect("encode");
        assert_eq!(target.shape(), [1, 4, 6]);
        assert_eq!(target.loss_type(), LossType::Classification);
    }

    #[test]
    fn unknown_loss_type_is_rejected() {
        let field = GravityField::new(2, 2);
        assert_eq!(
            encode_field(&field, "focal", 36).unwrap_err(),
            EncodeError::UnsupportedLossType("focal".to_string())
        );
    }
}
