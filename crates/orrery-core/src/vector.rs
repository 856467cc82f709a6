//! 2-D vector collaborator.
//!
//! The kernel works on [`glam::DVec2`]. Addition, scaling, dot products,
//! distances and magnitudes come straight from glam; the [`Coords`] extension
//! trait adds the few operations the physics code phrases differently
//! (unit vector toward another point, perpendicular by turn direction, clear
//! in place).

use serde::{Deserialize, Serialize};

/// The 2-D point/vector type used for every position, velocity,
/// acceleration and force in the kernel.
pub type Vector2 = glam::DVec2;

/// Direction of a 90 degree rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Turn {
    /// Counter-clockwise: `(x, y) -> (-y, x)`.
    Left,
    /// Clockwise: `(x, y) -> (y, -x)`.
    #[default]
    Right,
}

/// Physics-oriented helpers on top of [`Vector2`].
pub trait Coords: Sized {
    /// Unit vector pointing from `self` toward `other`.
    ///
    /// Returns the zero vector when the two points coincide, so callers that
    /// scale the result contribute nothing instead of producing NaN.
    fn unit_toward(self, other: Self) -> Self;

    /// This vector rotated by 90 degrees in the given direction.
    fn perpendicular(self, turn: Turn) -> Self;

    /// Reset to the zero vector in place.
    fn clear(&mut self);
}

impl Coords for Vector2 {
    #[inline]
    fn unit_toward(self, other: Self) -> Self {
        (other - self).normalize_or_zero()
    }

    #[inline]
    fn perpendicular(self, turn: Turn) -> Self {
        match turn {
            Turn::Left => self.perp(),
            Turn::Right => -self.perp(),
        }
    }

    #[inline]
    fn clear(&mut self) {
        *self = Vector2::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Non-finite serialization
// ---------------------------------------------------------------------------

/// Serde adapter for [`Vector2`] fields that may hold NaN or infinities.
///
/// JSON numbers cannot carry non-finite values and `serde_json` writes them
/// as `null`, which does not read back. Finite components are written as
/// plain numbers; NaN and the infinities are written as the strings `"NaN"`,
/// `"inf"` and `"-inf"`. Use with `#[serde(with = "nonfinite")]`.
pub mod nonfinite {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Vector2;

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Component {
        Number(f64),
        Text(String),
    }

    impl From<f64> for Component {
        fn from(value: f64) -> Self {
            if value.is_finite() {
                Component::Number(value)
            } else if value.is_nan() {
                Component::Text("NaN".to_owned())
            } else if value > 0.0 {
                Component::Text("inf".to_owned())
            } else {
                Component::Text("-inf".to_owned())
            }
        }
    }

    impl Component {
        fn into_f64<E: Error>(self) -> Result<f64, E> {
            match self {
                Component::Number(value) => Ok(value),
                Component::Text(text) => match text.as_str() {
                    "NaN" => Ok(f64::NAN),
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    other => Err(E::invalid_value(
                        Unexpected::Str(other),
                        &"a number, \"NaN\", \"inf\" or \"-inf\"",
                    )),
                },
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &Vector2, serializer: S) -> Result<S::Ok, S::Error> {
        [Component::from(value.x), Component::from(value.y)].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vector2, D::Error> {
        let [x, y] = <[Component; 2]>::deserialize(deserializer)?;
        Ok(Vector2::new(x.into_f64()?, y.into_f64()?))
    }

    /// The same encoding for a single `f64` field.
    pub mod scalar {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use super::Component;

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            Component::from(*value).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Component::deserialize(deserializer)?.into_f64()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
