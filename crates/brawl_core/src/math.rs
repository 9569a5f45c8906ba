//! Fixed-point math for playback cursors and animation offsets.
//!
//! The simulation itself is pure integer arithmetic. The only continuous
//! quantities in the core are the playback cursor (a position along the
//! timeline) and the per-unit animation offsets that the replay layer
//! resets to neutral. Both use fixed-point so that scrubbing to the same
//! position always lands on the same entry on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for cursor and animation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Transient presentation offset applied on top of a unit's slot.
///
/// Animations push units around (lunges, knock-backs, tilts). Between
/// events the replay layer snaps these back to [`AnimOffset::NEUTRAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AnimOffset {
    /// Horizontal displacement.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Vertical displacement.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Rotation in radians.
    #[serde(with = "fixed_serde")]
    pub rotation: Fixed,
}

impl AnimOffset {
    /// No displacement, no rotation.
    pub const NEUTRAL: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        rotation: Fixed::ZERO,
    };

    /// Create a new offset.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, rotation: Fixed) -> Self {
        Self { x, y, rotation }
    }

    /// Whether this offset is neutral.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Linearly interpolate between two offsets.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            rotation: self.rotation + (other.rotation - self.rotation) * t,
        }
    }
}

/// Split a non-negative position into its floor and fractional part.
///
/// Negative positions clamp to `(0, 0)`.
#[must_use]
pub fn split_position(position: Fixed) -> (usize, Fixed) {
    if position <= Fixed::ZERO {
        return (0, Fixed::ZERO);
    }
    let floor = position.floor();
    (floor.to_num::<usize>(), position - floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_position() {
        let (index, frac) = split_position(Fixed::from_num(3.25));
        assert_eq!(index, 3);
        assert_eq!(frac, Fixed::from_num(0.25));
    }

    #[test]
    fn test_split_position_whole_number() {
        let (index, frac) = split_position(Fixed::from_num(7));
        assert_eq!(index, 7);
        assert_eq!(frac, Fixed::ZERO);
    }

    #[test]
    fn test_split_negative_clamps() {
        assert_eq!(split_position(Fixed::from_num(-2.5)), (0, Fixed::ZERO));
    }

    #[test]
    fn test_offset_lerp() {
        let a = AnimOffset::NEUTRAL;
        let b = AnimOffset::new(Fixed::from_num(10), Fixed::from_num(-20), Fixed::from_num(1));
        let mid = a.lerp(b, Fixed::from_num(0.5));
        assert_eq!(
            mid,
            AnimOffset::new(Fixed::from_num(5), Fixed::from_num(-10), Fixed::from_num(0.5))
        );
        assert!(!mid.is_neutral());
        assert!(a.is_neutral());
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
