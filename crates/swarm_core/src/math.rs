//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation state uses fixed-point arithmetic so that identical
//! inputs produce bit-identical results on every platform. Frame deltas,
//! rates and positions are all [`Fixed`].

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

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

/// Human-readable serde support for fixed-point numbers.
///
/// Config files are hand-edited, so tuning values are written as decimals
/// (`speed: 60.0`) and converted on load. Not used for simulation state.
pub mod decimal_serde {
    use super::Fixed;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] once the true value no longer fits.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        self.offset_from(other).dot(self.offset_from(other))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        self.offset_from(other).length()
    }

    /// Check whether `other` lies within `range` (inclusive).
    ///
    /// Compares exact squares while they fit, falling back to lengths for
    /// map-scale distances.
    #[must_use]
    pub fn within(self, other: Self, range: Fixed) -> bool {
        if range < Fixed::ZERO {
            return false;
        }
        let delta = self.offset_from(other);
        let squared = delta
            .x
            .checked_mul(delta.x)
            .zip(delta.y.checked_mul(delta.y))
            .and_then(|(xx, yy)| xx.checked_add(yy));
        match (squared, range.checked_mul(range)) {
            (Some(d), Some(limit)) => d <= limit,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => delta.length() <= range,
        }
    }

    /// Dot product of two vectors, saturating.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Vector length.
    ///
    /// Large vectors are scaled down before squaring so the result stays
    /// exact up to [`Fixed::MAX`].
    #[must_use]
    pub fn length(self) -> Fixed {
        let largest = self.x.saturating_abs().max(self.y.saturating_abs());
        if largest <= Fixed::ONE {
            return fixed_sqrt(self.dot(self));
        }
        let unit = Self::new(self.x / largest, self.y / largest);
        largest.saturating_mul(fixed_sqrt(unit.dot(unit)))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Check whether this is the zero vector.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == Fixed::ZERO && self.y == Fixed::ZERO
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let largest = self.x.saturating_abs().max(self.y.saturating_abs());
        if largest == Fixed::ZERO {
            return Self::ZERO;
        }
        // Bring components into [-1, 1] first so squaring cannot overflow.
        let unit = Self::new(self.x / largest, self.y / largest);
        let len = fixed_sqrt(unit.dot(unit));
        Self::new(unit.x / len, unit.y / len)
    }

    fn offset_from(self, other: Self) -> Self {
        Self::new(self.x.saturating_sub(other.x), self.y.saturating_sub(other.y))
    }

    /// Wrap coordinates onto a toroidal map of the given size.
    ///
    /// Uses Euclidean remainder, so the result is always in
    /// `[0, width) × [0, height)` even for negative inputs.
    #[must_use]
    pub fn wrap(self, width: Fixed, height: Fixed) -> Self {
        Self::new(wrap_coordinate(self.x, width), wrap_coordinate(self.y, height))
    }
}

/// Wrap a single coordinate into `[0, bound)`.
///
/// Non-positive bounds leave the value untouched; config validation
/// rejects them before a simulation is built.
#[must_use]
pub fn wrap_coordinate(value: Fixed, bound: Fixed) -> Fixed {
    if bound <= Fixed::ZERO {
        return value;
    }
    value.rem_euclid(bound)
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    // `high` only stays an exact root when value <= 1
    if high.saturating_mul(high) <= value {
        high
    } else {
        low
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}
