//! Scaled-number utility (§4.8 / §3).
//!
//! A `(mantissa, scale)` pair representing `mantissa * 10^scale`, preserving
//! the significant-digit count of a measured quantity (latitude, altitude,
//! magnitude, ...) the way BCD-encoded geodetic fields are read from WIN32.

/// `mantissa * 10^scale`.
///
/// Immutable value type. Conversion to `f64` is exact up to IEEE-754
/// rounding of the final multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScaledNumber {
    pub mantissa: i32,
    pub scale: i32,
}

impl ScaledNumber {
    pub const fn new(mantissa: i32, scale: i32) -> Self {
        Self { mantissa, scale }
    }

    /// Convert to a physical `f64` value.
    pub fn to_f64(self) -> f64 {
        self.mantissa as f64 * 10f64.powi(self.scale)
    }
}

impl From<ScaledNumber> for f64 {
    fn from(value: ScaledNumber) -> Self {
        value.to_f64()
    }
}
