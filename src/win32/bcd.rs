//! BCD (binary-coded decimal) field decoding (§4.7).
//!
//! WIN32 packs geodetic and temporal fields as one decimal digit per nibble,
//! MSB-first, with a handful of sentinel nibbles standing in for "absent",
//! a sign, or an early mantissa terminator.

use crate::error::FormatError;
use crate::scaled_number::ScaledNumber;

/// Sentinel nibble meaning "this field has no value".
const ABSENT: u8 = 0xB;
/// Sentinel nibbles used as an explicit sign digit (altitude fields).
const SIGN_POSITIVE: u8 = 0xC;
const SIGN_NEGATIVE: u8 = 0xD;
/// Sentinel nibble that ends the mantissa early; remaining nibbles in the
/// field are padding and are not validated.
const MANTISSA_END: u8 = 0xE;

/// Split a byte slice into its nibbles, high nibble of each byte first.
pub fn nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        out.push(byte >> 4);
        out.push(byte & 0x0F);
    }
    out
}

/// Decode a fixed-width BCD field into a [`ScaledNumber`], or `None` if the
/// field's leading nibble is the absent sentinel.
///
/// `total_nibbles` is the field's full width (including an optional leading
/// sign nibble); `integer_digits` is how many of the digit positions
/// (following the sign nibble, if any) belong to the integer part: the
/// rest are fractional. A [`MANTISSA_END`] nibble truncates the mantissa at
/// that digit position; nibbles after it are not inspected.
pub fn decode_scaled_number(
    nibbles: &[u8],
    integer_digits: usize,
    signed: bool,
) -> Result<Option<ScaledNumber>, FormatError> {
    if nibbles.is_empty() {
        return Err(FormatError::UnexpectedEof(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty BCD field",
        )));
    }

    if nibbles[0] == ABSENT {
        return Ok(None);
    }

    let mut idx = 0;
    let mut sign: i64 = 1;
    if signed {
        sign = match nibbles[0] {
            SIGN_POSITIVE => 1,
            SIGN_NEGATIVE => -1,
            other => return Err(FormatError::InvalidBcdDigit(other)),
        };
        idx = 1;
    }

    let mut mantissa: i64 = 0;
    let mut digits_read = 0usize;
    let mut terminated = false;

    for &nibble in &nibbles[idx..] {
        if terminated {
            continue;
        }
        if nibble == MANTISSA_END {
            terminated = true;
            continue;
        }
        if nibble > 9 {
            return Err(FormatError::InvalidBcdDigit(nibble));
        }
        mantissa = mantissa * 10 + nibble as i64;
        digits_read += 1;
    }

    let fractional_read = digits_read.saturating_sub(integer_digits);
    let scale = -(fractional_read as i32);

    Ok(Some(ScaledNumber::new((mantissa * sign) as i32, scale)))
}

/// Undo the "negative = positive + wrap" coordinate convention (`wrap` is
/// 90 for latitude, 180 for longitude).
pub fn decode_coordinate(raw: f64, wrap: f64) -> f64 {
    if raw > wrap {
        wrap - raw
    } else {
        raw
    }
}
