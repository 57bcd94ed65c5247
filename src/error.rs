//! Error types for the WIN32 decoder.
//!
//! The DSP pipeline (biquad cascade, Shindo filter, LPGM calculator, bleeding
//! delay line) never fails at runtime once validly constructed: malformed
//! constructor arguments are programmer errors and panic eagerly via
//! `assert!` in the constructor instead of going through this type (see
//! §7 of the design notes). Only the WIN32 decoder, which parses untrusted
//! bytes, needs a recoverable error type.

use thiserror::Error;

/// A malformed Kyoshin WIN32 container.
///
/// Surfaced to the caller unmodified; the decoder never attempts to
/// resynchronize after a structural mismatch.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The leading magic bytes did not match `0x0A 0x02`.
    #[error("bad magic bytes: expected 0x0A 0x02, got {0:#04x} {1:#04x}")]
    BadMagic(u8, u8),

    /// The info block's own marker byte did not match `0x0C`.
    #[error("bad info block marker: expected 0x0C, got {0:#04x}")]
    InvalidInfoBlockMarker(u8),

    /// An info-block subrecord's cumulative length does not reconcile with
    /// the enclosing info block's declared length.
    #[error("info block length mismatch: declared {declared}, consumed {consumed}")]
    InfoLengthMismatch { declared: u32, consumed: u32 },

    /// A channel record's differential pack mode nibble was not in `0..=4`.
    #[error("unknown waveform pack mode {0}")]
    UnknownPackMode(u8),

    /// A BCD digit nibble fell in `0xA..=0xF` where a decimal digit was
    /// expected, and was not one of the recognized sentinels (`0xB`
    /// absent, `0xC`/`0xD` sign, `0xE` mantissa terminator).
    #[error("invalid BCD digit nibble {0:#03x}")]
    InvalidBcdDigit(u8),

    /// The byte stream ended before a structurally required field was
    /// fully read.
    #[error("unexpected end of stream")]
    UnexpectedEof(#[from] std::io::Error),

    /// A decoded calibration field (gain, scale denominator) that must be
    /// nonzero to make `to_physical` well-defined was zero.
    #[error("invalid calibration field {field}: {value} must be nonzero")]
    InvalidCalibration { field: &'static str, value: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_magic_message_includes_observed_bytes() {
        let err = FormatError::BadMagic(0x00, 0xFF);
        assert_eq!(
            err.to_string(),
            "bad magic bytes: expected 0x0A 0x02, got 0x00 0xff"
        );
    }

    #[test]
    fn invalid_info_block_marker_message_includes_observed_byte() {
        let err = FormatError::InvalidInfoBlockMarker(0x01);
        assert_eq!(err.to_string(), "bad info block marker: expected 0x0C, got 0x01");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let format_err: FormatError = io_err.into();
        assert!(matches!(format_err, FormatError::UnexpectedEof(_)));
    }
}
