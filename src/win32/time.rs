//! Shared BCD timestamp decoding (§4.7): `yyyy mm dd hh mi ss sss`, 16 BCD
//! digits with no sentinel nibbles, used by both the second-block header and
//! the station/hypocenter info subrecords.

use crate::error::FormatError;
use crate::win32::reader::StreamReader;

pub(crate) const TIME_NIBBLES: usize = 16;

/// Read a 16-nibble BCD timestamp and pack it into a sortable integer of
/// the form `yyyymmddhhmmssfff` (JST, millisecond precision).
pub(crate) fn read_bcd_time_millis(reader: &mut StreamReader) -> Result<u64, FormatError> {
    let digits = reader.read_bcd_nibbles(TIME_NIBBLES)?;
    for &d in &digits {
        if d > 9 {
            return Err(FormatError::InvalidBcdDigit(d));
        }
    }
    let group = |slice: &[u8]| -> u64 { slice.iter().fold(0u64, |acc, &d| acc * 10 + d as u64) };
    let year = group(&digits[0..4]);
    let month = group(&digits[4..6]);
    let day = group(&digits[6..8]);
    let hour = group(&digits[8..10]);
    let minute = group(&digits[10..12]);
    let second = group(&digits[12..14]);
    let millis = group(&digits[14..16]);

    Ok((((((year * 100 + month) * 100 + day) * 100 + hour) * 100 + minute) * 100 + second) * 1000 + millis)
}
