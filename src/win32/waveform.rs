//! Differential-packed waveform codec (§4.7).
//!
//! A channel record carries one `i32` first-sample value followed by
//! `sampleCount - 1` differential deltas, packed in one of five byte
//! widths selected by the high nibble of the channel's `sampleMeta` field.
//! Reconstruction is a running sum: `samples[i] = samples[i-1] + delta[i-1]`.

use crate::error::FormatError;
use crate::win32::reader::StreamReader;

/// Sign-extend a 4-bit nibble (`0..15`) to `i32` two's-complement.
fn sign_extend4(nibble: u8) -> i32 {
    let n = (nibble & 0x0F) as i32;
    if n & 0x08 != 0 {
        n - 16
    } else {
        n
    }
}

/// Read `diff_count` pack-mode-0 nibble deltas: two per byte, high nibble
/// first. When `diff_count` is odd the final byte's low nibble is unused.
fn read_nibble_deltas(reader: &mut StreamReader, diff_count: usize) -> Result<Vec<i32>, FormatError> {
    let byte_count = diff_count.div_ceil(2);
    let bytes = reader.read_bytes(byte_count)?;
    let mut out = Vec::with_capacity(diff_count);
    for &byte in bytes {
        out.push(sign_extend4(byte >> 4));
        if out.len() < diff_count {
            out.push(sign_extend4(byte & 0x0F));
        }
    }
    Ok(out)
}

fn read_deltas(reader: &mut StreamReader, pack_mode: u8, diff_count: usize) -> Result<Vec<i32>, FormatError> {
    match pack_mode {
        0 => read_nibble_deltas(reader, diff_count),
        1 => (0..diff_count).map(|_| reader.read_u8().map(|b| b as i8 as i32)).collect(),
        2 => (0..diff_count).map(|_| reader.read_i16().map(i32::from)).collect(),
        3 => (0..diff_count).map(|_| reader.read_i24()).collect(),
        4 => (0..diff_count).map(|_| reader.read_i32()).collect(),
        other => Err(FormatError::UnknownPackMode(other)),
    }
}

/// Decode a full channel waveform: `first_value` plus `sample_count - 1`
/// differential deltas read from `reader` in the given `pack_mode`.
pub(crate) fn read_samples(
    reader: &mut StreamReader,
    pack_mode: u8,
    sample_count: usize,
    first_value: i32,
) -> Result<Vec<i32>, FormatError> {
    let mut samples = Vec::with_capacity(sample_count);
    samples.push(first_value);
    if sample_count <= 1 {
        return Ok(samples);
    }

    let diff_count = sample_count - 1;
    let deltas = read_deltas(reader, pack_mode, diff_count)?;
    let mut prev = first_value;
    for delta in deltas {
        let next = prev.wrapping_add(delta);
        samples.push(next);
        prev = next;
    }
    Ok(samples)
}

/// Number of bytes pack mode `m` occupies for `diff_count` deltas. Used by
/// the test-only encoder below to size its output buffer.
#[cfg(test)]
fn packed_byte_len(pack_mode: u8, diff_count: usize) -> usize {
    match pack_mode {
        0 => diff_count.div_ceil(2),
        1 => diff_count,
        2 => diff_count * 2,
        3 => diff_count * 3,
        4 => diff_count * 4,
        _ => 0,
    }
}

/// Encode a sequence of deltas in the given pack mode. Used only by tests
/// to build synthetic channel records and to exercise the round-trip
/// property required by §8.
#[cfg(test)]
pub(crate) fn encode_deltas(pack_mode: u8, deltas: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_byte_len(pack_mode, deltas.len()));
    match pack_mode {
        0 => {
            let mut iter = deltas.iter();
            loop {
                let Some(&high) = iter.next() else { break };
                let low = iter.next().copied().unwrap_or(0);
                out.push((((high as i8 as u8) & 0x0F) << 4) | ((low as i8 as u8) & 0x0F));
            }
        }
        1 => {
            for &d in deltas {
                out.push(d as i8 as u8);
            }
        }
        2 => {
            for &d in deltas {
                out.extend_from_slice(&(d as i16).to_be_bytes());
            }
        }
        3 => {
            for &d in deltas {
                let bytes = d.to_be_bytes();
                out.extend_from_slice(&bytes[1..4]);
            }
        }
        4 => {
            for &d in deltas {
                out.extend_from_slice(&d.to_be_bytes());
            }
        }
        _ => panic!("unsupported pack mode in test encoder"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_scenario_pack_mode_zero() {
        // first=1000, diffCount=3, bytes 0x12 0x3F: deltas [1, 2, 3] per the
        // literal §4.7 rule (high nibble first, last byte's low nibble
        // unused because only one odd delta remains).
        let bytes = [0x12, 0x3F];
        let mut reader = StreamReader::new(&bytes);
        let samples = read_samples(&mut reader, 0, 4, 1000).unwrap();
        assert_eq!(samples, vec![1000, 1001, 1003, 1006]);
    }

    #[test]
    fn unknown_pack_mode_is_rejected() {
        let bytes = [0u8; 8];
        let mut reader = StreamReader::new(&bytes);
        assert!(matches!(
            read_samples(&mut reader, 5, 4, 0),
            Err(FormatError::UnknownPackMode(5))
        ));
    }

    #[test]
    fn single_sample_record_reads_no_deltas() {
        let bytes: [u8; 0] = [];
        let mut reader = StreamReader::new(&bytes);
        let samples = read_samples(&mut reader, 2, 1, 42).unwrap();
        assert_eq!(samples, vec![42]);
    }

    fn round_trip_for_mode(pack_mode: u8, deltas: &[i32], first: i32) {
        let encoded = encode_deltas(pack_mode, deltas);
        let mut reader = StreamReader::new(&encoded);
        let samples = read_samples(&mut reader, pack_mode, deltas.len() + 1, first).unwrap();

        let mut expected = Vec::with_capacity(deltas.len() + 1);
        expected.push(first);
        let mut prev = first;
        for &d in deltas {
            prev = prev.wrapping_add(d);
            expected.push(prev);
        }
        assert_eq!(samples, expected);
    }

    #[test]
    fn round_trips_within_each_pack_modes_dynamic_range() {
        round_trip_for_mode(0, &[-8, 7, -1, 3, 0, -8, 7], 100);
        round_trip_for_mode(1, &[-128, 127, 0, -1, 64], 1000);
        round_trip_for_mode(2, &[-32768, 32767, 0, 12345], 50_000);
        round_trip_for_mode(3, &[-8_388_608, 8_388_607, 0, 123_456], -200_000);
        round_trip_for_mode(4, &[i32::MIN, i32::MAX, 0, 42], 7);
    }

    #[test]
    fn nibble_packing_handles_even_and_odd_counts() {
        round_trip_for_mode(0, &[1, -1, 2, -2], 10);
        round_trip_for_mode(0, &[1, -1, 2], 10);
    }
}
