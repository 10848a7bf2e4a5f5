//! WBXML multi-byte unsigned integers (mb_u_int32).
//!
//! Big-endian groups of 7 bits, continuation flagged by the high bit of
//! every byte except the last.

use crate::{Result, WbxmlError};
use std::io::{self, Write};

/// A u32 never needs more than 5 groups
pub const MAX_BYTES: usize = 5;

/// Encode a u32, most significant group first
pub fn encode(value: u32) -> Vec<u8> {
    let mut groups = [0u8; MAX_BYTES];
    let mut count = 0;
    let mut rest = value;

    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    let mut out = Vec::with_capacity(count);
    for i in (1..count).rev() {
        out.push(groups[i] | 0x80);
    }
    out.push(groups[0]);
    out
}

pub fn write<W: Write>(out: &mut W, value: u32) -> io::Result<()> {
    out.write_all(&encode(value))
}

/// Decode from a byte source.
///
/// `next_byte` is asked for one byte at a time so the caller keeps control
/// of how bytes are read (and what happens at end of stream). Fails with a
/// format error once a sixth byte would be needed.
pub fn decode<F>(mut next_byte: F) -> Result<u32>
where
    F: FnMut() -> Result<u8>,
{
    let mut result: u32 = 0;
    let mut num_bytes = 0;

    loop {
        num_bytes += 1;
        if num_bytes > MAX_BYTES {
            return Err(WbxmlError::Format(
                "Invalid integer encoding, too many bytes".to_string(),
            ));
        }
        let byte = next_byte()?;
        result = (result << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
}

/// Decode from the front of a slice, returning the value and bytes consumed
pub fn decode_slice(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut iter = bytes.iter();
    let mut consumed = 0;
    let value = decode(|| {
        let byte = iter
            .next()
            .copied()
            .ok_or_else(|| WbxmlError::UnexpectedEof("multi-byte integer".to_string()))?;
        consumed += 1;
        Ok(byte)
    })?;
    Ok((value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(106), vec![0x6A]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x81, 0x00]);
        assert_eq!(encode(0xA0), vec![0x81, 0x20]);
        assert_eq!(encode(16383), vec![0xFF, 0x7F]);
        assert_eq!(encode(16384), vec![0x81, 0x80, 0x00]);
        assert_eq!(encode(u32::MAX), vec![0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_boundary_roundtrip() {
        for value in [0u32, 127, 128, 16383, 16384, u32::MAX] {
            let encoded = encode(value);
            let (decoded, consumed) = decode_slice(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_write_matches_encode() {
        let mut out = Vec::new();
        write(&mut out, 300).unwrap();
        assert_eq!(out, encode(300));
    }

    #[test]
    fn test_decode_stops_at_last_group() {
        let (value, consumed) = decode_slice(&[0x03, 0x11, 0x22]).unwrap();
        assert_eq!(value, 3);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_decode_too_long() {
        let result = decode_slice(&[0x81, 0x82, 0x83, 0x84, 0x85, 0x06]);
        assert!(matches!(result, Err(WbxmlError::Format(_))));
    }

    #[test]
    fn test_decode_truncated() {
        let result = decode_slice(&[0x81, 0x82]);
        assert!(matches!(result, Err(WbxmlError::UnexpectedEof(_))));
    }
}
