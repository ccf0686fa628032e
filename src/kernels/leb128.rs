//! This module contains the pure, stateless kernels for performing LEB128
//! (Little-Endian Base 128) variable-length integer encoding and decoding.
//!
//! This is the "varint" used by every integer-bearing stream in the file: seven
//! payload bits per byte, high bit set on every byte except the last. Signed
//! values go through the zig-zag kernel first. It is fully panic-free.

use num_traits::{PrimInt, Unsigned};
use std::io::Cursor;

use super::zigzag;
use crate::error::OrcError;

//==================================================================================
// 1. Public API for Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into a LEB128 byte sequence, writing to a buffer.
/// This is the primary public function for single-value encoding.
pub fn encode_one<T>(value: T, buffer: &mut Vec<u8>) -> Result<(), OrcError>
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let seven_bit_mask = T::from(0x7F).ok_or_else(|| {
        OrcError::InternalError("Failed to create 7-bit mask for type".to_string())
    })?;

    let mut current_value = value;
    loop {
        let low_bits = (current_value & seven_bit_mask).to_u8().ok_or_else(|| {
            OrcError::InternalError("Failed to convert generic integer to u8".to_string())
        })?;
        current_value = current_value >> 7;

        if current_value == zero {
            buffer.push(low_bits);
            return Ok(());
        }
        buffer.push(low_bits | 0x80);
    }
}

/// Zig-zags a signed 64-bit value and appends it as a varint.
#[inline]
pub fn encode_signed(value: i64, buffer: &mut Vec<u8>) -> Result<(), OrcError> {
    encode_one(zigzag::encode_val(value), buffer)
}

/// Zig-zags a signed 128-bit value (decimal mantissas) and appends it as a varint.
#[inline]
pub fn encode_signed_wide(value: i128, buffer: &mut Vec<u8>) -> Result<(), OrcError> {
    encode_one(zigzag::encode_val(value), buffer)
}

/// Decodes a single unsigned integer from a LEB128 byte stream cursor.
/// This is the primary public function for single-value decoding.
pub fn decode_one<T>(cursor: &mut Cursor<&[u8]>) -> Result<T, OrcError>
where
    T: PrimInt + Unsigned,
{
    let mut result = T::zero();
    let mut shift = 0;
    let total_bits = std::mem::size_of::<T>() * 8;

    loop {
        let pos = cursor.position() as usize;
        let byte = *cursor
            .get_ref()
            .get(pos)
            .ok_or_else(|| OrcError::Leb128DecodeError("Unexpected end of buffer".to_string()))?;
        cursor.set_position((pos + 1) as u64);

        // Check if adding these 7 bits would overflow the type's capacity.
        if shift >= total_bits {
            return Err(OrcError::Leb128DecodeError(
                "Integer overflow during decoding".to_string(),
            ));
        }

        let seven_bit_payload = T::from(byte & 0x7F).ok_or_else(|| {
            OrcError::Leb128DecodeError("Failed to create 7-bit payload from byte".to_string())
        })?;
        result = result | (seven_bit_payload << shift);

        if byte & 0x80 == 0 {
            // The last byte may not set bits beyond the type's width.
            if shift + 7 > total_bits && (byte >> (total_bits - shift)) > 0 {
                return Err(OrcError::Leb128DecodeError(
                    "Integer overflow during decoding".to_string(),
                ));
            }
            return Ok(result);
        }

        shift += 7;
    }
}

/// Reads one varint and undoes the zig-zag mapping.
#[inline]
pub fn decode_signed(cursor: &mut Cursor<&[u8]>) -> Result<i64, OrcError> {
    decode_one::<u64>(cursor).map(zigzag::decode_val)
}

/// Reads one wide varint and undoes the zig-zag mapping.
#[inline]
pub fn decode_signed_wide(cursor: &mut Cursor<&[u8]>) -> Result<i128, OrcError> {
    decode_one::<u128>(cursor).map(zigzag::decode_val)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        let mut buf = Vec::new();
        encode_one(0u64, &mut buf).unwrap();
        encode_one(127u64, &mut buf).unwrap();
        encode_one(128u64, &mut buf).unwrap();
        encode_one(624485u64, &mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x7F, 0x80, 0x01, 0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn test_signed_roundtrip() {
        let original = [0i64, -1, 1, -64, 64, i64::MIN, i64::MAX];
        let mut buf = Vec::new();
        for &v in &original {
            encode_signed(v, &mut buf).unwrap();
        }
        let mut cursor = Cursor::new(buf.as_slice());
        let decoded: Vec<i64> = original
            .iter()
            .map(|_| decode_signed(&mut cursor).unwrap())
            .collect();
        assert_eq!(decoded, original);
        assert_eq!(cursor.position() as usize, buf.len());
    }

    #[test]
    fn test_wide_roundtrip() {
        let mut buf = Vec::new();
        encode_signed_wide(i128::MIN, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(decode_signed_wide(&mut cursor).unwrap(), i128::MIN);
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let truncated = [0xE5u8, 0x8E];
        let mut cursor = Cursor::new(&truncated[..]);
        let err = decode_one::<u64>(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("Unexpected end of buffer"));
    }

    #[test]
    fn test_decode_overflow_error() {
        // This represents a value larger than u64::MAX
        let encoded = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut cursor = Cursor::new(&encoded[..]);
        let result = decode_one::<u64>(&mut cursor);
        match result {
            Err(OrcError::Leb128DecodeError(msg)) => assert!(msg.contains("overflow")),
            other => panic!("Expected Leb128DecodeError, got {:?}", other),
        }
    }
}
