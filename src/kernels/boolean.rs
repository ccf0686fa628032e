//! This module contains the kernels for boolean streams (values and presence).
//!
//! Booleans are packed eight per byte, most significant bit first, with the
//! final byte zero-padded. The packed bytes are then passed through byte RLE so
//! that long constant spans (e.g. an all-present column) collapse to a few bytes.

use bitvec::prelude::*;

use super::byte_rle;
use crate::error::OrcError;

//==================================================================================
// 1. Core Logic
//==================================================================================

/// Packs booleans into bytes, MSB first.
pub fn pack(values: &[bool]) -> Vec<u8> {
    let padded_len = values.len().div_ceil(8) * 8;
    let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, padded_len);
    for (i, &v) in values.iter().enumerate() {
        if v {
            bits.set(i, true);
        }
    }
    bits.into_vec()
}

/// Unpacks the first `num_values` bits of `bytes`.
pub fn unpack(bytes: &[u8], num_values: usize) -> Result<Vec<bool>, OrcError> {
    let bits = bytes.view_bits::<Msb0>();
    if bits.len() < num_values {
        return Err(OrcError::RleDecodeError(format!(
            "Boolean stream holds {} bits, but {} values were expected",
            bits.len(),
            num_values
        )));
    }
    Ok(bits[..num_values].iter().by_vals().collect())
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Bit-packs then byte-RLE encodes a boolean sequence.
pub fn encode(values: &[bool]) -> Vec<u8> {
    byte_rle::encode(&pack(values))
}

pub fn decode(input_bytes: &[u8], num_values: usize) -> Result<Vec<bool>, OrcError> {
    let packed = byte_rle::decode(input_bytes, num_values.div_ceil(8))?;
    unpack(&packed, num_values)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
