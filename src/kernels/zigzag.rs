//! This module contains the pure, stateless kernels for Zig-zag encoding and
//! decoding.
//!
//! Zig-zag is a lossless, bitwise mapping of signed integers onto unsigned
//! integers so that values of small magnitude (positive or negative) become
//! small unsigned numbers, which the varint kernel then stores in few bytes.

use num_traits::{PrimInt, Signed, Unsigned};

use crate::traits::{HasSigned, HasUnsigned};

//==================================================================================
// 1. Generic Core Logic
//==================================================================================

/// Encodes a single signed integer using the Zig-zag algorithm.
#[inline]
pub fn encode_val<T>(n: T) -> T::Unsigned
where
    T: PrimInt + Signed + HasUnsigned,
{
    // `>>` on a signed PrimInt is arithmetic, which is what the formula needs.
    let shifted = (n << 1) ^ (n >> (T::BITS - 1));
    shifted.to_unsigned_bits()
}

/// Decodes a single unsigned integer back to its signed representation.
#[inline]
pub fn decode_val<U>(n: U) -> U::Signed
where
    U: PrimInt + Unsigned + HasSigned,
    U::Signed: PrimInt + Signed,
{
    let half = (n >> 1).to_signed_bits();
    let lsb = (n & U::one()).to_signed_bits();
    // (n >> 1) ^ -(n & 1)
    half ^ (-lsb)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
