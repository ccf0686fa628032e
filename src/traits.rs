//! This module defines shared traits used across different kernels.
//!
//! The zig-zag kernel needs to move between a signed integer and the unsigned
//! integer of the same width without going through a lossy numeric cast, so the
//! pairing (and the raw bit reinterpretation) lives here.

/// Maps a signed integer type to its unsigned counterpart of the same width.
pub trait HasUnsigned: Sized {
    type Unsigned;
    /// Width of the type in bits.
    const BITS: usize;
    /// Reinterprets the two's complement bit pattern as unsigned.
    fn to_unsigned_bits(self) -> Self::Unsigned;
}

/// Maps an unsigned integer type to its signed counterpart of the same width.
pub trait HasSigned: Sized {
    type Signed;
    /// Reinterprets the bit pattern as two's complement.
    fn to_signed_bits(self) -> Self::Signed;
}

// Implement the traits for all primitive integer types.
macro_rules! impl_signed_unsigned_pair {
    ($S:ty, $U:ty) => {
        impl HasUnsigned for $S {
            type Unsigned = $U;
            const BITS: usize = <$S>::BITS as usize;
            #[inline]
            fn to_unsigned_bits(self) -> $U {
                self as $U
            }
        }
        impl HasSigned for $U {
            type Signed = $S;
            #[inline]
            fn to_signed_bits(self) -> $S {
                self as $S
            }
        }
    };
}

impl_signed_unsigned_pair!(i8, u8);
impl_signed_unsigned_pair!(i16, u16);
impl_signed_unsigned_pair!(i32, u32);
impl_signed_unsigned_pair!(i64, u64);
impl_signed_unsigned_pair!(i128, u128);
