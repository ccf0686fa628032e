//! This module is the public API for the pure, stateless encoding kernels.
//!
//! Every kernel works on plain slices and vectors, knows nothing about schemas
//! or stripes, and returns `OrcError` instead of panicking. Decoders exist so
//! that the writer's output can be verified in tests and by `format::read_tail`
//! consumers.

pub mod boolean;
pub mod byte_rle;
pub mod deflate;
pub mod dictionary;
pub mod int_rle;
pub mod leb128;
pub mod snappy;
pub mod zigzag;
pub mod zstd;
