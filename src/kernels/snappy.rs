//! This module contains the kernels for Snappy compression.
//!
//! Uses the raw (unframed) Snappy block format from the `snap` crate. Snappy
//! has no tunable level.

use snap::raw::{Decoder, Encoder};

use crate::error::OrcError;

pub fn encode(input_bytes: &[u8]) -> Result<Vec<u8>, OrcError> {
    Encoder::new()
        .compress_vec(input_bytes)
        .map_err(|e| OrcError::Compression(e.to_string()))
}

pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, OrcError> {
    Decoder::new()
        .decompress_vec(input_bytes)
        .map_err(|e| OrcError::Compression(e.to_string()))
}
