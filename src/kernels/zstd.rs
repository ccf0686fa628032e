//! This module contains the kernels for Zstandard compression and decompression.
//!
//! Each call produces one self-contained zstd frame with no extra header. The
//! caller's block framing carries the lengths. This is a panic-free wrapper
//! around the `zstd` crate.

use std::io::Write;
use zstd::stream::{Decoder, Encoder};

use crate::error::OrcError;

pub const MIN_LEVEL: i32 = 1;
pub const MAX_LEVEL: i32 = 22;

//==================================================================================
// 1. Public API
//==================================================================================

/// Compresses `input_bytes` into a single zstd frame.
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, OrcError> {
    let mut output_buf = Vec::with_capacity(input_bytes.len() / 2);
    let mut encoder =
        Encoder::new(&mut output_buf, level).map_err(|e| OrcError::Compression(e.to_string()))?;
    encoder
        .write_all(input_bytes)
        .map_err(|e| OrcError::Compression(e.to_string()))?;
    // `finish` is essential to finalize the frame.
    encoder
        .finish()
        .map_err(|e| OrcError::Compression(e.to_string()))?;
    Ok(output_buf)
}

pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, OrcError> {
    let mut decoder =
        Decoder::new(input_bytes).map_err(|e| OrcError::Compression(e.to_string()))?;
    let mut output_buf = Vec::new();
    std::io::copy(&mut decoder, &mut output_buf)
        .map_err(|e| OrcError::Compression(e.to_string()))?;
    Ok(output_buf)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
