//! This module contains the kernels for zlib-family compression.
//!
//! Streams are stored as raw DEFLATE (RFC 1951) with no zlib header or
//! checksum, which is what readers of the format expect.

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::OrcError;

pub const DEFAULT_LEVEL: i32 = 6;
pub const MAX_LEVEL: i32 = 9;

/// Compresses `input_bytes` as raw deflate at `level` (0..=9).
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, OrcError> {
    let level = u32::try_from(level)
        .ok()
        .filter(|l| *l <= MAX_LEVEL as u32)
        .ok_or_else(|| OrcError::Compression(format!("invalid zlib level {level}")))?;
    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(input_bytes.len() / 2),
        Compression::new(level),
    );
    encoder
        .write_all(input_bytes)
        .map_err(|e| OrcError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| OrcError::Compression(e.to_string()))
}

pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, OrcError> {
    let mut decoder = DeflateDecoder::new(input_bytes);
    let mut output_buf = Vec::new();
    decoder
        .read_to_end(&mut output_buf)
        .map_err(|e| OrcError::Compression(e.to_string()))?;
    Ok(output_buf)
}
