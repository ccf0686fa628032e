// In: src/codec.rs

//! The pluggable compression layer.
//!
//! A `BlockCompressor` turns one chunk of bytes into a `CompressedBlock`, with
//! the escape policy (fall back to the original bytes when compression does not
//! help) built into its single `compress` entry point. The `StreamCompressor`
//! wraps a codec and cuts whole streams into chunks of at most `block_size`
//! bytes, each serialized behind a 3-byte little-endian header.

use std::fmt::Debug;

use crate::config::{CompressionConfig, CompressionKind};
use crate::error::OrcError;
use crate::kernels;

//==================================================================================
// 1. The Block Model
//==================================================================================

/// One compressed (or escaped) chunk of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBlock {
    pub original_length: usize,
    /// `false` whenever compression did not shrink the input.
    pub is_compressed: bool,
    pub payload: Vec<u8>,
}

impl CompressedBlock {
    pub fn compressed_length(&self) -> usize {
        self.payload.len()
    }

    fn original(bytes: &[u8]) -> Self {
        Self {
            original_length: bytes.len(),
            is_compressed: false,
            payload: bytes.to_vec(),
        }
    }

    /// The 3-byte chunk header: `(payload_len << 1) | is_original`.
    pub fn header(&self) -> [u8; 3] {
        let value = ((self.payload.len() as u32) << 1) | u32::from(!self.is_compressed);
        let le = value.to_le_bytes();
        [le[0], le[1], le[2]]
    }
}

//==================================================================================
// 2. The Codec Capability
//==================================================================================

/// A compression algorithm. Implementations are stateless and deterministic.
pub trait BlockCompressor: Send + Sync + Debug {
    fn kind(&self) -> CompressionKind;

    /// Raw compression, without the escape policy.
    fn try_compress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError>;

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError>;

    /// Compresses `input`, storing it verbatim when the result is not smaller.
    fn compress(&self, input: &[u8]) -> Result<CompressedBlock, OrcError> {
        if self.kind() == CompressionKind::None || input.is_empty() {
            return Ok(CompressedBlock::original(input));
        }
        let compressed = self.try_compress(input)?;
        if compressed.len() >= input.len() {
            return Ok(CompressedBlock::original(input));
        }
        Ok(CompressedBlock {
            original_length: input.len(),
            is_compressed: true,
            payload: compressed,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompression;

impl BlockCompressor for NoCompression {
    fn kind(&self) -> CompressionKind {
        CompressionKind::None
    }

    fn try_compress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        Ok(input.to_vec())
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        Ok(input.to_vec())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    pub level: i32,
}

impl BlockCompressor for ZlibCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zlib
    }

    fn try_compress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::deflate::encode(input, self.level)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::deflate::decode(input)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnappyCodec;

impl BlockCompressor for SnappyCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Snappy
    }

    fn try_compress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::snappy::encode(input)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::snappy::decode(input)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    pub level: i32,
}

impl BlockCompressor for ZstdCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zstd
    }

    fn try_compress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::zstd::encode(input, self.level)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, OrcError> {
        kernels::zstd::decode(input)
    }
}

/// Builds the codec described by `config`.
pub fn codec_for(config: &CompressionConfig) -> Box<dyn BlockCompressor> {
    let level = config.effective_level();
    match config.kind {
        CompressionKind::None => Box::new(NoCompression),
        CompressionKind::Zlib => Box::new(ZlibCodec {
            level: level.unwrap_or(kernels::deflate::DEFAULT_LEVEL),
        }),
        CompressionKind::Snappy => Box::new(SnappyCodec),
        CompressionKind::Zstd => Box::new(ZstdCodec {
            level: level.unwrap_or(3),
        }),
    }
}

/// Builds a codec with default settings, as needed to read back a file.
pub fn codec_for_kind(kind: CompressionKind) -> Box<dyn BlockCompressor> {
    codec_for(&CompressionConfig::new(kind))
}

//==================================================================================
// 3. Stream Framing
//==================================================================================

/// Applies a codec to whole streams, chunk by chunk.
#[derive(Debug)]
pub struct StreamCompressor {
    codec: Box<dyn BlockCompressor>,
    block_size: usize,
}

impl StreamCompressor {
    pub fn new(config: &CompressionConfig) -> Self {
        Self {
            codec: codec_for(config),
            block_size: config.block_size.max(1),
        }
    }

    pub fn kind(&self) -> CompressionKind {
        self.codec.kind()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Compresses a stream into its chunk sequence.
    pub fn compress_stream(&self, raw: &[u8]) -> Result<Vec<CompressedBlock>, OrcError> {
        raw.chunks(self.block_size)
            .map(|chunk| self.codec.compress(chunk))
            .collect()
    }

    /// Produces the on-disk bytes for a stream. With no compression the raw
    /// bytes are returned unframed.
    pub fn encode_stream(&self, raw: &[u8]) -> Result<Vec<u8>, OrcError> {
        if self.kind() == CompressionKind::None {
            return Ok(raw.to_vec());
        }
        let mut out = Vec::with_capacity(raw.len() / 2 + 3);
        for block in self.compress_stream(raw)? {
            out.extend_from_slice(&block.header());
            out.extend_from_slice(&block.payload);
        }
        Ok(out)
    }

    /// Inverse of `encode_stream`.
    pub fn decode_stream(&self, framed: &[u8]) -> Result<Vec<u8>, OrcError> {
        if self.kind() == CompressionKind::None {
            return Ok(framed.to_vec());
        }
        let mut out = Vec::new();
        let mut pos = 0;
        while pos < framed.len() {
            let header = framed.get(pos..pos + 3).ok_or_else(|| {
                OrcError::FormatError("Truncated compression chunk header".to_string())
            })?;
            let value = u32::from_le_bytes([header[0], header[1], header[2], 0]);
            let is_original = value & 1 == 1;
            let len = (value >> 1) as usize;
            pos += 3;
            let payload = framed.get(pos..pos + len).ok_or_else(|| {
                OrcError::FormatError("Truncated compression chunk payload".to_string())
            })?;
            pos += len;
            if is_original {
                out.extend_from_slice(payload);
            } else {
                out.extend(self.codec.decompress(payload)?);
            }
        }
        Ok(out)
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn compressible() -> Vec<u8> {
        b"stripe stripe stripe stripe stripe stripe stripe stripe".repeat(50)
    }

    #[test]
    fn test_escape_on_incompressible_input() {
        // Two bytes can never shrink under any codec.
        for kind in [
            CompressionKind::Zlib,
            CompressionKind::Snappy,
            CompressionKind::Zstd,
        ] {
            let block = codec_for_kind(kind).compress(&[0x01, 0x02]).unwrap();
            assert!(!block.is_compressed, "{kind:?} should escape");
            assert_eq!(block.payload, vec![0x01, 0x02]);
            assert_eq!(block.original_length, 2);
        }
    }

    #[test]
    fn test_compressible_input_shrinks() {
        let input = compressible();
        for kind in [
            CompressionKind::Zlib,
            CompressionKind::Snappy,
            CompressionKind::Zstd,
        ] {
            let codec = codec_for_kind(kind);
            let block = codec.compress(&input).unwrap();
            assert!(block.is_compressed);
            assert!(block.compressed_length() < input.len());
            assert_eq!(codec.decompress(&block.payload).unwrap(), input);
        }
    }

    #[test]
    fn test_none_is_never_compressed() {
        let block = NoCompression.compress(&compressible()).unwrap();
        assert!(!block.is_compressed);
    }

    #[test]
    fn test_header_layout() {
        let block = CompressedBlock {
            original_length: 10,
            is_compressed: false,
            payload: vec![0; 5],
        };
        assert_eq!(block.header(), [0x0B, 0x00, 0x00]);
        let block = CompressedBlock {
            original_length: 100_000,
            is_compressed: true,
            payload: vec![0; 100_000],
        };
        // 100_000 << 1 = 200_000 = 0x030D40
        assert_eq!(block.header(), [0x40, 0x0D, 0x03]);
    }

    #[test]
    fn test_stream_chunking_roundtrip() {
        let config = CompressionConfig {
            kind: CompressionKind::Zlib,
            level: None,
            block_size: 64,
        };
        let compressor = StreamCompressor::new(&config);
        let raw = compressible();
        let blocks = compressor.compress_stream(&raw).unwrap();
        assert_eq!(blocks.len(), raw.len().div_ceil(64));
        assert!(blocks.iter().all(|b| b.original_length <= 64));

        let framed = compressor.encode_stream(&raw).unwrap();
        assert_eq!(compressor.decode_stream(&framed).unwrap(), raw);
    }

    #[test]
    fn test_none_stream_is_unframed() {
        let compressor = StreamCompressor::new(&CompressionConfig::default());
        assert_eq!(compressor.encode_stream(b"abc").unwrap(), b"abc".to_vec());
    }

    #[test]
    fn test_compression_is_deterministic() {
        let compressor = StreamCompressor::new(&CompressionConfig::new(CompressionKind::Zstd));
        let raw = compressible();
        assert_eq!(
            compressor.encode_stream(&raw).unwrap(),
            compressor.encode_stream(&raw).unwrap()
        );
    }
}
