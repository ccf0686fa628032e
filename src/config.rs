// In: src/config.rs

//! The single source of truth for all writer configuration.
//!
//! `WriterConfig` is created once at the application boundary (in code, or from
//! a JSON document) and handed to `Writer::new`, which validates it and keeps
//! its own copy for the lifetime of the file.

use serde::{Deserialize, Serialize};

use crate::error::OrcError;

//==================================================================================
// I. Compression Settings
//==================================================================================

/// Largest compression chunk the 3-byte chunk header can describe.
pub const MAX_BLOCK_SIZE: usize = (1 << 23) - 1;

/// The codec applied to every stream and footer in the file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    /// **Default:** streams are stored verbatim, without chunk headers.
    #[default]
    None,
    /// Raw DEFLATE, levels 0..=9.
    Zlib,
    /// Raw Snappy blocks. Has no level.
    Snappy,
    /// Zstandard frames, levels 1..=22.
    Zstd,
}

impl CompressionKind {
    /// The id written into the postscript.
    pub fn id(self) -> u8 {
        match self {
            CompressionKind::None => 0,
            CompressionKind::Zlib => 1,
            CompressionKind::Snappy => 2,
            CompressionKind::Zstd => 5,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, OrcError> {
        match id {
            0 => Ok(CompressionKind::None),
            1 => Ok(CompressionKind::Zlib),
            2 => Ok(CompressionKind::Snappy),
            5 => Ok(CompressionKind::Zstd),
            other => Err(OrcError::FormatError(format!(
                "Unknown compression kind id {other}"
            ))),
        }
    }

    /// The level used when none is configured.
    pub fn default_level(self) -> Option<i32> {
        match self {
            CompressionKind::Zlib => Some(crate::kernels::deflate::DEFAULT_LEVEL),
            CompressionKind::Zstd => Some(3),
            CompressionKind::None | CompressionKind::Snappy => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CompressionConfig {
    #[serde(default)]
    pub kind: CompressionKind,

    /// Codec level. `None` selects the codec's default.
    #[serde(default)]
    pub level: Option<i32>,

    /// Maximum uncompressed bytes per compression chunk.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            kind: CompressionKind::default(),
            level: None,
            block_size: default_block_size(),
        }
    }
}

impl CompressionConfig {
    pub fn new(kind: CompressionKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// The configured level, falling back to the codec's default.
    pub fn effective_level(&self) -> Option<i32> {
        self.level.or_else(|| self.kind.default_level())
    }

    pub fn validate(&self) -> Result<(), OrcError> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(OrcError::Config(format!(
                "compression block_size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        let Some(level) = self.level else {
            return Ok(());
        };
        let range = match self.kind {
            CompressionKind::Zlib => 0..=crate::kernels::deflate::MAX_LEVEL,
            CompressionKind::Zstd => {
                crate::kernels::zstd::MIN_LEVEL..=crate::kernels::zstd::MAX_LEVEL
            }
            CompressionKind::None | CompressionKind::Snappy => {
                return Err(OrcError::Config(format!(
                    "compression kind {:?} does not take a level",
                    self.kind
                )))
            }
        };
        if !range.contains(&level) {
            return Err(OrcError::Config(format!(
                "{:?} level must be in {}..={}, got {level}",
                self.kind,
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }
}

//==================================================================================
// II. The Unified WriterConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct WriterConfig {
    /// **The number of rows at which a stripe is flushed.**
    #[serde(default = "default_stripe_rows")]
    pub stripe_rows: u64,

    /// A stripe is flushed once its buffered byte estimate exceeds this.
    #[serde(default = "default_stripe_bytes")]
    pub stripe_bytes: u64,

    /// String columns use a dictionary when `distinct / non_null` is strictly
    /// below this ratio.
    #[serde(default = "default_dictionary_threshold")]
    pub dictionary_threshold: f64,

    #[serde(default)]
    pub compression: CompressionConfig,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            stripe_rows: default_stripe_rows(),
            stripe_bytes: default_stripe_bytes(),
            dictionary_threshold: default_dictionary_threshold(),
            compression: CompressionConfig::default(),
        }
    }
}

impl WriterConfig {
    /// Parses a JSON document; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, OrcError> {
        let config: WriterConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_stripe_rows(mut self, rows: u64) -> Self {
        self.stripe_rows = rows;
        self
    }

    pub fn with_stripe_bytes(mut self, bytes: u64) -> Self {
        self.stripe_bytes = bytes;
        self
    }

    pub fn with_dictionary_threshold(mut self, threshold: f64) -> Self {
        self.dictionary_threshold = threshold;
        self
    }

    pub fn with_compression(mut self, kind: CompressionKind) -> Self {
        self.compression.kind = kind;
        self
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression.level = Some(level);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.compression.block_size = block_size;
        self
    }

    pub fn validate(&self) -> Result<(), OrcError> {
        if self.stripe_rows == 0 {
            return Err(OrcError::Config("stripe_rows must be positive".to_string()));
        }
        if self.stripe_bytes == 0 {
            return Err(OrcError::Config("stripe_bytes must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.dictionary_threshold) {
            return Err(OrcError::Config(format!(
                "dictionary_threshold must be in [0, 1], got {}",
                self.dictionary_threshold
            )));
        }
        self.compression.validate()
    }
}

/// Helper for `serde` to provide a default for `stripe_rows`.
fn default_stripe_rows() -> u64 {
    100_000
}

fn default_stripe_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_dictionary_threshold() -> f64 {
    0.8
}

fn default_block_size() -> usize {
    256 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.stripe_rows, 100_000);
        assert_eq!(config.stripe_bytes, 64 * 1024 * 1024);
        assert_eq!(config.dictionary_threshold, 0.8);
        assert_eq!(config.compression.kind, CompressionKind::None);
        assert_eq!(config.compression.block_size, 256 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            WriterConfig::from_json(r#"{"stripe_rows": 2, "compression": {"kind": "zlib"}}"#)
                .unwrap();
        assert_eq!(config.stripe_rows, 2);
        assert_eq!(config.compression.kind, CompressionKind::Zlib);
        assert_eq!(config.compression.effective_level(), Some(6));
        assert_eq!(config.stripe_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            WriterConfig::from_json(r#"{"stripe_rows": 0}"#),
            Err(OrcError::Config(_))
        ));
        assert!(matches!(
            WriterConfig::from_json(r#"{"compression": {"kind": "lz4"}}"#),
            Err(OrcError::Serialization(_))
        ));
    }

    #[test]
    fn test_level_validation() {
        let ok = WriterConfig::default()
            .with_compression(CompressionKind::Zstd)
            .with_compression_level(19);
        assert!(ok.validate().is_ok());

        let bad = WriterConfig::default()
            .with_compression(CompressionKind::Zlib)
            .with_compression_level(12);
        assert!(bad.validate().is_err());

        let snappy_level = WriterConfig::default()
            .with_compression(CompressionKind::Snappy)
            .with_compression_level(1);
        assert!(snappy_level.validate().is_err());
    }

    #[test]
    fn test_block_size_bounds() {
        assert!(WriterConfig::default().with_block_size(0).validate().is_err());
        assert!(WriterConfig::default()
            .with_block_size(MAX_BLOCK_SIZE + 1)
            .validate()
            .is_err());
        assert!(WriterConfig::default()
            .with_block_size(MAX_BLOCK_SIZE)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_kind_ids_roundtrip() {
        for kind in [
            CompressionKind::None,
            CompressionKind::Zlib,
            CompressionKind::Snappy,
            CompressionKind::Zstd,
        ] {
            assert_eq!(CompressionKind::from_id(kind.id()).unwrap(), kind);
        }
        assert!(CompressionKind::from_id(3).is_err());
    }
}
