// In: src/format.rs

//! Defines the physical layout of a file on disk.
//!
//! ```text
//! "ORC"                                  3-byte header
//! [stream data][stripe footer]           once per stripe
//! [file footer]                          JSON, through the file's codec
//! [postscript]                           18 bytes, never compressed
//! ```
//!
//! Stripe and file footers are serde documents serialized with `serde_json`
//! and passed through the configured compression codec. The postscript is a
//! fixed-size little-endian record so a reader can locate everything else from
//! the last 18 bytes of the file.
//!
//! Only the stream encodings follow ORC. The footers and postscript do not, so
//! ORC readers reject these files despite the leading magic.

use serde::{Deserialize, Serialize};

use crate::codec::StreamCompressor;
use crate::column::ColumnStatistics;
use crate::config::{CompressionConfig, CompressionKind};
use crate::error::OrcError;
use crate::schema::{PrimitiveType, SchemaKind, SchemaNode};
use crate::types::TypeKind;

//==================================================================================
// 1. Constants
//==================================================================================

pub const MAGIC: &[u8; 3] = b"ORC";
/// (major, minor)
pub const FORMAT_VERSION: (u8, u8) = (0, 12);
pub const POSTSCRIPT_SIZE: usize = 18;
pub const WRITER_VERSION: &str = concat!("stripe-writer ", env!("CARGO_PKG_VERSION"));

//==================================================================================
// 2. Stripe Metadata
//==================================================================================

/// The role of a stream within its column. Within a column, streams are laid
/// out in this enum's order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Present,
    Data,
    Length,
    DictionaryData,
    Secondary,
}

impl StreamKind {
    pub fn id(self) -> u8 {
        match self {
            StreamKind::Present => 0,
            StreamKind::Data => 1,
            StreamKind::Length => 2,
            StreamKind::DictionaryData => 3,
            StreamKind::Secondary => 5,
        }
    }
}

/// Location of one stream inside a stripe's data region.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub column: u32,
    pub kind: StreamKind,
    /// Length on disk, after compression framing.
    pub length: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoding {
    #[default]
    Direct,
    Dictionary { dictionary_size: u32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StripeFooter {
    /// In file order.
    pub streams: Vec<StreamInfo>,
    /// Indexed by column id.
    pub columns: Vec<ColumnEncoding>,
    /// Indexed by column id.
    pub statistics: Vec<ColumnStatistics>,
}

/// A stripe's entry in the file footer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeInformation {
    pub offset: u64,
    pub data_length: u64,
    pub footer_length: u64,
    pub number_of_rows: u64,
}

impl StripeInformation {
    pub fn total_length(&self) -> u64 {
        self.data_length + self.footer_length
    }
}

//==================================================================================
// 3. File Metadata
//==================================================================================

/// One schema node, flattened. `subtypes` are child column ids.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_length: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileFooter {
    pub header_length: u64,
    /// Header plus every stripe.
    pub content_length: u64,
    pub stripes: Vec<StripeInformation>,
    /// Pre-order; the entry at index `i` describes column `i`.
    pub types: Vec<TypeEntry>,
    pub number_of_rows: u64,
    /// File-level statistics, indexed by column id.
    pub statistics: Vec<ColumnStatistics>,
    pub writer: String,
}

/// Flattens a schema into footer type entries.
pub fn types_from_schema(root: &SchemaNode) -> Vec<TypeEntry> {
    root.flatten()
        .into_iter()
        .map(|node| {
            let mut entry = TypeEntry {
                kind: node.type_kind(),
                subtypes: node.children().iter().map(|c| c.id() as u32).collect(),
                field_names: node
                    .fields()
                    .iter()
                    .map(|f| f.field_name().unwrap_or_default().to_string())
                    .collect(),
                precision: None,
                scale: None,
                maximum_length: None,
            };
            if let SchemaKind::Primitive(p) = node.kind() {
                match *p {
                    PrimitiveType::Decimal { precision, scale } => {
                        entry.precision = Some(precision);
                        entry.scale = Some(scale);
                    }
                    PrimitiveType::Char(n) | PrimitiveType::Varchar(n) => {
                        entry.maximum_length = Some(n);
                    }
                    _ => {}
                }
            }
            entry
        })
        .collect()
}

//==================================================================================
// 4. Postscript
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Postscript {
    /// On-disk length of the file footer.
    pub footer_length: u64,
    pub compression_block_size: u32,
    pub compression: CompressionKind,
    pub version: (u8, u8),
}

impl Postscript {
    pub fn to_bytes(&self) -> [u8; POSTSCRIPT_SIZE] {
        let mut out = [0u8; POSTSCRIPT_SIZE];
        out[0..8].copy_from_slice(&self.footer_length.to_le_bytes());
        out[8..12].copy_from_slice(&self.compression_block_size.to_le_bytes());
        out[12] = self.compression.id();
        out[13] = self.version.0;
        out[14] = self.version.1;
        out[15..18].copy_from_slice(MAGIC);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OrcError> {
        if bytes.len() != POSTSCRIPT_SIZE {
            return Err(OrcError::FormatError(format!(
                "Postscript must be {POSTSCRIPT_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        if &bytes[15..18] != MAGIC {
            return Err(OrcError::FormatError(
                "Missing magic at end of file".to_string(),
            ));
        }
        let mut footer_length = [0u8; 8];
        footer_length.copy_from_slice(&bytes[0..8]);
        let mut block_size = [0u8; 4];
        block_size.copy_from_slice(&bytes[8..12]);
        Ok(Self {
            footer_length: u64::from_le_bytes(footer_length),
            compression_block_size: u32::from_le_bytes(block_size),
            compression: CompressionKind::from_id(bytes[12])?,
            version: (bytes[13], bytes[14]),
        })
    }
}

//==================================================================================
// 5. Tail Inspection
//==================================================================================

/// The parsed end of a finished file.
#[derive(Debug)]
pub struct FileTail {
    pub postscript: Postscript,
    pub footer: FileFooter,
    compressor: StreamCompressor,
}

/// Parses the postscript and file footer of a complete file held in memory.
pub fn read_tail(file: &[u8]) -> Result<FileTail, OrcError> {
    if file.len() < MAGIC.len() + POSTSCRIPT_SIZE || &file[..MAGIC.len()] != MAGIC {
        return Err(OrcError::FormatError("Not a stripe file".to_string()));
    }
    let ps_start = file.len() - POSTSCRIPT_SIZE;
    let postscript = Postscript::from_bytes(&file[ps_start..])?;
    let footer_start = usize::try_from(postscript.footer_length)
        .ok()
        .and_then(|len| ps_start.checked_sub(len))
        .filter(|start| *start >= MAGIC.len())
        .ok_or_else(|| OrcError::FormatError("Footer length out of range".to_string()))?;

    let compressor = StreamCompressor::new(&CompressionConfig {
        kind: postscript.compression,
        level: None,
        block_size: postscript.compression_block_size as usize,
    });
    let footer_bytes = compressor.decode_stream(&file[footer_start..ps_start])?;
    let footer: FileFooter = serde_json::from_slice(&footer_bytes)?;
    Ok(FileTail {
        postscript,
        footer,
        compressor,
    })
}

impl FileTail {
    fn stripe(&self, index: usize) -> Result<&StripeInformation, OrcError> {
        self.footer
            .stripes
            .get(index)
            .ok_or_else(|| OrcError::FormatError(format!("No stripe {index}")))
    }

    fn slice<'a>(file: &'a [u8], start: u64, len: u64) -> Result<&'a [u8], OrcError> {
        let start = start as usize;
        let end = start + len as usize;
        file.get(start..end)
            .ok_or_else(|| OrcError::FormatError("Region out of bounds".to_string()))
    }

    pub fn stripe_footer(&self, file: &[u8], index: usize) -> Result<StripeFooter, OrcError> {
        let info = self.stripe(index)?;
        let raw = Self::slice(file, info.offset + info.data_length, info.footer_length)?;
        let bytes = self.compressor.decode_stream(raw)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The decompressed bytes of one stream, or `None` if the stripe does not
    /// contain it.
    pub fn stream(
        &self,
        file: &[u8],
        index: usize,
        column: u32,
        kind: StreamKind,
    ) -> Result<Option<Vec<u8>>, OrcError> {
        let info = self.stripe(index)?;
        let footer = self.stripe_footer(file, index)?;
        let mut offset = info.offset;
        for stream in &footer.streams {
            if stream.column == column && stream.kind == kind {
                let raw = Self::slice(file, offset, stream.length)?;
                return self.compressor.decode_stream(raw).map(Some);
            }
            offset += stream.length;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn test_postscript_layout() {
        let ps = Postscript {
            footer_length: 0x0102,
            compression_block_size: 256 * 1024,
            compression: CompressionKind::Snappy,
            version: FORMAT_VERSION,
        };
        let bytes = ps.to_bytes();
        assert_eq!(&bytes[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x04, 0x00]);
        assert_eq!(bytes[12], 2);
        assert_eq!((bytes[13], bytes[14]), (0, 12));
        assert_eq!(&bytes[15..], b"ORC");
        assert_eq!(Postscript::from_bytes(&bytes).unwrap(), ps);
    }

    #[test]
    fn test_postscript_rejects_bad_magic() {
        let mut bytes = Postscript {
            footer_length: 1,
            compression_block_size: 1,
            compression: CompressionKind::None,
            version: FORMAT_VERSION,
        }
        .to_bytes();
        bytes[17] = b'X';
        assert!(matches!(
            Postscript::from_bytes(&bytes),
            Err(OrcError::FormatError(_))
        ));
    }

    #[test]
    fn test_types_from_schema() {
        let root = schema::parse("struct<a:decimal(9,2),b:array<varchar(5)>>").unwrap();
        let types = types_from_schema(&root);
        assert_eq!(types.len(), 4);
        assert_eq!(types[0].kind, TypeKind::Struct);
        assert_eq!(types[0].subtypes, vec![1, 2]);
        assert_eq!(types[0].field_names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(types[1].precision, Some(9));
        assert_eq!(types[1].scale, Some(2));
        assert_eq!(types[2].subtypes, vec![3]);
        assert_eq!(types[3].maximum_length, Some(5));
    }

    #[test]
    fn test_stream_kind_order_and_ids() {
        let mut kinds = vec![
            StreamKind::Secondary,
            StreamKind::Present,
            StreamKind::DictionaryData,
            StreamKind::Data,
            StreamKind::Length,
        ];
        kinds.sort();
        let ids: Vec<u8> = kinds.iter().map(|k| k.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_read_tail_rejects_garbage() {
        assert!(read_tail(b"not a file at all, definitely").is_err());
        assert!(read_tail(b"ORC").is_err());
    }
}
