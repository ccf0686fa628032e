// In: src/encoding/mod.rs

//! Turns one column's buffered stripe data into raw (uncompressed) streams.
//!
//! This is the dispatcher between the column model and the stateless kernels:
//! it picks the kernel for each column type, decides between dictionary and
//! direct encoding for strings, and drops empty streams. It runs once per
//! column per flush and keeps no state between flushes.

use crate::column::{ColumnAccumulator, ColumnData};
use crate::error::OrcError;
use crate::format::{ColumnEncoding, StreamKind};
use crate::kernels::{boolean, byte_rle, dictionary, int_rle, leb128};
use crate::types::TypeKind;

/// Timestamp seconds are stored relative to 2015-01-01T00:00:00Z.
pub const TIMESTAMP_BASE_SECONDS: i64 = 1_420_070_400;

/// Default `distinct / non_null` ratio below which strings use a dictionary.
pub const DEFAULT_DICTIONARY_THRESHOLD: f64 = 0.8;

//==================================================================================
// 1. Output Model
//==================================================================================

/// One raw stream, before compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    pub column: u32,
    pub kind: StreamKind,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedColumn {
    pub column: u32,
    pub encoding: ColumnEncoding,
    /// Non-empty streams, ordered by `StreamKind`.
    pub streams: Vec<EncodedStream>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderOptions {
    pub dictionary_threshold: f64,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            dictionary_threshold: DEFAULT_DICTIONARY_THRESHOLD,
        }
    }
}

//==================================================================================
// 2. Dispatcher
//==================================================================================

/// Encodes the open stripe of `acc`.
pub fn encode_column(
    acc: &ColumnAccumulator,
    options: &EncoderOptions,
) -> Result<EncodedColumn, OrcError> {
    let column = acc.id() as u32;
    let mut encoding = ColumnEncoding::Direct;
    let mut streams: Vec<(StreamKind, Vec<u8>)> = Vec::new();

    if acc.has_nulls() {
        streams.push((StreamKind::Present, boolean::encode(acc.present())));
    }

    match acc.data() {
        ColumnData::Structural => {}
        ColumnData::Lengths(lengths) => {
            streams.push((StreamKind::Length, encode_unsigned(lengths)?));
        }
        ColumnData::Boolean(values) => {
            streams.push((StreamKind::Data, boolean::encode(values)));
        }
        ColumnData::Integer(values) => {
            let data = if acc.kind() == TypeKind::Byte {
                // Range-checked on the way in, so the cast is lossless.
                let bytes: Vec<u8> = values.iter().map(|&v| v as i8 as u8).collect();
                byte_rle::encode(&bytes)
            } else {
                int_rle::encode(values, true)?
            };
            streams.push((StreamKind::Data, data));
        }
        ColumnData::Float(values) => {
            let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            streams.push((StreamKind::Data, data));
        }
        ColumnData::Double(values) => {
            let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            streams.push((StreamKind::Data, data));
        }
        ColumnData::Bytes { data, lengths } => {
            let use_dictionary = acc.kind().is_string_like()
                && should_use_dictionary(data, lengths, options.dictionary_threshold);
            if use_dictionary {
                let dict = dictionary::build(split_values(data, lengths));
                log::debug!(
                    "column {column}: dictionary of {} entries for {} values",
                    dict.entries.len(),
                    lengths.len()
                );
                encoding = ColumnEncoding::Dictionary {
                    dictionary_size: dict.entries.len() as u32,
                };
                let entry_lengths: Vec<u64> =
                    dict.entries.iter().map(|e| e.len() as u64).collect();
                streams.push((StreamKind::Data, encode_unsigned(&dict.indices)?));
                streams.push((StreamKind::Length, encode_unsigned(&entry_lengths)?));
                streams.push((StreamKind::DictionaryData, dict.entries.concat()));
            } else {
                streams.push((StreamKind::Data, data.clone()));
                streams.push((StreamKind::Length, encode_unsigned(lengths)?));
            }
        }
        ColumnData::Timestamp { seconds, nanos } => {
            let relative: Vec<i64> = seconds
                .iter()
                .map(|&s| s.wrapping_sub(TIMESTAMP_BASE_SECONDS))
                .collect();
            let compact: Vec<u64> = nanos.iter().map(|&n| format_nanos(n)).collect();
            streams.push((StreamKind::Data, int_rle::encode(&relative, true)?));
            streams.push((StreamKind::Secondary, encode_unsigned(&compact)?));
        }
        ColumnData::Decimal(values) => {
            let mut data = Vec::new();
            for &v in values {
                leb128::encode_signed_wide(v, &mut data)?;
            }
            let scales = vec![i64::from(acc.scale()); values.len()];
            streams.push((StreamKind::Data, data));
            streams.push((StreamKind::Secondary, int_rle::encode(&scales, true)?));
        }
    }

    streams.sort_by_key(|(kind, _)| *kind);
    Ok(EncodedColumn {
        column,
        encoding,
        streams: streams
            .into_iter()
            .filter(|(_, data)| !data.is_empty())
            .map(|(kind, data)| EncodedStream { column, kind, data })
            .collect(),
    })
}

fn encode_unsigned(values: &[u64]) -> Result<Vec<u8>, OrcError> {
    let mut encoder = int_rle::IntRleEncoder::new(false);
    for &v in values {
        // Unsigned streams go through the encoder's i64 lanes bit-for-bit.
        encoder.write(v as i64)?;
    }
    encoder.finish()
}

fn split_values<'a>(data: &'a [u8], lengths: &'a [u64]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let mut offset = 0usize;
    lengths.iter().map(move |&len| {
        let start = offset;
        offset += len as usize;
        &data[start..offset]
    })
}

fn should_use_dictionary(data: &[u8], lengths: &[u64], threshold: f64) -> bool {
    let non_null = lengths.len();
    if non_null == 0 {
        return false;
    }
    let distinct = dictionary::distinct_count(split_values(data, lengths));
    (distinct as f64) / (non_null as f64) < threshold
}

/// Compacts a nanosecond value by stripping trailing decimal zeros.
///
/// The low 3 bits hold the number of stripped zeros minus one (0 when none
/// were stripped); the remaining bits hold the shortened value.
pub fn format_nanos(nanos: u32) -> u64 {
    if nanos == 0 {
        return 0;
    }
    if nanos % 100 != 0 {
        return u64::from(nanos) << 3;
    }
    let mut value = nanos / 100;
    let mut trailing_zeros = 1u64;
    while value % 10 == 0 && trailing_zeros < 7 {
        value /= 10;
        trailing_zeros += 1;
    }
    (u64::from(value) << 3) | trailing_zeros
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
