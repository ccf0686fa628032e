// In: src/column/mod.rs

//! Per-column accumulators.
//!
//! The writer owns one `ColumnAccumulator` per schema node, indexed by the
//! node's pre-order id. Both ingestion paths end up calling the same `push_*`
//! methods, which is what makes row and column ingestion indistinguishable in
//! the output. Values arrive already validated against the schema.
//!
//! Nulls are recorded only in the presence buffer; data buffers hold non-null
//! values exclusively.

pub mod statistics;

use chrono::{DateTime, Utc};

use crate::error::OrcError;
use crate::schema::{PrimitiveType, SchemaKind, SchemaNode};
use crate::types::TypeKind;
pub use statistics::{ColumnStatistics, TypedStatistics};

//==================================================================================
// 1. Buffered Data
//==================================================================================

/// Non-null values buffered for the open stripe, in the shape the encoder wants.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Struct columns buffer presence only.
    Structural,
    /// List and map columns buffer their child counts.
    Lengths(Vec<u64>),
    Boolean(Vec<bool>),
    /// tinyint/smallint/int/bigint, and dates as days since the Unix epoch.
    Integer(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// string/char/varchar/binary: concatenated bytes plus per-value lengths.
    Bytes { data: Vec<u8>, lengths: Vec<u64> },
    /// Whole seconds since the Unix epoch (floored) and the sub-second nanos.
    Timestamp { seconds: Vec<i64>, nanos: Vec<u32> },
    /// Unscaled values, already at the column's scale.
    Decimal(Vec<i128>),
}

impl ColumnData {
    fn for_node(node: &SchemaNode) -> Self {
        match node.kind() {
            SchemaKind::Struct(_) => ColumnData::Structural,
            SchemaKind::List(_) | SchemaKind::Map(_, _) => ColumnData::Lengths(Vec::new()),
            SchemaKind::Primitive(p) => match p {
                PrimitiveType::Boolean => ColumnData::Boolean(Vec::new()),
                PrimitiveType::TinyInt
                | PrimitiveType::SmallInt
                | PrimitiveType::Int
                | PrimitiveType::BigInt
                | PrimitiveType::Date => ColumnData::Integer(Vec::new()),
                PrimitiveType::Float => ColumnData::Float(Vec::new()),
                PrimitiveType::Double => ColumnData::Double(Vec::new()),
                PrimitiveType::String
                | PrimitiveType::Binary
                | PrimitiveType::Char(_)
                | PrimitiveType::Varchar(_) => ColumnData::Bytes {
                    data: Vec::new(),
                    lengths: Vec::new(),
                },
                PrimitiveType::Timestamp => ColumnData::Timestamp {
                    seconds: Vec::new(),
                    nanos: Vec::new(),
                },
                PrimitiveType::Decimal { .. } => ColumnData::Decimal(Vec::new()),
            },
        }
    }

    /// Number of buffered non-null values.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Structural => 0,
            ColumnData::Lengths(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Bytes { lengths, .. } => lengths.len(),
            ColumnData::Timestamp { seconds, .. } => seconds.len(),
            ColumnData::Decimal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        match self {
            ColumnData::Structural => {}
            ColumnData::Lengths(v) => v.clear(),
            ColumnData::Boolean(v) => v.clear(),
            ColumnData::Integer(v) => v.clear(),
            ColumnData::Float(v) => v.clear(),
            ColumnData::Double(v) => v.clear(),
            ColumnData::Bytes { data, lengths } => {
                data.clear();
                lengths.clear();
            }
            ColumnData::Timestamp { seconds, nanos } => {
                seconds.clear();
                nanos.clear();
            }
            ColumnData::Decimal(v) => v.clear(),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            ColumnData::Structural => "structural",
            ColumnData::Lengths(_) => "lengths",
            ColumnData::Boolean(_) => "boolean",
            ColumnData::Integer(_) => "integer",
            ColumnData::Float(_) => "float",
            ColumnData::Double(_) => "double",
            ColumnData::Bytes { .. } => "bytes",
            ColumnData::Timestamp { .. } => "timestamp",
            ColumnData::Decimal(_) => "decimal",
        }
    }
}

//==================================================================================
// 2. The Accumulator
//==================================================================================

#[derive(Debug, Clone)]
pub struct ColumnAccumulator {
    id: usize,
    kind: TypeKind,
    /// Decimal scale; zero for every other kind.
    scale: u32,
    /// One entry per row that reached this column in the open stripe.
    present: Vec<bool>,
    data: ColumnData,
    stripe_stats: ColumnStatistics,
    file_stats: ColumnStatistics,
}

impl ColumnAccumulator {
    pub fn new(node: &SchemaNode) -> Self {
        let scale = match node.kind() {
            SchemaKind::Primitive(PrimitiveType::Decimal { scale, .. }) => *scale,
            _ => 0,
        };
        let stats = ColumnStatistics::new(node.type_kind(), scale);
        Self {
            id: node.id(),
            kind: node.type_kind(),
            scale,
            present: Vec::new(),
            data: ColumnData::for_node(node),
            stripe_stats: stats.clone(),
            file_stats: stats,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Decimal scale of the column (zero for non-decimals).
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Presence flags for the open stripe.
    pub fn present(&self) -> &[bool] {
        &self.present
    }

    /// `true` when the open stripe holds at least one null for this column.
    pub fn has_nulls(&self) -> bool {
        self.stripe_stats.has_null()
    }

    /// Rows (null or not) buffered for the open stripe.
    pub fn row_count(&self) -> usize {
        self.present.len()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn stripe_statistics(&self) -> &ColumnStatistics {
        &self.stripe_stats
    }

    pub fn file_statistics(&self) -> &ColumnStatistics {
        &self.file_stats
    }

    fn wrong_variant(&self, wanted: &str) -> OrcError {
        OrcError::InternalError(format!(
            "column {} buffers {} values, cannot accept {}",
            self.id,
            self.data.variant_name(),
            wanted
        ))
    }

    pub fn push_null(&mut self) {
        self.present.push(false);
        self.stripe_stats.record_null();
    }

    /// Records a present struct value. Its fields are pushed separately.
    pub fn push_struct(&mut self) -> Result<(), OrcError> {
        if !matches!(self.data, ColumnData::Structural) {
            return Err(self.wrong_variant("struct"));
        }
        self.present.push(true);
        self.stripe_stats.record_present();
        Ok(())
    }

    /// Records a present list or map with `len` entries.
    pub fn push_length(&mut self, len: u64) -> Result<(), OrcError> {
        let ColumnData::Lengths(lengths) = &mut self.data else {
            return Err(self.wrong_variant("length"));
        };
        lengths.push(len);
        self.present.push(true);
        self.stripe_stats.record_present();
        Ok(())
    }

    pub fn push_bool(&mut self, v: bool) -> Result<(), OrcError> {
        let ColumnData::Boolean(values) = &mut self.data else {
            return Err(self.wrong_variant("boolean"));
        };
        values.push(v);
        self.present.push(true);
        self.stripe_stats.record_boolean(v);
        Ok(())
    }

    /// Integers of every width, and dates as epoch days.
    pub fn push_int(&mut self, v: i64) -> Result<(), OrcError> {
        let ColumnData::Integer(values) = &mut self.data else {
            return Err(self.wrong_variant("integer"));
        };
        values.push(v);
        self.present.push(true);
        self.stripe_stats.record_integer(v);
        Ok(())
    }

    pub fn push_float(&mut self, v: f32) -> Result<(), OrcError> {
        let ColumnData::Float(values) = &mut self.data else {
            return Err(self.wrong_variant("float"));
        };
        values.push(v);
        self.present.push(true);
        self.stripe_stats.record_double(f64::from(v));
        Ok(())
    }

    pub fn push_double(&mut self, v: f64) -> Result<(), OrcError> {
        let ColumnData::Double(values) = &mut self.data else {
            return Err(self.wrong_variant("double"));
        };
        values.push(v);
        self.present.push(true);
        self.stripe_stats.record_double(v);
        Ok(())
    }

    pub fn push_bytes(&mut self, v: &[u8]) -> Result<(), OrcError> {
        let ColumnData::Bytes { data, lengths } = &mut self.data else {
            return Err(self.wrong_variant("bytes"));
        };
        data.extend_from_slice(v);
        lengths.push(v.len() as u64);
        self.present.push(true);
        self.stripe_stats.record_bytes(v);
        Ok(())
    }

    pub fn push_timestamp(&mut self, ts: &DateTime<Utc>) -> Result<(), OrcError> {
        let ColumnData::Timestamp { seconds, nanos } = &mut self.data else {
            return Err(self.wrong_variant("timestamp"));
        };
        seconds.push(ts.timestamp());
        nanos.push(ts.timestamp_subsec_nanos());
        self.present.push(true);
        self.stripe_stats.record_timestamp_millis(ts.timestamp_millis());
        Ok(())
    }

    /// Pushes an unscaled decimal already at the column's scale.
    pub fn push_decimal(&mut self, unscaled: i128) -> Result<(), OrcError> {
        let ColumnData::Decimal(values) = &mut self.data else {
            return Err(self.wrong_variant("decimal"));
        };
        values.push(unscaled);
        self.present.push(true);
        self.stripe_stats.record_decimal(unscaled);
        Ok(())
    }

    /// Clears the open stripe's buffers and returns its statistics, which are
    /// also folded into the file-level statistics.
    pub fn reset(&mut self) -> ColumnStatistics {
        self.present.clear();
        self.data.clear();
        let empty = ColumnStatistics::new(self.kind, self.scale);
        let stripe = std::mem::replace(&mut self.stripe_stats, empty);
        self.file_stats.merge(&stripe);
        stripe
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
