// In: src/stripe/mod.rs

//! The stripe builder: owns the column accumulators for the open stripe,
//! decides when the stripe is full, and turns it into bytes.
//!
//! State machine: `Empty -> Accumulating -> Flushing -> Empty`, with `Closed`
//! terminal. A stripe is flushed once its row count reaches `stripe_rows` or
//! its buffered byte estimate exceeds `stripe_bytes`, whichever comes first.

use std::io::Write;

use crate::codec::StreamCompressor;
use crate::column::{ColumnAccumulator, ColumnStatistics};
use crate::config::WriterConfig;
use crate::encoding::{self, EncoderOptions};
use crate::error::OrcError;
use crate::format::{StreamInfo, StripeFooter, StripeInformation};
use crate::schema::SchemaNode;
use crate::writer::sink::PositionedSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeState {
    Empty,
    Accumulating,
    Flushing,
    Closed,
}

/// A fully serialized stripe, ready to be appended to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Stripe {
    pub number_of_rows: u64,
    pub footer: StripeFooter,
    /// Concatenated on-disk streams, in column then stream-kind order.
    pub data: Vec<u8>,
    /// The stripe footer after serialization and compression.
    pub footer_bytes: Vec<u8>,
}

impl Stripe {
    pub fn information(&self, offset: u64) -> StripeInformation {
        StripeInformation {
            offset,
            data_length: self.data.len() as u64,
            footer_length: self.footer_bytes.len() as u64,
            number_of_rows: self.number_of_rows,
        }
    }

    /// Per-column statistics for this stripe, indexed by column id.
    pub fn statistics(&self) -> &[ColumnStatistics] {
        &self.footer.statistics
    }
}

#[derive(Debug)]
pub struct StripeBuilder {
    accumulators: Vec<ColumnAccumulator>,
    state: StripeState,
    rows: u64,
    buffered_bytes: u64,
    stripe_rows: u64,
    stripe_bytes: u64,
    encoder_options: EncoderOptions,
    compressor: StreamCompressor,
    stripes: Vec<StripeInformation>,
}

impl StripeBuilder {
    pub fn new(schema: &SchemaNode, config: &WriterConfig) -> Self {
        Self {
            accumulators: schema
                .flatten()
                .into_iter()
                .map(ColumnAccumulator::new)
                .collect(),
            state: StripeState::Empty,
            rows: 0,
            buffered_bytes: 0,
            stripe_rows: config.stripe_rows,
            stripe_bytes: config.stripe_bytes,
            encoder_options: EncoderOptions {
                dictionary_threshold: config.dictionary_threshold,
            },
            compressor: StreamCompressor::new(&config.compression),
            stripes: Vec::new(),
        }
    }

    pub fn state(&self) -> StripeState {
        self.state
    }

    /// Rows buffered in the open stripe.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn buffered_bytes(&self) -> u64 {
        self.buffered_bytes
    }

    pub fn accumulators(&self) -> &[ColumnAccumulator] {
        &self.accumulators
    }

    pub fn accumulators_mut(&mut self) -> &mut [ColumnAccumulator] {
        &mut self.accumulators
    }

    pub fn compressor(&self) -> &StreamCompressor {
        &self.compressor
    }

    /// Stripes already written, in file order.
    pub fn stripes(&self) -> &[StripeInformation] {
        &self.stripes
    }

    /// File-level statistics for every column, covering all flushed stripes.
    pub fn file_statistics(&self) -> Vec<ColumnStatistics> {
        self.accumulators
            .iter()
            .map(|a| a.file_statistics().clone())
            .collect()
    }

    /// Accounts for one row that has just been appended to the accumulators.
    pub fn record_row(&mut self, estimated_bytes: u64) {
        self.rows += 1;
        self.buffered_bytes += estimated_bytes;
        self.state = StripeState::Accumulating;
    }

    pub fn should_flush(&self) -> bool {
        self.rows >= self.stripe_rows || self.buffered_bytes > self.stripe_bytes
    }

    /// Given per-row byte estimates for rows about to be appended, returns the
    /// number of leading rows after which the open stripe will be full, or
    /// `None` if all of them fit.
    pub fn rows_until_flush(&self, estimates: &[u64]) -> Option<usize> {
        let mut rows = self.rows;
        let mut bytes = self.buffered_bytes;
        for (i, &e) in estimates.iter().enumerate() {
            rows += 1;
            bytes += e;
            if rows >= self.stripe_rows || bytes > self.stripe_bytes {
                return Some(i + 1);
            }
        }
        None
    }

    /// Encodes and compresses the open stripe, then resets the accumulators.
    pub fn assemble(&mut self) -> Result<Stripe, OrcError> {
        let mut footer = StripeFooter {
            streams: Vec::new(),
            columns: Vec::with_capacity(self.accumulators.len()),
            statistics: Vec::with_capacity(self.accumulators.len()),
        };
        let mut data = Vec::new();

        for acc in &self.accumulators {
            let encoded = encoding::encode_column(acc, &self.encoder_options)?;
            footer.columns.push(encoded.encoding);
            for stream in encoded.streams {
                let on_disk = self.compressor.encode_stream(&stream.data)?;
                log::debug!(
                    "column {} {:?}: {} raw bytes, {} on disk",
                    stream.column,
                    stream.kind,
                    stream.data.len(),
                    on_disk.len()
                );
                footer.streams.push(StreamInfo {
                    column: stream.column,
                    kind: stream.kind,
                    length: on_disk.len() as u64,
                });
                data.extend_from_slice(&on_disk);
            }
        }

        for acc in &mut self.accumulators {
            footer.statistics.push(acc.reset());
        }

        let footer_json = serde_json::to_vec(&footer)?;
        let footer_bytes = self.compressor.encode_stream(&footer_json)?;
        let stripe = Stripe {
            number_of_rows: self.rows,
            footer,
            data,
            footer_bytes,
        };
        self.rows = 0;
        self.buffered_bytes = 0;
        Ok(stripe)
    }

    /// Writes the open stripe to `sink`. Does nothing when no rows are buffered.
    pub fn flush<W: Write>(
        &mut self,
        sink: &mut PositionedSink<W>,
    ) -> Result<Option<StripeInformation>, OrcError> {
        if self.state == StripeState::Closed {
            return Err(OrcError::ClosedWriter);
        }
        if self.rows == 0 {
            return Ok(None);
        }
        self.state = StripeState::Flushing;
        let offset = sink.position();
        let stripe = self.assemble()?;
        sink.write_all(&stripe.data)?;
        sink.write_all(&stripe.footer_bytes)?;

        let info = stripe.information(offset);
        log_metric!(
            "event" = "flush_stripe",
            "index" = self.stripes.len(),
            "rows" = info.number_of_rows,
            "offset" = info.offset,
            "data_length" = info.data_length,
            "footer_length" = info.footer_length
        );
        self.stripes.push(info);
        self.state = StripeState::Empty;
        Ok(Some(info))
    }

    /// Marks the builder closed. The stripe directory stays readable.
    pub fn close(&mut self) {
        self.state = StripeState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StreamKind;
    use crate::schema;

    fn builder(stripe_rows: u64, stripe_bytes: u64) -> StripeBuilder {
        let root = schema::parse("struct<a:int,b:string>").unwrap();
        let config = WriterConfig::default()
            .with_stripe_rows(stripe_rows)
            .with_stripe_bytes(stripe_bytes);
        StripeBuilder::new(&root, &config)
    }

    fn push_row(b: &mut StripeBuilder, a: i64, s: &str) {
        let accs = b.accumulators_mut();
        accs[0].push_struct().unwrap();
        accs[1].push_int(a).unwrap();
        accs[2].push_bytes(s.as_bytes()).unwrap();
        b.record_row(1 + 4 + s.len() as u64 + 4);
    }

    #[test]
    fn test_row_threshold_is_reached_not_exceeded() {
        let mut b = builder(2, u64::MAX);
        push_row(&mut b, 1, "x");
        assert!(!b.should_flush());
        assert_eq!(b.state(), StripeState::Accumulating);
        push_row(&mut b, 2, "y");
        assert!(b.should_flush());
    }

    #[test]
    fn test_byte_threshold_must_be_exceeded() {
        // Each row is estimated at 10 bytes.
        let mut b = builder(1000, 20);
        push_row(&mut b, 1, "x");
        push_row(&mut b, 2, "y");
        assert!(!b.should_flush());
        push_row(&mut b, 3, "z");
        assert!(b.should_flush());
    }

    #[test]
    fn test_rows_until_flush() {
        let mut b = builder(3, 100);
        push_row(&mut b, 1, "x");
        assert_eq!(b.rows_until_flush(&[1, 1, 1, 1]), Some(2));
        assert_eq!(b.rows_until_flush(&[1]), None);
        assert_eq!(b.rows_until_flush(&[200]), Some(1));
    }

    #[test]
    fn test_flush_writes_stripe_and_resets() {
        let mut b = builder(10, u64::MAX);
        let mut sink = PositionedSink::new(Vec::new());
        sink.write_all(b"ORC").unwrap();
        assert_eq!(b.flush(&mut sink).unwrap(), None);

        push_row(&mut b, 1, "x");
        push_row(&mut b, 2, "x");
        let info = b.flush(&mut sink).unwrap().unwrap();
        assert_eq!(info.offset, 3);
        assert_eq!(info.number_of_rows, 2);
        assert_eq!(sink.position(), 3 + info.total_length());
        assert_eq!(b.state(), StripeState::Empty);
        assert_eq!(b.rows(), 0);
        assert!(b.accumulators().iter().all(|a| a.row_count() == 0));
        assert_eq!(b.stripes().len(), 1);
        assert_eq!(b.file_statistics()[1].number_of_values, 2);
    }

    #[test]
    fn test_assemble_orders_streams_by_column() {
        let mut b = builder(10, u64::MAX);
        push_row(&mut b, 7, "hello");
        let stripe = b.assemble().unwrap();
        let order: Vec<(u32, StreamKind)> = stripe
            .footer
            .streams
            .iter()
            .map(|s| (s.column, s.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, StreamKind::Data),
                (2, StreamKind::Data),
                (2, StreamKind::Length)
            ]
        );
        assert_eq!(stripe.statistics().len(), 3);
        assert_eq!(
            stripe.data.len() as u64,
            stripe.footer.streams.iter().map(|s| s.length).sum::<u64>()
        );
    }

    #[test]
    fn test_closed_builder_refuses_flush() {
        let mut b = builder(10, u64::MAX);
        b.close();
        let mut sink = PositionedSink::new(Vec::new());
        assert!(matches!(b.flush(&mut sink), Err(OrcError::ClosedWriter)));
    }
}
