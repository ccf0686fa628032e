// In: src/writer/mod.rs

//! The public file writer.
//!
//! A `Writer` owns an append-only sink, the schema and a `StripeBuilder`. The
//! header is written as soon as the writer is created; stripes follow whenever
//! the builder reports it is full; `close` writes the last stripe, the file
//! footer and the fixed-size postscript.
//!
//! Both ingestion paths validate the whole call before touching any
//! accumulator. A rejected row or batch therefore leaves the writer exactly as
//! it was. Failures after validation (sink I/O, codec faults) poison it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::WriterConfig;
use crate::error::OrcError;
use crate::format::{
    self, FileFooter, Postscript, StripeInformation, FORMAT_VERSION, MAGIC, WRITER_VERSION,
};
use crate::schema::{self, SchemaNode};
use crate::stripe::StripeBuilder;
use crate::types::Value;

mod route;
pub mod sink;

#[cfg(test)]
mod tests;

use sink::PositionedSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Open,
    Closed,
    /// A write failed after validation; the output can no longer be trusted.
    Poisoned,
}

#[derive(Debug)]
pub struct Writer<W: Write> {
    sink: PositionedSink<W>,
    schema: SchemaNode,
    config: WriterConfig,
    builder: StripeBuilder,
    rows_written: u64,
    state: WriterState,
}

impl Writer<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and writes to it through a
    /// buffered sink.
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: SchemaNode,
        config: WriterConfig,
    ) -> Result<Self, OrcError> {
        let file = File::create(path)?;
        Writer::new(BufWriter::new(file), schema, config)
    }
}

impl<W: Write> Writer<W> {
    /// Creates a writer and immediately writes the file header to `sink`.
    ///
    /// The schema root must be a struct; its fields are the file's top-level
    /// columns.
    pub fn new(sink: W, schema: SchemaNode, config: WriterConfig) -> Result<Self, OrcError> {
        config.validate()?;
        if !schema.is_struct() {
            return Err(OrcError::Schema(format!(
                "the root type must be a struct, got '{schema}'"
            )));
        }

        let mut sink = PositionedSink::new(sink);
        sink.write_all(MAGIC)?;
        let builder = StripeBuilder::new(&schema, &config);
        log::debug!(
            "opened writer: {} columns, compression {:?}",
            schema.column_count(),
            config.compression.kind
        );

        Ok(Self {
            sink,
            schema,
            config,
            builder,
            rows_written: 0,
            state: WriterState::Open,
        })
    }

    /// Parses `schema` from its textual form and creates a writer for it.
    pub fn from_schema_text(sink: W, schema: &str, config: WriterConfig) -> Result<Self, OrcError> {
        Writer::new(sink, schema::parse(schema)?, config)
    }

    //==============================================================================
    // Ingestion
    //==============================================================================

    /// Appends one row, one value per top-level field.
    pub fn write(&mut self, values: &[Value]) -> Result<(), OrcError> {
        self.ensure_open()?;
        route::validate_row(&self.schema, values)?;

        let result = self.append_row(values.iter());
        self.poison_on_fatal(result)
    }

    /// Appends a batch given column-wise: one iterator per top-level field, all
    /// of the same length.
    ///
    /// The batch is cut at exactly the rows where `write` would have flushed,
    /// so a file written column-wise is byte-identical to one written row by
    /// row.
    pub fn write_columns<I, C>(&mut self, columns: I) -> Result<(), OrcError>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = Value>,
    {
        self.ensure_open()?;
        let columns: Vec<Vec<Value>> = columns
            .into_iter()
            .map(|c| c.into_iter().collect())
            .collect();

        let fields = self.schema.fields();
        if columns.len() != fields.len() {
            return Err(OrcError::Arity {
                what: "columns",
                expected: fields.len(),
                found: columns.len(),
            });
        }
        let rows = columns.first().map_or(0, Vec::len);
        if let Some(short) = columns.iter().find(|c| c.len() != rows) {
            return Err(OrcError::Arity {
                what: "values per column",
                expected: rows,
                found: short.len(),
            });
        }
        for (field, column) in fields.iter().zip(&columns) {
            let name = field.field_name().unwrap_or_default();
            for value in column {
                route::validate(field, value, name)?;
            }
        }

        let result = self.append_batch(&columns, rows);
        self.poison_on_fatal(result)
    }

    fn append_row<'v, R>(&mut self, values: R) -> Result<(), OrcError>
    where
        R: IntoIterator<Item = &'v Value> + Clone,
    {
        let estimate = route::estimate_row(&self.schema, values.clone());
        route::append_row(&self.schema, values, self.builder.accumulators_mut())?;
        self.builder.record_row(estimate);
        self.rows_written += 1;
        if self.builder.should_flush() {
            self.builder.flush(&mut self.sink)?;
        }
        Ok(())
    }

    fn append_batch(&mut self, columns: &[Vec<Value>], rows: usize) -> Result<(), OrcError> {
        let row_at = |r: usize| columns.iter().map(move |c| &c[r]);
        let estimates: Vec<u64> = (0..rows)
            .map(|r| route::estimate_row(&self.schema, row_at(r)))
            .collect();

        let mut start = 0;
        while start < rows {
            let cut = self.builder.rows_until_flush(&estimates[start..]);
            let end = start + cut.unwrap_or(rows - start);
            for r in start..end {
                route::append_row(&self.schema, row_at(r), self.builder.accumulators_mut())?;
                self.builder.record_row(estimates[r]);
            }
            self.rows_written += (end - start) as u64;
            if cut.is_some() {
                self.builder.flush(&mut self.sink)?;
            }
            start = end;
        }
        Ok(())
    }

    //==============================================================================
    // Lifecycle
    //==============================================================================

    /// Flushes the open stripe and writes the file footer and postscript.
    ///
    /// Closing twice is an error; the first close's output is left untouched.
    pub fn close(&mut self) -> Result<FileFooter, OrcError> {
        self.ensure_open()?;
        let result = self.finish();
        let result = self.poison_on_fatal(result);
        if result.is_ok() {
            self.state = WriterState::Closed;
        }
        result
    }

    fn finish(&mut self) -> Result<FileFooter, OrcError> {
        self.builder.flush(&mut self.sink)?;
        self.builder.close();

        let footer = FileFooter {
            header_length: MAGIC.len() as u64,
            content_length: self.sink.position(),
            stripes: self.builder.stripes().to_vec(),
            types: format::types_from_schema(&self.schema),
            number_of_rows: self.rows_written,
            statistics: self.builder.file_statistics(),
            writer: WRITER_VERSION.to_string(),
        };
        let compressor = self.builder.compressor();
        let footer_json = serde_json::to_vec(&footer)?;
        let footer_bytes = compressor.encode_stream(&footer_json)?;

        let block_size = u32::try_from(compressor.block_size()).map_err(|_| {
            OrcError::InternalError("compression block size exceeds u32".to_string())
        })?;
        let postscript = Postscript {
            footer_length: footer_bytes.len() as u64,
            compression_block_size: block_size,
            compression: compressor.kind(),
            version: FORMAT_VERSION,
        };

        self.sink.write_all(&footer_bytes)?;
        self.sink.write_all(&postscript.to_bytes())?;
        self.sink.flush()?;

        log_metric!(
            "event" = "close",
            "rows" = footer.number_of_rows,
            "stripes" = footer.stripes.len(),
            "bytes" = self.sink.position()
        );
        log::info!(
            "closed writer: {} rows in {} stripes, {} bytes",
            footer.number_of_rows,
            footer.stripes.len(),
            self.sink.position()
        );
        Ok(footer)
    }

    fn ensure_open(&self) -> Result<(), OrcError> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Closed => Err(OrcError::ClosedWriter),
            WriterState::Poisoned => Err(OrcError::Poisoned),
        }
    }

    fn poison_on_fatal<T>(&mut self, result: Result<T, OrcError>) -> Result<T, OrcError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                log::error!("writer poisoned: {e}");
                self.state = WriterState::Poisoned;
            }
        }
        result
    }

    //==============================================================================
    // Accessors
    //==============================================================================

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Rows accepted so far, flushed or not.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Stripes already written to the sink.
    pub fn stripes(&self) -> &[StripeInformation] {
        self.builder.stripes()
    }

    /// Bytes written to the sink so far.
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Returns the underlying sink. Does not close the file first.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}
