// In: src/writer/sink.rs

//! An append-only byte sink that tracks how much has been written.
//!
//! Stripe offsets in the footer are taken from this counter, so the underlying
//! writer never needs to implement `Seek`.

use std::io::Write;

use crate::error::OrcError;

#[derive(Debug)]
pub struct PositionedSink<W: Write> {
    inner: W,
    /// Manually tracks the number of bytes written to the underlying writer.
    position: u64,
}

impl<W: Write> PositionedSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), OrcError> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OrcError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
