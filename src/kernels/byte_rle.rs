//! This module contains the kernels for byte-oriented Run-Length Encoding.
//!
//! Used directly for `tinyint` columns and, after bit-packing, for boolean and
//! presence streams. The on-disk format is a sequence of groups:
//!
//! * **Run:** a control byte `0..=127` meaning `control + 3` repetitions,
//!   followed by the repeated byte.
//! * **Literals:** a control byte `-1..=-128` (as `i8`) meaning that many raw
//!   bytes follow.

use crate::error::OrcError;

//==================================================================================
// 0. Format Constants
//==================================================================================
pub const MIN_REPEAT: usize = 3;
pub const MAX_REPEAT: usize = 127 + MIN_REPEAT;
pub const MAX_LITERAL: usize = 128;

//==================================================================================
// 1. Streaming Encoder
//==================================================================================

/// Incremental byte-RLE encoder. Feed values with `write`, then `finish`.
#[derive(Debug, Default)]
pub struct ByteRleEncoder {
    output: Vec<u8>,
    literals: Vec<u8>,
    repeat: bool,
    tail_run_length: usize,
}

impl ByteRleEncoder {
    pub fn new() -> Self {
        Self {
            literals: Vec::with_capacity(MAX_LITERAL),
            ..Self::default()
        }
    }

    pub fn write(&mut self, value: u8) {
        if self.literals.is_empty() {
            self.literals.push(value);
            self.tail_run_length = 1;
        } else if self.repeat {
            if value == self.literals[0] {
                // In repeat mode `literals` only carries the run value; the
                // run length is tracked by `tail_run_length`.
                self.tail_run_length += 1;
                if self.tail_run_length == MAX_REPEAT {
                    self.flush_group();
                }
            } else {
                self.flush_group();
                self.literals.push(value);
                self.tail_run_length = 1;
            }
        } else {
            if Some(&value) == self.literals.last() {
                self.tail_run_length += 1;
            } else {
                self.tail_run_length = 1;
            }

            if self.tail_run_length == MIN_REPEAT {
                // The last two literals plus this value start a run.
                let keep = self.literals.len() + 1 - MIN_REPEAT;
                self.literals.truncate(keep);
                self.flush_group();
                self.literals.push(value);
                self.repeat = true;
                self.tail_run_length = MIN_REPEAT;
            } else {
                self.literals.push(value);
                if self.literals.len() == MAX_LITERAL {
                    self.flush_group();
                }
            }
        }
    }

    fn flush_group(&mut self) {
        if self.repeat {
            self.output.push((self.tail_run_length - MIN_REPEAT) as u8);
            self.output.push(self.literals[0]);
        } else if !self.literals.is_empty() {
            self.output.push((-(self.literals.len() as i16)) as u8);
            self.output.extend_from_slice(&self.literals);
        }
        self.literals.clear();
        self.repeat = false;
        self.tail_run_length = 0;
    }

    /// Flushes any pending group and returns the encoded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.flush_group();
        self.output
    }
}

//==================================================================================
// 2. Public API (Slice Operations)
//==================================================================================

/// Encodes a whole slice of bytes.
pub fn encode(input_slice: &[u8]) -> Vec<u8> {
    let mut encoder = ByteRleEncoder::new();
    for &b in input_slice {
        encoder.write(b);
    }
    encoder.finish()
}

/// Decodes a byte-RLE stream, expecting exactly `num_values` bytes.
pub fn decode(input_bytes: &[u8], num_values: usize) -> Result<Vec<u8>, OrcError> {
    let mut output = Vec::with_capacity(num_values);
    let mut pos = 0;

    while pos < input_bytes.len() {
        let control = input_bytes[pos] as i8;
        pos += 1;
        if control >= 0 {
            let run = control as usize + MIN_REPEAT;
            let value = *input_bytes.get(pos).ok_or_else(|| {
                OrcError::RleDecodeError("Truncated buffer: missing run value".to_string())
            })?;
            pos += 1;
            output.extend(std::iter::repeat(value).take(run));
        } else {
            let count = -(control as i16) as usize;
            let literals = input_bytes.get(pos..pos + count).ok_or_else(|| {
                OrcError::RleDecodeError("Truncated buffer: missing literals".to_string())
            })?;
            pos += count;
            output.extend_from_slice(literals);
        }
    }

    if output.len() != num_values {
        return Err(OrcError::RleDecodeError(format!(
            "Decoded to {} values, but expected {}",
            output.len(),
            num_values
        )));
    }
    Ok(output)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
