//! This module contains the kernels for integer delta/run-length encoding.
//!
//! The stream is a sequence of groups, each introduced by a control byte:
//!
//! * **Run** (`0..=127`): `control + 3` values forming an arithmetic sequence.
//!   The control byte is followed by the step as a signed byte and the first
//!   value as a varint. A step of zero is a plain repeat.
//! * **Literals** (`-1..=-128` as `i8`): that many values follow, each as a varint.
//!
//! Values are zig-zagged before varint encoding when the stream is signed.
//! A run needs at least [`MIN_REPEAT`] values sharing one step; shorter
//! stretches stay literal.

use std::io::Cursor;

use super::leb128;
use crate::error::OrcError;

//==================================================================================
// 0. Format Constants
//==================================================================================
pub const MIN_REPEAT: usize = 3;
pub const MAX_REPEAT: usize = 127 + MIN_REPEAT;
pub const MAX_LITERAL: usize = 128;
const MIN_DELTA: i128 = -128;
const MAX_DELTA: i128 = 127;

//==================================================================================
// 1. Streaming Encoder
//==================================================================================

/// Incremental run-length encoder for 64-bit integers.
#[derive(Debug)]
pub struct IntRleEncoder {
    signed: bool,
    output: Vec<u8>,
    literals: Vec<i64>,
    /// In repeat mode, the number of values in the current run.
    run_length: usize,
    repeat: bool,
    delta: i128,
    tail_run_length: usize,
}

impl IntRleEncoder {
    pub fn new(signed: bool) -> Self {
        Self {
            signed,
            output: Vec::new(),
            literals: Vec::with_capacity(MAX_LITERAL),
            run_length: 0,
            repeat: false,
            delta: 0,
            tail_run_length: 0,
        }
    }

    pub fn write(&mut self, value: i64) -> Result<(), OrcError> {
        if self.literals.is_empty() {
            self.literals.push(value);
            self.tail_run_length = 1;
            return Ok(());
        }

        if self.repeat {
            let expected = self.literals[0] as i128 + self.delta * self.run_length as i128;
            if value as i128 == expected {
                self.run_length += 1;
                if self.run_length == MAX_REPEAT {
                    self.flush_group()?;
                }
            } else {
                self.flush_group()?;
                self.literals.push(value);
                self.tail_run_length = 1;
            }
            return Ok(());
        }

        // Literal mode: track how many trailing values share one step.
        let last = self.literals[self.literals.len() - 1] as i128;
        let step = value as i128 - last;
        if self.tail_run_length > 1 && step == self.delta {
            self.tail_run_length += 1;
        } else {
            self.delta = step;
            self.tail_run_length = if (MIN_DELTA..=MAX_DELTA).contains(&step) {
                2
            } else {
                1
            };
        }

        if self.tail_run_length == MIN_REPEAT {
            // The last two literals plus this value become the start of a run.
            let keep = self.literals.len() + 1 - MIN_REPEAT;
            let base = self.literals[keep];
            self.literals.truncate(keep);
            let delta = self.delta;
            self.flush_group()?;
            self.literals.push(base);
            self.delta = delta;
            self.repeat = true;
            self.run_length = MIN_REPEAT;
        } else {
            self.literals.push(value);
            if self.literals.len() == MAX_LITERAL {
                self.flush_group()?;
            }
        }
        Ok(())
    }

    fn write_varint(&mut self, value: i64) -> Result<(), OrcError> {
        if self.signed {
            leb128::encode_signed(value, &mut self.output)
        } else {
            leb128::encode_one(value as u64, &mut self.output)
        }
    }

    fn flush_group(&mut self) -> Result<(), OrcError> {
        if self.repeat {
            self.output.push((self.run_length - MIN_REPEAT) as u8);
            self.output.push(self.delta as i8 as u8);
            let base = self.literals[0];
            self.write_varint(base)?;
        } else if !self.literals.is_empty() {
            self.output.push((-(self.literals.len() as i16)) as u8);
            let literals = std::mem::take(&mut self.literals);
            for &v in &literals {
                self.write_varint(v)?;
            }
            self.literals = literals;
        }
        self.literals.clear();
        self.repeat = false;
        self.run_length = 0;
        self.tail_run_length = 0;
        self.delta = 0;
        Ok(())
    }

    /// Flushes any pending group and returns the encoded bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, OrcError> {
        self.flush_group()?;
        Ok(self.output)
    }
}

//==================================================================================
// 2. Public API (Slice Operations)
//==================================================================================

/// Encodes a slice of integers. `signed` selects zig-zag varints.
pub fn encode(values: &[i64], signed: bool) -> Result<Vec<u8>, OrcError> {
    let mut encoder = IntRleEncoder::new(signed);
    for &v in values {
        encoder.write(v)?;
    }
    encoder.finish()
}

/// Decodes a run-length integer stream holding exactly `num_values` values.
pub fn decode(input_bytes: &[u8], num_values: usize, signed: bool) -> Result<Vec<i64>, OrcError> {
    let mut output = Vec::with_capacity(num_values);
    let mut cursor = Cursor::new(input_bytes);

    let read_value = |cursor: &mut Cursor<&[u8]>| -> Result<i64, OrcError> {
        if signed {
            leb128::decode_signed(cursor)
        } else {
            leb128::decode_one::<u64>(cursor).map(|v| v as i64)
        }
    };

    while (cursor.position() as usize) < input_bytes.len() {
        let pos = cursor.position() as usize;
        let control = input_bytes[pos] as i8;
        cursor.set_position(pos as u64 + 1);

        if control >= 0 {
            let run = control as usize + MIN_REPEAT;
            let pos = cursor.position() as usize;
            let delta = *input_bytes.get(pos).ok_or_else(|| {
                OrcError::RleDecodeError("Truncated buffer: missing run delta".to_string())
            })? as i8 as i64;
            cursor.set_position(pos as u64 + 1);
            let base = read_value(&mut cursor)?;
            for i in 0..run as i64 {
                output.push(base.wrapping_add(delta.wrapping_mul(i)));
            }
        } else {
            let count = -(control as i16) as usize;
            for _ in 0..count {
                output.push(read_value(&mut cursor)?);
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_run() {
        // 100 sevens: run header 97, delta 0, base 7.
        let encoded = encode(&[7; 100], false).unwrap();
        assert_eq!(encoded, vec![97, 0x00, 7]);
    }

    #[test]
    fn test_descending_run_signed() {
        // 100 down to 1: run header 97, delta -1, zig-zag(100) = 200.
        let values: Vec<i64> = (1..=100).rev().collect();
        let encoded = encode(&values, true).unwrap();
        assert_eq!(encoded, vec![97, 0xFF, 0xC8, 0x01]);
        assert_eq!(decode(&encoded, values.len(), true).unwrap(), values);
    }

    #[test]
    fn test_two_equal_values_stay_literal() {
        let encoded = encode(&[5, 5], false).unwrap();
        assert_eq!(encoded, vec![0xFE, 5, 5]);
    }

    #[test]
    fn test_literals_then_run() {
        let values = [2, 3, 6, 7, 11, 11, 11, 11];
        let encoded = encode(&values, false).unwrap();
        // Four literals, then a run of four elevens with step 0.
        assert_eq!(encoded, vec![0xFC, 2, 3, 6, 7, 1, 0, 11]);
        assert_eq!(decode(&encoded, values.len(), false).unwrap(), values);
    }

    #[test]
    fn test_large_steps_never_form_runs() {
        let values: Vec<i64> = (0..10).map(|i| i * 1000).collect();
        let encoded = encode(&values, true).unwrap();
        assert_eq!(encoded[0], (-10i8) as u8);
        assert_eq!(decode(&encoded, values.len(), true).unwrap(), values);
    }

    #[test]
    fn test_extremes_roundtrip() {
        let values = [i64::MIN, i64::MAX, i64::MIN, 0, -1, -1, -1, i64::MAX];
        let encoded = encode(&values, true).unwrap();
        assert_eq!(decode(&encoded, values.len(), true).unwrap(), values);
    }

    #[test]
    fn test_mixed_roundtrip_crosses_group_limits() {
        let values: Vec<i64> = (0..2000i64)
            .map(|i| match i % 300 {
                0..=149 => i / 3,
                150..=199 => (i * 7919) % 1013,
                _ => -i,
            })
            .collect();
        for signed in [true, false] {
            let input: Vec<i64> = if signed {
                values.clone()
            } else {
                values.iter().map(|v| v.abs()).collect()
            };
            let encoded = encode(&input, signed).unwrap();
            assert_eq!(decode(&encoded, input.len(), signed).unwrap(), input);
        }
    }

    #[test]
    fn test_decode_count_mismatch() {
        let encoded = encode(&[1, 2, 3, 4], false).unwrap();
        assert!(decode(&encoded, 5, false).is_err());
    }
}
