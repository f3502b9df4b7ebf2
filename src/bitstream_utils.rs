// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Bit-level packing of hardware tables.
//!
//! The codec blocks consume their auxiliary tables as little-endian bit streams: the first field
//! written lands in the least significant bits of the first byte. [`TableWriter`] packs fields of
//! up to 32 bits into a caller supplied buffer, either sequentially through a cursor or at fixed
//! bit positions for records with a documented layout.

use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum TableWriterError {
    InvalidBitCount(usize),
    FieldOverflow { value: u32, bits: usize },
    OutOfSpace { bit_pos: usize, len: usize },
    CheckpointMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TableWriterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableWriterError::InvalidBitCount(bits) => write!(f, "invalid bit count {}", bits),
            TableWriterError::FieldOverflow { value, bits } => {
                write!(f, "value {:#x} does not fit in {} bits", value, bits)
            }
            TableWriterError::OutOfSpace { bit_pos, len } => {
                write!(f, "write at bit {} past end of {}-byte table", bit_pos, len)
            }
            TableWriterError::CheckpointMismatch { expected, actual } => {
                write!(f, "table cursor at byte {} but expected {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for TableWriterError {}

pub type TableWriterResult<T> = std::result::Result<T, TableWriterError>;

pub struct TableWriter<'a> {
    out: &'a mut [u8],
    bit_pos: usize,
}

impl<'a> TableWriter<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, bit_pos: 0 }
    }

    /// Writes a fixed bit size integer (up to 32 bits) at the cursor and advances it.
    pub fn write_f<T: Into<u32>>(&mut self, bits: usize, value: T) -> TableWriterResult<()> {
        let pos = self.bit_pos;
        self.put(pos, bits, value.into())?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Writes a single bit at the cursor.
    pub fn write_bit(&mut self, bit: bool) -> TableWriterResult<()> {
        self.write_f(1, bit as u32)
    }

    /// Writes each byte of `values` as an 8-bit field.
    pub fn write_bytes(&mut self, values: &[u8]) -> TableWriterResult<()> {
        for &v in values {
            self.write_f(8, v)?;
        }
        Ok(())
    }

    /// Writes `value` at an absolute bit position without moving the cursor.
    pub fn write_at(&mut self, bit_offset: usize, bits: usize, value: u32) -> TableWriterResult<()> {
        self.put(bit_offset, bits, value)
    }

    /// Advances the cursor to the next multiple of `bits`, zeroing the skipped bits.
    pub fn align(&mut self, bits: usize) -> TableWriterResult<()> {
        let rem = self.bit_pos % bits;
        if rem != 0 {
            let mut pad = bits - rem;
            while pad > 0 {
                let chunk = pad.min(32);
                self.write_f(chunk, 0u32)?;
                pad -= chunk;
            }
        }
        Ok(())
    }

    /// Fails unless the cursor sits exactly at byte `expected`.
    pub fn checkpoint(&self, expected: usize) -> TableWriterResult<()> {
        if self.bit_pos != expected * 8 {
            return Err(TableWriterError::CheckpointMismatch {
                expected,
                actual: self.bit_pos / 8,
            });
        }
        Ok(())
    }

    /// Moves the cursor to an absolute byte position.
    pub fn seek_byte(&mut self, byte: usize) {
        self.bit_pos = byte * 8;
    }

    pub fn bit_pos(&self) -> usize {
        self.bit_pos
    }

    /// Byte position of the cursor, rounded up when a byte is partially written.
    pub fn byte_pos(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    fn put(&mut self, bit_offset: usize, bits: usize, value: u32) -> TableWriterResult<()> {
        if bits == 0 || bits > 32 {
            return Err(TableWriterError::InvalidBitCount(bits));
        }
        if bits < 32 && value >> bits != 0 {
            log::warn!("field of {} bits cannot hold {:#x}", bits, value);
            return Err(TableWriterError::FieldOverflow { value, bits });
        }
        if bit_offset + bits > self.out.len() * 8 {
            return Err(TableWriterError::OutOfSpace {
                bit_pos: bit_offset,
                len: self.out.len(),
            });
        }

        for i in 0..bits {
            let pos = bit_offset + i;
            let mask = 1u8 << (pos % 8);
            let byte = &mut self.out[pos / 8];
            if value & (1 << i) != 0 {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first_packing() {
        let mut buf = [0xffu8; 4];
        let mut w = TableWriter::new(&mut buf);
        w.write_f(4, 0x5u32).unwrap();
        w.write_f(8, 0xabu32).unwrap();
        w.write_bit(true).unwrap();
        w.align(32).unwrap();
        assert_eq!(w.byte_pos(), 4);
        assert_eq!(buf, [0xb5, 0x1a, 0x00, 0x00]);
    }

    #[test]
    fn test_write_at_preserves_neighbours() {
        let mut buf = [0u8; 8];
        let mut w = TableWriter::new(&mut buf);
        w.write_at(38, 9, 120).unwrap();
        w.write_at(0, 4, 0xf).unwrap();
        assert_eq!(w.bit_pos(), 0);
        let word = u64::from_le_bytes(buf);
        assert_eq!((word >> 38) & 0x1ff, 120);
        assert_eq!(word & 0xf, 0xf);
    }

    #[test]
    fn test_overflow_and_bounds() {
        let mut buf = [0u8; 2];
        let mut w = TableWriter::new(&mut buf);
        assert_eq!(
            w.write_f(3, 8u32),
            Err(TableWriterError::FieldOverflow { value: 8, bits: 3 })
        );
        assert_eq!(w.write_f(33, 0u32), Err(TableWriterError::InvalidBitCount(33)));
        w.write_f(16, 0xffffu32).unwrap();
        assert!(matches!(
            w.write_bit(false),
            Err(TableWriterError::OutOfSpace { .. })
        ));
    }

    #[test]
    fn test_checkpoint() {
        let mut buf = [0u8; 32];
        let mut w = TableWriter::new(&mut buf);
        w.write_bytes(&[1, 2, 3]).unwrap();
        assert!(w.checkpoint(3).is_ok());
        w.align(128).unwrap();
        assert!(w.checkpoint(16).is_ok());
        assert_eq!(
            w.checkpoint(3),
            Err(TableWriterError::CheckpointMismatch {
                expected: 3,
                actual: 16
            })
        );
    }
}
