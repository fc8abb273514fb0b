/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! [`BitBuffer`]: a bit-addressable bitstream recovered from flux, with a
//! data rate and the index/splice positions needed for write-back alignment.

use crate::error::{DiskImageError, Result};
use crate::sector::DataRate;
use bit_vec::BitVec;

#[derive(Debug, Clone)]
pub struct BitBuffer {
    bits: BitVec,
    data_rate: DataRate,
    index_bit: u32,
    splice_bit: Option<u32>,
}

impl BitBuffer {
    pub fn new(data_rate: DataRate) -> Self {
        Self { bits: BitVec::new(), data_rate, index_bit: 0, splice_bit: None }
    }

    pub fn from_bits(bits: BitVec, data_rate: DataRate) -> Self {
        Self { bits, data_rate, index_bit: 0, splice_bit: None }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    pub fn index_bit(&self) -> u32 {
        self.index_bit
    }

    pub fn set_index_bit(&mut self, bit: u32) {
        self.index_bit = bit;
    }

    pub fn splice_bit(&self) -> Option<u32> {
        self.splice_bit
    }

    pub fn set_splice_bit(&mut self, bit: Option<u32>) {
        self.splice_bit = bit;
    }

    pub fn push_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index)
    }

    /// Read `count` bits MSB-first starting at `start`, returning them
    /// packed into bytes (the final byte zero-padded if `count` is not a
    /// multiple of 8).
    pub fn read_bits(&self, start: usize, count: usize) -> Result<Vec<u8>> {
        if start + count > self.bits.len() {
            return Err(DiskImageError::SeekError(format!(
                "read of {count} bits at {start} exceeds buffer length {}",
                self.bits.len()
            )));
        }
        let mut out = vec![0u8; count.div_ceil(8)];
        for i in 0..count {
            if self.bits[start + i] {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Ok(out)
    }

    pub fn iter_from(&self, start: usize) -> BitBufferIter<'_> {
        BitBufferIter { buf: self, pos: start }
    }
}

pub struct BitBufferIter<'a> {
    buf: &'a BitBuffer,
    pos: usize,
}

impl<'a> Iterator for BitBufferIter<'a> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let bit = self.buf.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_roundtrip() {
        let mut buf = BitBuffer::new(DataRate::Rate250Kbps);
        for bit in [true, false, true, false, false, true, false, false] {
            buf.push_bit(bit);
        }
        assert_eq!(buf.read_bits(0, 8).unwrap(), vec![0b1010_0100]);
    }

    #[test]
    fn iter_from_respects_start_offset() {
        let mut buf = BitBuffer::new(DataRate::Rate250Kbps);
        for bit in [true, true, false, false] {
            buf.push_bit(bit);
        }
        let collected: Vec<bool> = buf.iter_from(2).collect();
        assert_eq!(collected, vec![false, false]);
    }
}
