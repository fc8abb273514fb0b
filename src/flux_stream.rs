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

//! Decodes a KryoFlux-style STREAM capture into per-revolution
//! [`FluxData`]. Pure byte-record parsing: no device or file I/O.

use crate::error::{DiskImageError, Result};
use crate::flux::FluxData;

const NOP1: u8 = 0x08;
const NOP2: u8 = 0x09;
const NOP3: u8 = 0x0A;
const OVL16: u8 = 0x0B;
const FLUX3: u8 = 0x0C;
const OOB: u8 = 0x0D;

const OOB_STREAM_INFO: u8 = 0x01;
const OOB_INDEX_TIMESTAMP: u8 = 0x02;
const OOB_STREAM_END: u8 = 0x03;
const OOB_KF_INFO: u8 = 0x04;
const OOB_END_OF_STREAM: u8 = 0x0D;

/// Master-clock-derived sample rate used when a stream carries no KFInfo
/// `sck=` field. Matches the commonly published KryoFlux default.
const DEFAULT_SCK_HZ: f64 = 24_027_428.571_428_6;

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    overflow: u64,
    ns_per_tick: f64,
    current: Vec<u32>,
    revolutions: Vec<Vec<u32>>,
    seen_first_index: bool,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            overflow: 0,
            ns_per_tick: 1e9 / DEFAULT_SCK_HZ,
            current: Vec::new(),
            revolutions: Vec::new(),
            seen_first_index: false,
        }
    }

    fn push_interval(&mut self, raw_ticks: u32) {
        let ticks = raw_ticks as u64 + self.overflow;
        self.overflow = 0;
        let ns = (ticks as f64 * self.ns_per_tick).round() as u32;
        self.current.push(ns);
    }

    fn on_index(&mut self) {
        if self.seen_first_index {
            self.revolutions.push(std::mem::take(&mut self.current));
        }
        else {
            self.seen_first_index = true;
            self.current.clear();
        }
    }

    fn apply_kf_info(&mut self, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        for field in text.split(',') {
            if let Some(value) = field.strip_prefix("sck=") {
                if let Ok(sck) = value.trim().parse::<f64>() {
                    if sck > 0.0 {
                        self.ns_per_tick = 1e9 / sck;
                    }
                }
            }
        }
    }

    fn run(mut self) -> Result<Vec<FluxData>> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                0x00..=0x07 => {
                    let low = *self.bytes.get(self.pos + 1).ok_or(stream_underrun())?;
                    self.push_interval(((b as u32) << 8) | low as u32);
                    self.pos += 2;
                }
                NOP1 => self.pos += 1,
                NOP2 => self.pos += 2,
                NOP3 => self.pos += 3,
                OVL16 => {
                    self.overflow += 0x10000;
                    self.pos += 1;
                }
                FLUX3 => {
                    let hi = *self.bytes.get(self.pos + 1).ok_or(stream_underrun())?;
                    let lo = *self.bytes.get(self.pos + 2).ok_or(stream_underrun())?;
                    self.push_interval(((hi as u32) << 8) | lo as u32);
                    self.pos += 3;
                }
                OOB => {
                    let subtype = *self.bytes.get(self.pos + 1).ok_or(stream_underrun())?;
                    let size_lo = *self.bytes.get(self.pos + 2).ok_or(stream_underrun())?;
                    let size_hi = *self.bytes.get(self.pos + 3).ok_or(stream_underrun())?;
                    let size = u16::from_le_bytes([size_lo, size_hi]) as usize;
                    let payload_start = self.pos + 4;
                    let payload = self.bytes.get(payload_start..payload_start + size).ok_or(stream_underrun())?;

                    match subtype {
                        OOB_INDEX_TIMESTAMP => self.on_index(),
                        OOB_KF_INFO => self.apply_kf_info(payload),
                        OOB_STREAM_INFO | OOB_STREAM_END => {}
                        OOB_END_OF_STREAM => {
                            self.pos = self.bytes.len();
                            break;
                        }
                        _ => {}
                    }
                    self.pos = payload_start + size;
                }
                _ => {
                    self.push_interval(b as u32);
                    self.pos += 1;
                }
            }
        }
        Ok(self
            .revolutions
            .into_iter()
            .map(|revolution| FluxData::from_revolutions(vec![revolution]))
            .collect())
    }
}

fn stream_underrun() -> DiskImageError {
    DiskImageError::CorruptImage("flux stream truncated mid-record".to_string())
}

/// Decode a raw STREAM capture, returning one [`FluxData`] per completed
/// revolution (the segment between two index-timestamp records). A partial
/// segment before the first index, or trailing the last, is discarded.
pub fn decode_stream(bytes: &[u8]) -> Result<Vec<FluxData>> {
    Decoder::new(bytes).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_chunk() -> Vec<u8> {
        let mut chunk = vec![OOB, OOB_INDEX_TIMESTAMP];
        chunk.extend_from_slice(&12u16.to_le_bytes());
        chunk.extend_from_slice(&[0u8; 12]);
        chunk
    }

    #[test]
    fn discards_partial_segment_before_first_index() {
        let mut stream = vec![10u8, 20u8];
        stream.extend(index_chunk());
        stream.extend([30u8, 40u8]);
        stream.extend(index_chunk());

        let revs = decode_stream(&stream).unwrap();
        assert_eq!(revs.len(), 1);
        assert_eq!(revs[0].revolutions()[0].len(), 2);
    }

    #[test]
    fn two_byte_flux_record_decodes_high_low() {
        let mut stream = vec![0x00u8, 0x64]; // 100 ticks
        stream.extend(index_chunk());
        stream.extend(index_chunk());
        let revs = decode_stream(&stream).unwrap();
        assert_eq!(revs.len(), 1);
        assert_eq!(revs[0].revolutions()[0].len(), 1);
    }

    #[test]
    fn kf_info_overrides_default_clock() {
        let mut stream = Vec::new();
        let info = b"name=x,sck=1000000,end".to_vec();
        stream.push(OOB);
        stream.push(OOB_KF_INFO);
        stream.extend_from_slice(&(info.len() as u16).to_le_bytes());
        stream.extend_from_slice(&info);
        stream.extend(index_chunk());
        stream.push(200); // one-byte interval
        stream.extend(index_chunk());

        let revs = decode_stream(&stream).unwrap();
        assert_eq!(revs[0].revolutions()[0][0], 200_000); // 200 ticks @ 1MHz = 200us
    }

    #[test]
    fn overflow_escape_extends_next_interval() {
        let mut stream = vec![OVL16, 5u8];
        stream.extend(index_chunk());
        stream.extend(index_chunk());
        let revs = decode_stream(&stream).unwrap();
        // one interval of 0x10005 ticks at the default clock
        assert_eq!(revs[0].revolutions()[0].len(), 1);
    }
}
