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

//! AmigaDOS MFM decoding. Amiga sectors split every 32-bit word into its odd
//! and even bits before writing them as two back-to-back MFM longwords, so
//! the clock bits following each data bit never depend on data from the
//! *next* word. Header and data checksums are the XOR of the decoded
//! longwords, masked to `0x5555_5555`.

use crate::chs::Header;
use crate::decode::peek_bits;
use crate::bitbuffer::BitBuffer;
use crate::sector::{DataRate, Dam, Encoding, Sector};
use crate::track::Track;
use log::trace;

const SYNC_WORD: u32 = 0x4489;
const LABEL_LONGWORDS: usize = 16;
const SECTOR_DATA_BYTES: usize = 512;
const CHECKSUM_MASK: u32 = 0x5555_5555;

pub fn decode(bits: &BitBuffer, data_rate: DataRate) -> Track {
    let mut track = Track::new();
    track.set_tracklen(bits.len() as u32);

    let mut pos = 0usize;
    while pos + 32 <= bits.len() {
        if peek_bits(bits, pos, 16) == Some(SYNC_WORD) && peek_bits(bits, pos + 16, 16) == Some(SYNC_WORD) {
            let sync_pos = pos;
            let body_start = pos + 32;
            if let Some(sector) = decode_sector(bits, body_start, sync_pos as u32, data_rate) {
                let _ = track.add(sector);
            }
            pos = body_start;
        }
        else {
            pos += 1;
        }
    }
    track
}

/// Decode one odd/even-split 32-bit longword pair starting at bit `pos`;
/// returns the reassembled value and the position after both halves.
fn decode_odd_even_long(bits: &BitBuffer, pos: usize) -> Option<(u32, usize)> {
    let odd = decode_data_bits(bits, pos, 32)?;
    let even = decode_data_bits(bits, pos + 64, 32)?;
    let value = ((odd << 1) | even) & 0xFFFF_FFFF;
    Some((value, pos + 128))
}

/// Decode `count` raw data bits (every other channel bit, clock stripped)
/// into an integer, MSB-first.
fn decode_data_bits(bits: &BitBuffer, pos: usize, count: usize) -> Option<u32> {
    let mut value = 0u32;
    let mut p = pos;
    for _ in 0..count {
        let _clock = bits.get(p)?;
        let data = bits.get(p + 1)?;
        value = (value << 1) | (data as u32);
        p += 2;
    }
    Some(value)
}

fn decode_sector(bits: &BitBuffer, start: usize, offset_bits: u32, data_rate: DataRate) -> Option<Sector> {
    let mut pos = start;
    let (info, next) = decode_odd_even_long(bits, pos)?;
    pos = next;

    let mut label = Vec::with_capacity(LABEL_LONGWORDS);
    for _ in 0..LABEL_LONGWORDS {
        let (word, next) = decode_odd_even_long(bits, pos)?;
        label.push(word);
        pos = next;
    }

    let (header_checksum, next) = decode_odd_even_long(bits, pos)?;
    pos = next;
    let (data_checksum, next) = decode_odd_even_long(bits, pos)?;
    pos = next;

    let computed_header_checksum =
        (std::iter::once(info).chain(label.iter().copied()).fold(0u32, |acc, w| acc ^ w)) & CHECKSUM_MASK;
    let bad_id_crc = computed_header_checksum != header_checksum;

    let mut data = Vec::with_capacity(SECTOR_DATA_BYTES);
    let mut computed_data_checksum = 0u32;
    for _ in 0..(SECTOR_DATA_BYTES / 4) {
        let (word, next) = decode_odd_even_long(bits, pos)?;
        computed_data_checksum ^= word;
        data.extend_from_slice(&word.to_be_bytes());
        pos = next;
    }
    let bad_data_crc = (computed_data_checksum & CHECKSUM_MASK) != data_checksum;

    let format_byte = ((info >> 24) & 0xFF) as u8;
    let track_byte = ((info >> 16) & 0xFF) as u8;
    let sector_byte = ((info >> 8) & 0xFF) as u8;
    let cyl = (track_byte >> 1) as u16;
    let head = track_byte & 1;
    trace!("amiga sector fmt=0x{format_byte:02X} track={track_byte} sector={sector_byte}");

    let header = Header::new(cyl, head, sector_byte, 2);
    let mut sector = Sector::new(header, data_rate, Encoding::Amiga, offset_bits);
    if bad_id_crc {
        return Some(sector.mark_bad_id_crc());
    }
    sector.add(&data, bad_data_crc, Dam::Normal);
    Some(sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_channel_bit(buf: &mut BitBuffer, bit: bool) {
        buf.push_bit(bit);
    }

    /// Emit one odd/even-split longword, reversing [`decode_odd_even_long`].
    fn push_odd_even_long(buf: &mut BitBuffer, value: u32) {
        let even = value & CHECKSUM_MASK;
        let odd = (value >> 1) & CHECKSUM_MASK;
        for word in [odd, even] {
            for i in (0..32).rev() {
                push_channel_bit(buf, false); // clock bit, unused by the decoder
                push_channel_bit(buf, (word >> i) & 1 == 1);
            }
        }
    }

    fn push_sync(buf: &mut BitBuffer) {
        for &bit in &[0, 1, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1] {
            push_channel_bit(buf, bit == 1);
        }
    }

    #[test]
    fn decodes_one_amiga_sector_with_good_checksums() {
        let mut buf = BitBuffer::new(DataRate::Rate250Kbps);
        push_sync(&mut buf);
        push_sync(&mut buf);

        let info = (0xFFu32 << 24) | (0x02u32 << 16) | (0x03u32 << 8);
        let label = [0u32; LABEL_LONGWORDS];
        let header_checksum = (std::iter::once(info).chain(label.iter().copied()).fold(0u32, |a, w| a ^ w)) & CHECKSUM_MASK;

        let data: Vec<u8> = (0..SECTOR_DATA_BYTES).map(|i| (i % 256) as u8).collect();
        let mut data_checksum = 0u32;
        for chunk in data.chunks(4) {
            data_checksum ^= u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        data_checksum &= CHECKSUM_MASK;

        push_odd_even_long(&mut buf, info);
        for &word in &label {
            push_odd_even_long(&mut buf, word);
        }
        push_odd_even_long(&mut buf, header_checksum);
        push_odd_even_long(&mut buf, data_checksum);
        for chunk in data.chunks(4) {
            push_odd_even_long(&mut buf, u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let track = decode(&buf, DataRate::Rate250Kbps);
        assert_eq!(track.len(), 1);
        let sector = &track.sectors()[0];
        assert!(!sector.bad_id_crc);
        assert!(!sector.bad_data_crc);
        assert_eq!(sector.header.sector_id, 3);
        assert_eq!(sector.data(), Some(data.as_slice()));
    }
}
