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

//! IBM System/34 family decoding: FM, MFM, and the RX02 hybrid that mixes
//! FM-encoded headers with MFM-encoded data within one track.

use crate::chs::Header;
use crate::crc16::crc16;
use crate::decode::peek_bits;
use crate::bitbuffer::BitBuffer;
use crate::sector::{DataRate, Dam, Encoding, Sector};
use crate::track::Track;
use log::trace;

/// Channel-bit pattern of an MFM-encoded 0xA1 sync byte (clock bit 4 is
/// deliberately omitted, making the pattern unique against ordinary data).
const MFM_SYNC_WORD: u32 = 0x4489;

/// Combined clock+data channel words for FM address marks.
const FM_INDEX_MARK: u32 = 0xF77A; // data 0xFC, clock 0xD7
const FM_ID_MARK: u32 = 0xF57E; // data 0xFE, clock 0xC7
const FM_DATA_MARK: u32 = 0xF56F; // data 0xFB, clock 0xC7
const FM_DELETED_MARK: u32 = 0xF56A; // data 0xF8, clock 0xC7

const IDAM_BYTE: u8 = 0xFE;

/// Decode an entire track's worth of FM, MFM, or RX02 sectors.
pub fn decode(bits: &BitBuffer, data_rate: DataRate, encoding: Encoding) -> Track {
    let mut track = Track::new();
    track.set_tracklen(bits.len() as u32);

    let mut pos = 0usize;
    while pos + 16 <= bits.len() {
        let id_encoding = if encoding == Encoding::Rx02 { Encoding::Fm } else { encoding };
        match find_id_mark(bits, pos, id_encoding) {
            Some((mark_pos, header, offset_bits, bad_id_crc)) => {
                let mut sector = Sector::new(header, data_rate, encoding, offset_bits);
                if bad_id_crc {
                    sector = sector.mark_bad_id_crc();
                    trace!("bad ID CRC at bit {offset_bits} for {:?}", header);
                    let _ = track.add(sector);
                    pos = mark_pos + 16;
                    continue;
                }

                let data_encoding = if encoding == Encoding::Rx02 { Encoding::Mfm } else { encoding };
                let search_from = mark_pos + 96;
                if let Some((dam, data, bad_data_crc)) =
                    find_data_mark(bits, search_from, search_from + 1024, data_encoding, header.size_bytes())
                {
                    sector.add(&data, bad_data_crc, dam);
                }
                let _ = track.add(sector);
                pos = mark_pos + 16;
            }
            None => break,
        }
    }
    track
}

/// Decode `count` data bytes starting at channel-bit `pos`, taking the
/// low (data) bit of every clock/data pair. Valid for both FM and MFM once
/// phase has been established by a sync/mark match.
fn decode_bytes(bits: &BitBuffer, pos: usize, count: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    let mut p = pos;
    for _ in 0..count {
        let mut byte = 0u8;
        for _ in 0..8 {
            let _clock = bits.get(p)?;
            let data = bits.get(p + 1)?;
            byte = (byte << 1) | (data as u8);
            p += 2;
        }
        out.push(byte);
    }
    Some(out)
}

/// Find the next IDAM, returning its sync position, decoded header, the
/// bit offset recorded on the sector, and whether its CRC failed.
fn find_id_mark(bits: &BitBuffer, from: usize, encoding: Encoding) -> Option<(usize, Header, u32, bool)> {
    let mut pos = from;
    while pos + 16 <= bits.len() {
        match encoding {
            Encoding::Fm => {
                if peek_bits(bits, pos, 16) == Some(FM_ID_MARK) {
                    let header_bytes = decode_bytes(bits, pos + 16, 6)?;
                    return Some(build_header(header_bytes, IDAM_BYTE, &[], pos));
                }
            }
            _ => {
                if peek_bits(bits, pos, 16) == Some(MFM_SYNC_WORD)
                    && peek_bits(bits, pos + 16, 16) == Some(MFM_SYNC_WORD)
                    && peek_bits(bits, pos + 32, 16) == Some(MFM_SYNC_WORD)
                {
                    let mark = decode_bytes(bits, pos + 48, 1)?[0];
                    if mark == IDAM_BYTE {
                        let header_bytes = decode_bytes(bits, pos + 64, 6)?;
                        return Some(build_header(header_bytes, IDAM_BYTE, &[0xA1, 0xA1, 0xA1], pos));
                    }
                }
            }
        }
        pos += 1;
    }
    None
}

fn build_header(header_bytes: Vec<u8>, mark: u8, sync_prefix: &[u8], offset_bits: usize) -> (usize, Header, u32, bool) {
    let header = Header::new(header_bytes[0] as u16, header_bytes[1], header_bytes[2], header_bytes[3]);
    let stored_crc = u16::from_be_bytes([header_bytes[4], header_bytes[5]]);
    let mut crc_input = sync_prefix.to_vec();
    crc_input.push(mark);
    crc_input.extend_from_slice(&header_bytes[..4]);
    let bad_crc = crc16(&crc_input) != stored_crc;
    (offset_bits, header, offset_bits as u32, bad_crc)
}

/// Find the next data mark (normal, deleted, or alternate) within
/// `[from, limit)`, returning the DAM kind, the decoded payload+CRC data
/// bytes (payload only, CRC stripped), and whether the data CRC failed.
fn find_data_mark(
    bits: &BitBuffer,
    from: usize,
    limit: usize,
    encoding: Encoding,
    size_bytes: usize,
) -> Option<(Dam, Vec<u8>, bool)> {
    let mut pos = from;
    while pos + 16 <= bits.len() && pos < limit {
        let (mark_word, sync_prefix): (Option<(u32, Dam)>, &[u8]) = match encoding {
            Encoding::Fm => {
                let word = peek_bits(bits, pos, 16)?;
                let found = if word == FM_DATA_MARK {
                    Some((FM_DATA_MARK, Dam::Normal))
                } else if word == FM_DELETED_MARK {
                    Some((FM_DELETED_MARK, Dam::DeletedF8))
                } else {
                    None
                };
                (found, &[])
            }
            _ => {
                if peek_bits(bits, pos, 16) == Some(MFM_SYNC_WORD)
                    && peek_bits(bits, pos + 16, 16) == Some(MFM_SYNC_WORD)
                    && peek_bits(bits, pos + 32, 16) == Some(MFM_SYNC_WORD)
                {
                    let mark_byte = decode_bytes(bits, pos + 48, 1)?[0];
                    let dam = Dam::from_byte(mark_byte);
                    (dam.map(|d| (0u32, d)), &[0xA1, 0xA1, 0xA1])
                }
                else {
                    (None, &[])
                }
            }
        };

        if let Some((_, dam)) = mark_word {
            let data_start = match encoding {
                Encoding::Fm => pos + 16,
                _ => pos + 64,
            };
            let payload_and_crc = decode_bytes(bits, data_start, size_bytes + 2)?;
            let (payload, crc_bytes) = payload_and_crc.split_at(size_bytes);
            let stored_crc = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
            let mut crc_input = sync_prefix.to_vec();
            crc_input.push(dam.byte());
            crc_input.extend_from_slice(payload);
            let bad_crc = crc16(&crc_input) != stored_crc;
            return Some((dam, payload.to_vec(), bad_crc));
        }
        pos += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc16::crc16;

    fn push_byte_mfm(buf: &mut BitBuffer, byte: u8, sync: bool) {
        // Emits 8 (clock, data) pairs. For a true 0xA1 sync the clock bit at
        // position 4 is suppressed (bit pattern 0x4489); for ordinary bytes
        // the clock bit is the complement of the two neighbouring data bits,
        // which is not required for these decode tests so a fixed 0 is used.
        if sync && byte == 0xA1 {
            for bit in [0, 1, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1] {
                buf.push_bit(bit == 1);
            }
            return;
        }
        for i in (0..8).rev() {
            buf.push_bit(false);
            buf.push_bit((byte >> i) & 1 == 1);
        }
    }

    #[test]
    fn decodes_one_mfm_sector_with_good_crcs() {
        let mut buf = BitBuffer::new(DataRate::Rate250Kbps);
        for _ in 0..40 {
            push_byte_mfm(&mut buf, 0x4E, false);
        }
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xFE, false);
        let header = [0u8, 0, 1, 2];
        for b in header {
            push_byte_mfm(&mut buf, b, false);
        }
        let id_crc = crc16(&[0xA1, 0xA1, 0xA1, 0xFE, 0, 0, 1, 2]);
        for b in id_crc.to_be_bytes() {
            push_byte_mfm(&mut buf, b, false);
        }
        for _ in 0..20 {
            push_byte_mfm(&mut buf, 0x4E, false);
        }
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xA1, true);
        push_byte_mfm(&mut buf, 0xFB, false);
        let data = vec![0x55u8; 512];
        for &b in &data {
            push_byte_mfm(&mut buf, b, false);
        }
        let mut crc_input = vec![0xA1, 0xA1, 0xA1, 0xFB];
        crc_input.extend_from_slice(&data);
        let data_crc = crc16(&crc_input);
        for b in data_crc.to_be_bytes() {
            push_byte_mfm(&mut buf, b, false);
        }

        let track = decode(&buf, DataRate::Rate250Kbps, Encoding::Mfm);
        assert_eq!(track.len(), 1);
        let sector = &track.sectors()[0];
        assert!(!sector.bad_id_crc);
        assert!(!sector.bad_data_crc);
        assert_eq!(sector.data(), Some(data.as_slice()));
    }
}
