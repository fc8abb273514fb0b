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

//! Apple-II-family GCR decoding (6-and-2 data nibblization, 4-and-4 address
//! fields) shared by the `Gcr`, `Ace`, `Mx`, and `Agat` encodings, which
//! differ only in their prologue/epilogue nibble sequences.

use crate::chs::Header;
use crate::decode::peek_bits;
use crate::bitbuffer::BitBuffer;
use crate::sector::{DataRate, Dam, Encoding, Sector};
use crate::track::Track;

const SECONDARY_COUNT: usize = 86;
const SECTOR_DATA_BYTES: usize = 256;

/// 6-bit value -> "disk byte" (self-clocking, top bit always set, no two
/// adjacent zero bits). The standard Apple DOS 3.3 / ProDOS table.
const GCR62_ENCODE: [u8; 64] = [
    0x96, 0x97, 0x9a, 0x9b, 0x9d, 0x9e, 0x9f, 0xa6, 0xa7, 0xab, 0xac, 0xad, 0xae, 0xaf, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
    0xb7, 0xb9, 0xba, 0xbb, 0xbc, 0xbd, 0xbe, 0xbf, 0xcb, 0xcd, 0xce, 0xcf, 0xd3, 0xd6, 0xd7, 0xd9, 0xda, 0xdb, 0xdc,
    0xdd, 0xde, 0xdf, 0xe5, 0xe6, 0xe7, 0xe9, 0xea, 0xeb, 0xec, 0xed, 0xee, 0xef, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7,
    0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0xfe, 0xff,
];

fn gcr62_decode_table() -> [u8; 256] {
    let mut table = [0xFFu8; 256];
    for (value, &byte) in GCR62_ENCODE.iter().enumerate() {
        table[byte as usize] = value as u8;
    }
    table
}

/// Prologue/epilogue byte triples for each GCR-family encoding's address
/// and data fields.
fn marks_for(encoding: Encoding) -> ([u8; 3], [u8; 3]) {
    match encoding {
        Encoding::Ace => ([0xD5, 0xAA, 0x96], [0xD5, 0xAA, 0xB5]),
        Encoding::Mx => ([0xD4, 0xAA, 0x96], [0xD4, 0xAA, 0xAD]),
        Encoding::Agat => ([0xD5, 0xAA, 0x97], [0xD5, 0xAA, 0xAD]),
        _ => ([0xD5, 0xAA, 0x96], [0xD5, 0xAA, 0xAD]),
    }
}

pub fn decode(bits: &BitBuffer, data_rate: DataRate, encoding: Encoding) -> Track {
    let mut track = Track::new();
    track.set_tracklen(bits.len() as u32);
    let table = gcr62_decode_table();
    let (addr_prologue, data_prologue) = marks_for(encoding);

    let mut pos = 0usize;
    let mut pending_header: Option<(usize, Header, bool)> = None;
    while pos + 8 <= bits.len() {
        if let Some(byte) = peek_byte(bits, pos) {
            if [byte, peek_byte(bits, pos + 8).unwrap_or(0), peek_byte(bits, pos + 16).unwrap_or(0)]
                == addr_prologue
            {
                if let Some((header, bad_id_crc, next)) = decode_address_field(bits, pos + 24) {
                    pending_header = Some((pos, header, bad_id_crc));
                    pos = next;
                    continue;
                }
            }
            else if [byte, peek_byte(bits, pos + 8).unwrap_or(0), peek_byte(bits, pos + 16).unwrap_or(0)]
                == data_prologue
            {
                if let Some((offset_bits, header, bad_id_crc)) = pending_header.take() {
                    let mut sector = Sector::new(header, data_rate, encoding, offset_bits as u32);
                    if bad_id_crc {
                        let _ = track.add(sector.mark_bad_id_crc());
                    }
                    else if let Some((data, bad_data_crc, next)) = decode_data_field(bits, pos + 24, &table) {
                        sector.add(&data, bad_data_crc, Dam::Normal);
                        let _ = track.add(sector);
                        pos = next;
                        continue;
                    }
                    else {
                        let _ = track.add(sector);
                    }
                }
            }
        }
        pos += 1;
    }
    track
}

fn peek_byte(bits: &BitBuffer, pos: usize) -> Option<u8> {
    peek_bits(bits, pos, 8).map(|v| v as u8)
}

/// Decode a 4-and-4 encoded byte pair (odd byte, then even byte) back into
/// the original byte.
fn decode_4_and_4(odd: u8, even: u8) -> u8 {
    ((odd << 1) | 0x01) & even
}

fn decode_address_field(bits: &BitBuffer, pos: usize) -> Option<(Header, bool, usize)> {
    let mut p = pos;
    let mut read_pair = |bits: &BitBuffer, p: &mut usize| -> Option<u8> {
        let odd = peek_byte(bits, *p)?;
        let even = peek_byte(bits, *p + 8)?;
        *p += 16;
        Some(decode_4_and_4(odd, even))
    };
    let volume = read_pair(bits, &mut p)?;
    let track = read_pair(bits, &mut p)?;
    let sector = read_pair(bits, &mut p)?;
    let checksum = read_pair(bits, &mut p)?;
    let bad_id_crc = (volume ^ track ^ sector) != checksum;
    let header = Header::new(track as u16, 0, sector, 0);
    Some((header, bad_id_crc, p + 24)) // skip trailing epilogue nibbles
}

/// Decode a 6-and-2 nibblized 342-byte data field into 256 raw bytes and a
/// checksum-validity flag. The secondary/primary buffer split and XOR
/// checksum chain follow the standard Apple DOS 3.3 scheme.
fn decode_data_field(bits: &BitBuffer, pos: usize, table: &[u8; 256]) -> Option<(Vec<u8>, bool, usize)> {
    let mut p = pos;
    let mut raw6 = [0u8; 343];
    for slot in raw6.iter_mut() {
        let disk_byte = peek_byte(bits, p)?;
        let value = table[disk_byte as usize];
        if value == 0xFF {
            return None;
        }
        *slot = value;
        p += 8;
    }

    let mut secondary = [0u8; SECONDARY_COUNT];
    let mut primary = [0u8; SECTOR_DATA_BYTES];
    let mut chk = 0u8;
    for (i, slot) in secondary.iter_mut().enumerate() {
        chk ^= raw6[i];
        *slot = chk;
    }
    for (i, slot) in primary.iter_mut().enumerate() {
        chk ^= raw6[SECONDARY_COUNT + i];
        *slot = chk;
    }
    let bad_crc = chk != raw6[342];

    let mut out = Vec::with_capacity(SECTOR_DATA_BYTES);
    for (i, &hi) in primary.iter().enumerate() {
        let idx = i % SECONDARY_COUNT;
        let shift = (i / SECONDARY_COUNT) * 2;
        let low = (secondary[idx] >> shift) & 0x03;
        let low = ((low & 1) << 1) | ((low >> 1) & 1);
        out.push((hi << 2) | low);
    }
    Some((out, bad_crc, p + 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_byte(buf: &mut BitBuffer, byte: u8) {
        for i in (0..8).rev() {
            buf.push_bit((byte >> i) & 1 == 1);
        }
    }

    #[test]
    fn decode_4_and_4_roundtrips() {
        for value in 0..=255u8 {
            let odd = (value >> 1) | 0xAA;
            let even = value | 0xAA;
            assert_eq!(decode_4_and_4(odd, even), value);
        }
    }

    #[test]
    fn decodes_address_field_with_good_checksum() {
        let mut buf = BitBuffer::new(DataRate::Rate250Kbps);
        push_byte(&mut buf, 0xD5);
        push_byte(&mut buf, 0xAA);
        push_byte(&mut buf, 0x96);
        let (volume, track, sector) = (0x00u8, 5u8, 3u8);
        let checksum = volume ^ track ^ sector;
        for value in [volume, track, sector, checksum] {
            push_byte(&mut buf, (value >> 1) | 0xAA);
            push_byte(&mut buf, value | 0xAA);
        }
        let (header, bad_id_crc, _) = decode_address_field(&buf, 24).unwrap();
        assert!(!bad_id_crc);
        assert_eq!(header.cyl, 5);
        assert_eq!(header.sector_id, 3);
    }
}
