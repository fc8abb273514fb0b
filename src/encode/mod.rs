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

//! Track encoders: the inverse of [`crate::decode`], turning a [`Format`]
//! and its sector payloads back into raw medium-level data.

pub mod bitstream_buffer;
pub mod flux_buffer;

use crate::bitbuffer::BitBuffer;
use crate::chs::Header;
use crate::crc16::{Crc16, A1A1A1};
use crate::format::Format;
use crate::sector::{Dam, Encoding};

/// Channel clock byte that produces the MFM sync pattern (`0x4489`) when
/// interleaved with data byte `0xA1`.
pub(crate) const MFM_SYNC_CLOCK: u8 = 0x0A;

/// IBM System/34 gap fill byte.
const GAP_FILL_BYTE: u8 = 0x4E;

/// Address-mark category passed to [`TrackBuffer::add_am`]. Dispatches to a
/// concrete mark byte, and to the FM clock pattern that byte is written
/// with (MFM marks all share the missing-clock A1 sync prefix instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMark {
    Index,
    Id,
    Data(Dam),
}

impl AddressMark {
    fn byte(self) -> u8 {
        match self {
            AddressMark::Index => 0xFC,
            AddressMark::Id => 0xFE,
            AddressMark::Data(dam) => dam.byte(),
        }
    }

    fn fm_clock(self) -> u8 {
        match self {
            AddressMark::Index => 0xD7,
            _ => 0xC7,
        }
    }
}

/// Common surface for building up one track's worth of encoded cells,
/// regardless of whether the destination representation is a bitstream or
/// raw flux. Mirrors the reference encoder's incremental, mark-at-a-time
/// construction style.
pub trait TrackBuffer {
    /// Append a single data bit (clock bits, if any, are derived by the
    /// implementation from encoding rules, not supplied by the caller).
    fn add_data_bit(&mut self, bit: bool);

    /// Append one byte, MSB-first, using the implementation's standard
    /// clock rule.
    fn add_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.add_data_bit((byte >> i) & 1 == 1);
        }
    }

    /// Append one byte using an explicit clock-bit pattern (needed for sync
    /// marks, whose clock bits intentionally violate the normal rule).
    fn add_byte_with_clock(&mut self, byte: u8, clock: u8);

    /// The encoding currently active for emission (the track's nominal
    /// encoding, except mid-track on an RX02 buffer switching between the
    /// FM header and MFM data framing).
    fn encoding(&self) -> Encoding;

    /// The running CRC-16 accumulator, seeded by the most recent
    /// [`TrackBuffer::add_am`] call.
    fn crc_mut(&mut self) -> &mut Crc16;

    /// Append the standard sync field preceding a mark: 12 `0x00` bytes for
    /// MFM/RX02, 6 for FM.
    fn add_sync(&mut self) {
        let count = if self.encoding() == Encoding::Fm { 6 } else { 12 };
        for _ in 0..count {
            self.add_byte(0x00);
        }
    }

    /// Append an address mark. Resets the running CRC to seed over just
    /// the mark byte (FM), or over the three 0xA1 sync bytes plus the mark
    /// byte (MFM/RX02, seeded from [`A1A1A1`]).
    fn add_am(&mut self, mark: AddressMark) {
        let byte = mark.byte();
        if self.encoding() == Encoding::Fm {
            self.add_byte_with_clock(byte, mark.fm_clock());
            *self.crc_mut() = Crc16::new();
        }
        else {
            self.add_byte_with_clock(0xA1, MFM_SYNC_CLOCK);
            self.add_byte_with_clock(0xA1, MFM_SYNC_CLOCK);
            self.add_byte_with_clock(0xA1, MFM_SYNC_CLOCK);
            self.add_byte(byte);
            *self.crc_mut() = Crc16::init(A1A1A1);
        }
        self.crc_mut().add(byte);
    }

    /// Append bytes, folding each into the running CRC as it goes.
    fn add_tracked_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.add_byte(b);
            self.crc_mut().add(b);
        }
    }

    /// Append the running CRC, high byte then low. `bad` XORs it with
    /// `0x5555` before emission, producing a sector with a CRC mismatch.
    fn add_crc(&mut self, bad: bool) {
        let value = self.crc_mut().value() ^ if bad { 0x5555 } else { 0 };
        self.add_byte((value >> 8) as u8);
        self.add_byte((value & 0xFF) as u8);
    }

    /// Append `count` bytes of gap fill.
    fn add_gap(&mut self, fill: u8, count: usize) {
        for _ in 0..count {
            self.add_byte(fill);
        }
    }

    /// Append one complete sector: sync, IDAM, CHRN + ID CRC, gap2, sync,
    /// DAM (or deleted-DAM), data padded/truncated to the size code's
    /// natural length, data CRC, gap3.
    fn add_sector(&mut self, header: &Header, data: &[u8], gap3: usize, deleted: bool, bad_crc: bool) {
        self.add_sync();
        self.add_am(AddressMark::Id);
        self.add_tracked_bytes(&[header.cyl as u8, header.head, header.sector_id, header.size_code]);
        self.add_crc(false);

        let gap2 = if self.encoding() == Encoding::Fm { 11 } else { 22 };
        self.add_gap(GAP_FILL_BYTE, gap2);

        self.add_sync();
        let dam = if deleted { Dam::DeletedF8 } else { Dam::Normal };
        self.add_am(AddressMark::Data(dam));

        let natural_len = header.size_bytes();
        if data.len() >= natural_len {
            self.add_tracked_bytes(&data[..natural_len]);
        }
        else {
            self.add_tracked_bytes(data);
            for _ in 0..(natural_len - data.len()) {
                self.add_byte(0x00);
                self.crc_mut().add(0x00);
            }
        }
        self.add_crc(bad_crc);
        self.add_gap(GAP_FILL_BYTE, gap3);
    }

    /// Append the System/34 track preamble: gap4a, sync, IAM, gap1.
    fn add_track_start(&mut self) {
        self.add_gap(GAP_FILL_BYTE, 80); // gap 4a
        self.add_sync();
        self.add_am(AddressMark::Index);
        self.add_gap(GAP_FILL_BYTE, 50); // gap 1
    }

    /// Current write position, in encoded data bits.
    fn bit_position(&self) -> usize;
}

/// Encode one track's sectors into a fresh bitstream, using `format`'s data
/// rate, encoding, and gap3 fill count for every sector.
pub fn encode_track(format: &Format, sectors: &[(Header, Vec<u8>)]) -> BitBuffer {
    let mut tb = bitstream_buffer::BitstreamTrackBuffer::new(format.encoding, format.data_rate);
    tb.add_track_start();
    for (header, data) in sectors {
        tb.add_sector(header, data, format.gap3 as usize, false, false);
    }
    tb.into_buffer()
}
