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

//! Builds a [`BitBuffer`] directly: a clock bit then a data bit per encoded
//! data bit, with the MFM "missing clock" trick available for sync marks.

use crate::bitbuffer::BitBuffer;
use crate::crc16::Crc16;
use crate::encode::TrackBuffer;
use crate::sector::{DataRate, Encoding};

pub struct BitstreamTrackBuffer {
    buf: BitBuffer,
    encoding: Encoding,
    active: Encoding,
    crc: Crc16,
    last_bit: bool,
}

impl BitstreamTrackBuffer {
    pub fn new(encoding: Encoding, data_rate: DataRate) -> Self {
        Self {
            buf: BitBuffer::new(data_rate),
            encoding,
            active: if encoding == Encoding::Rx02 { Encoding::Fm } else { encoding },
            crc: Crc16::new(),
            last_bit: false,
        }
    }

    /// Switch the sub-encoding used for subsequent marks/bytes, for RX02's
    /// FM-header / MFM-data mix. No-op if `encoding != Encoding::Rx02`.
    pub fn set_active_encoding(&mut self, active: Encoding) {
        if self.encoding == Encoding::Rx02 {
            self.active = active;
        }
    }

    pub fn into_buffer(self) -> BitBuffer {
        self.buf
    }
}

impl TrackBuffer for BitstreamTrackBuffer {
    fn add_data_bit(&mut self, bit: bool) {
        match self.active {
            Encoding::Fm => {
                self.buf.push_bit(true);
                self.buf.push_bit(bit);
            }
            _ => {
                let clock = !self.last_bit && !bit;
                self.buf.push_bit(clock);
                self.buf.push_bit(bit);
            }
        }
        self.last_bit = bit;
    }

    fn add_byte_with_clock(&mut self, byte: u8, clock: u8) {
        for i in (0..8).rev() {
            let c = (clock >> i) & 1 == 1;
            let d = (byte >> i) & 1 == 1;
            self.buf.push_bit(c);
            self.buf.push_bit(d);
            self.last_bit = d;
        }
    }

    fn encoding(&self) -> Encoding {
        self.active
    }

    fn crc_mut(&mut self) -> &mut Crc16 {
        &mut self.crc
    }

    fn bit_position(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chs::Header;
    use crate::encode::AddressMark;

    #[test]
    fn encoded_mfm_sync_decodes_with_decoder() {
        let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
        tb.add_gap(0x4E, 10);
        tb.add_am(AddressMark::Id);
        tb.add_tracked_bytes(&[0, 0, 1, 2]);
        tb.add_crc(false);

        let buf = tb.into_buffer();
        let track = crate::decode::system34::decode(&buf, DataRate::Rate250Kbps, Encoding::Mfm);
        assert_eq!(track.len(), 1);
        assert!(!track.sectors()[0].bad_id_crc);
    }

    #[test]
    fn add_sector_round_trips_through_the_decoder() {
        let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
        tb.add_track_start();
        let header = Header::new(0, 0, 1, 2);
        let payload = vec![0x5Au8; header.size_bytes()];
        tb.add_sector(&header, &payload, 0x54, false, false);

        let buf = tb.into_buffer();
        let track = crate::decode::system34::decode(&buf, DataRate::Rate250Kbps, Encoding::Mfm);
        assert_eq!(track.len(), 1);
        let sector = &track.sectors()[0];
        assert!(!sector.bad_id_crc);
        assert!(!sector.bad_data_crc);
        assert_eq!(sector.data(), Some(payload.as_slice()));
    }

    #[test]
    fn add_sector_can_emit_a_deliberately_bad_data_crc() {
        let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
        tb.add_track_start();
        let header = Header::new(0, 0, 1, 2);
        let payload = vec![0xAAu8; header.size_bytes()];
        tb.add_sector(&header, &payload, 0x54, false, true);

        let buf = tb.into_buffer();
        let track = crate::decode::system34::decode(&buf, DataRate::Rate250Kbps, Encoding::Mfm);
        let sector = &track.sectors()[0];
        assert!(!sector.bad_id_crc);
        assert!(sector.bad_data_crc);
    }
}
