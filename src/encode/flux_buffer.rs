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

//! Builds raw flux-reversal timings directly, the inverse of [`crate::pll`].
//! Each encoded channel cell is either silent (extends the current
//! interval) or a reversal (closes it), mirroring the trailing-one
//! convention [`crate::pll::Pll`] decodes.
//!
//! Supports RX02's mixed encoding: [`FluxTrackBuffer::set_active_encoding`]
//! lets a caller switch between FM header framing and MFM data framing
//! within the same track without starting a new buffer.

use crate::crc16::Crc16;
use crate::encode::TrackBuffer;
use crate::flux::FluxData;
use crate::sector::{DataRate, Encoding};

pub struct FluxTrackBuffer {
    encoding: Encoding,
    active: Encoding,
    nominal_period_ns: f64,
    zero_cells: u32,
    intervals: Vec<u32>,
    crc: Crc16,
    last_bit: bool,
}

impl FluxTrackBuffer {
    pub fn new(encoding: Encoding, data_rate: DataRate) -> Self {
        Self {
            encoding,
            active: if encoding == Encoding::Rx02 { Encoding::Fm } else { encoding },
            nominal_period_ns: data_rate.bitcell_ns() as f64,
            zero_cells: 0,
            intervals: Vec::new(),
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

    fn push_channel_bit(&mut self, bit: bool) {
        if bit {
            let interval = (self.zero_cells as f64 + 1.0) * self.nominal_period_ns;
            self.intervals.push(interval.round() as u32);
            self.zero_cells = 0;
        }
        else {
            self.zero_cells += 1;
        }
    }

    /// Flush any trailing silent cells as a final interval and wrap the
    /// accumulated reversals into a single-revolution [`FluxData`].
    pub fn finish(mut self) -> FluxData {
        if self.zero_cells > 0 {
            let interval = (self.zero_cells as f64 + 1.0) * self.nominal_period_ns;
            self.intervals.push(interval.round() as u32);
        }
        let mut flux = FluxData::new();
        flux.push_revolution(self.intervals);
        flux
    }
}

impl TrackBuffer for FluxTrackBuffer {
    fn add_data_bit(&mut self, bit: bool) {
        match self.active {
            Encoding::Fm => {
                self.push_channel_bit(true);
                self.push_channel_bit(bit);
            }
            _ => {
                let clock = !self.last_bit && !bit;
                self.push_channel_bit(clock);
                self.push_channel_bit(bit);
            }
        }
        self.last_bit = bit;
    }

    fn add_byte_with_clock(&mut self, byte: u8, clock: u8) {
        for i in (0..8).rev() {
            let c = (clock >> i) & 1 == 1;
            let d = (byte >> i) & 1 == 1;
            self.push_channel_bit(c);
            self.push_channel_bit(d);
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
        self.intervals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_intervals_are_positive_multiples_of_nominal_period() {
        let mut fb = FluxTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
        fb.add_byte(0xA5);
        fb.add_byte(0x00);
        let flux = fb.finish();
        assert_eq!(flux.revolution_count(), 1);
        for &interval in &flux.revolutions()[0] {
            assert!(interval > 0);
            assert_eq!(interval % 2000, 0);
        }
    }

    #[test]
    fn rx02_switches_framing_mid_track() {
        use crate::encode::AddressMark;
        use crate::sector::Dam;

        let mut fb = FluxTrackBuffer::new(Encoding::Rx02, DataRate::Rate250Kbps);
        fb.add_am(AddressMark::Id);
        fb.set_active_encoding(Encoding::Mfm);
        fb.add_am(AddressMark::Data(Dam::Normal));
        let flux = fb.finish();
        assert!(!flux.revolutions()[0].is_empty());
    }
}
