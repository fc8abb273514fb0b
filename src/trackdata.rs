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

//! [`TrackData`]: a single physical track, stored at whichever level of
//! representation it was last produced at, with lazy, memoized upconversion
//! flux -> bitstream -> decoded track on demand.

use crate::bitbuffer::BitBuffer;
use crate::decode;
use crate::flux::FluxData;
use crate::pll::Pll;
use crate::sector::{DataRate, Encoding};
use crate::track::Track;

#[derive(Debug, Clone, Default)]
pub enum TrackData {
    #[default]
    Empty,
    Flux(FluxData),
    Bitstream(BitBuffer),
    Decoded(Track),
}

impl TrackData {
    pub fn is_empty(&self) -> bool {
        matches!(self, TrackData::Empty)
    }

    /// Resolve to a [`BitBuffer`], running the PLL over raw flux if that is
    /// all that is cached. The result is *not* written back; callers that
    /// want memoization should use [`Self::bitstream_mut`].
    pub fn bitstream(&self, data_rate: DataRate) -> Option<BitBuffer> {
        match self {
            TrackData::Bitstream(bits) => Some(bits.clone()),
            TrackData::Flux(flux) => Some(Pll::new(data_rate).decode(flux, data_rate)),
            TrackData::Decoded(_) | TrackData::Empty => None,
        }
    }

    /// Resolve to a [`Track`] of decoded sectors, upconverting through a
    /// bitstream if only flux or an undecoded bitstream is cached, and
    /// memoizing the result in place so repeated calls are free.
    pub fn decoded(&mut self, data_rate: DataRate, encoding: Encoding) -> &Track {
        let needs_decode = !matches!(self, TrackData::Decoded(_));
        if needs_decode {
            let bits = match self {
                TrackData::Decoded(_) => unreachable!(),
                TrackData::Bitstream(bits) => bits.clone(),
                TrackData::Flux(flux) => Pll::new(data_rate).decode(flux, data_rate),
                TrackData::Empty => BitBuffer::new(data_rate),
            };
            let track = decode::decode_track(&bits, data_rate, encoding);
            *self = TrackData::Decoded(track);
        }
        match self {
            TrackData::Decoded(track) => track,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chs::Header;

    #[test]
    fn empty_data_decodes_to_empty_track() {
        let mut td = TrackData::Empty;
        let track = td.decoded(DataRate::Rate250Kbps, Encoding::Mfm);
        assert!(track.is_empty());
    }

    #[test]
    fn decoded_is_memoized_after_first_call() {
        use crate::encode::bitstream_buffer::BitstreamTrackBuffer;
        use crate::encode::TrackBuffer;

        let header = Header::new(0, 0, 1, 2);
        let mut tb = BitstreamTrackBuffer::new(Encoding::Mfm, DataRate::Rate250Kbps);
        tb.add_track_start();
        tb.add_sector(&header, &vec![0u8; header.size_bytes()], 0x54, false, false);

        let mut td = TrackData::Bitstream(tb.into_buffer());
        let first = td.decoded(DataRate::Rate250Kbps, Encoding::Mfm).len();
        assert_eq!(first, 1);
        // Second call hits the memoized Decoded variant.
        assert!(matches!(td, TrackData::Decoded(_)));
        assert_eq!(td.decoded(DataRate::Rate250Kbps, Encoding::Mfm).sectors()[0].header, header);
    }
}
