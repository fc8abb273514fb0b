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

//! Bitstream decoders: turn a recovered [`crate::bitbuffer::BitBuffer`] into
//! a [`crate::track::Track`] of [`crate::sector::Sector`]s, per encoding.

pub mod amiga;
pub mod gcr;
pub mod system34;

use crate::bitbuffer::BitBuffer;
use crate::sector::{DataRate, Encoding};
use crate::track::Track;

/// Dispatch to the decoder matching `encoding`.
pub fn decode_track(bits: &BitBuffer, data_rate: DataRate, encoding: Encoding) -> Track {
    match encoding {
        Encoding::Fm | Encoding::Mfm | Encoding::Rx02 => system34::decode(bits, data_rate, encoding),
        Encoding::Amiga => amiga::decode(bits, data_rate),
        Encoding::Gcr | Encoding::Ace | Encoding::Mx | Encoding::Agat => gcr::decode(bits, data_rate, encoding),
        Encoding::Unknown => Track::new(),
    }
}

/// Read `count` MSB-first bits starting at `pos`, packed big-endian into a
/// `u32` (caller guarantees `count <= 32`). Returns `None` past the end.
pub(crate) fn peek_bits(bits: &BitBuffer, pos: usize, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for i in 0..count {
        value = (value << 1) | (bits.get(pos + i)? as u32);
    }
    Some(value)
}

/// Unpack `count` data bytes starting at bit `pos`, MSB-first, one bit at a
/// time (no clock-bit interleave). Used once a decoder has already stripped
/// clock bits into a clean data-bit stream.
pub(crate) fn unpack_bytes(bits: &BitBuffer, pos: usize, count: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    let mut p = pos;
    for _ in 0..count {
        out.push(peek_bits(bits, p, 8)? as u8);
        p += 8;
    }
    Some(out)
}
