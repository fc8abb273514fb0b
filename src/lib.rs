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

//! # fluxfox
//!
//! fluxfox reconstructs sector data from noisy flux and bitstream captures
//! of floppy disks, and encodes sector data back down to bitstream or flux
//! level for write-back to media or flux-level image formats.
//!
//! The pipeline runs in both directions:
//!
//! ```text
//! transport -> raw bytes -> FluxData -> BitBuffer -> Track (Sectors)
//! Track (Sectors) -> TrackBuffer -> BitBuffer / FluxData -> transport
//! ```
//!
//! [`disk::Disk`] holds a fully in-memory set of tracks; [`demand_disk::DemandDisk`]
//! wraps a [`transport::Transport`] and loads/retries tracks lazily. Track
//! encodings (FM, MFM, RX02, Amiga, the Apple/Commodore GCR family) are
//! decoded by [`decode::decode_track`] and produced by the [`encode::TrackBuffer`]
//! implementations.

pub mod bitbuffer;
pub mod chs;
pub mod codec;
pub mod crc16;
pub mod decode;
pub mod demand_disk;
pub mod disk;
pub mod encode;
pub mod error;
pub mod flux;
pub mod flux_stream;
pub mod format;
pub mod pll;
pub mod range;
pub mod sector;
pub mod track;
pub mod trackdata;
pub mod transport;
pub mod util;
pub mod worker_pool;

pub use crate::chs::{CylHead, Header};
pub use crate::disk::Disk;
pub use crate::error::{DiskImageError, Result};
pub use crate::format::Format;
pub use crate::sector::{DataRate, Encoding, Sector};
pub use crate::track::Track;
pub use crate::trackdata::TrackData;

/// Largest sector size this crate will represent (`128 << 6`, the "8K
/// sector" protection case).
pub const MAXIMUM_SECTOR_SIZE: usize = 8192;
/// Sector size assumed when a format does not specify one.
pub const DEFAULT_SECTOR_SIZE: usize = 512;
