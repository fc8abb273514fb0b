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

//! [`Transport`]: the narrow interface [`crate::demand_disk::DemandDisk`]
//! consumes to read and write individual tracks, independent of whether the
//! backing store is a physical drive, a flux-capture device, or a file.

use crate::chs::CylHead;
use crate::error::Result;
use crate::trackdata::TrackData;

pub trait Transport: Send + Sync {
    /// Read one physical track. `first_read` is `true` the first time a
    /// given track is requested and `false` on subsequent retry passes,
    /// letting implementations request more revolutions up front than on
    /// a retry (see [`crate::demand_disk::RetryPolicy`]).
    fn load(&self, cylhead: CylHead, first_read: bool) -> Result<TrackData>;

    /// Write one physical track back, for writable devices. The default
    /// implementation reports the transport as read-only.
    fn save(&self, _cylhead: CylHead, _data: &TrackData) -> Result<()> {
        Err(crate::error::DiskImageError::WriteProtectError)
    }

    /// Whether repeated [`Transport::load`] calls against the same track
    /// are meaningful (i.e. a physical device whose reads are noisy) or
    /// whether one read is authoritative (a disk image file).
    fn supports_retries(&self) -> bool;
}

/// A transport backed by an already fully-decoded in-memory disk, useful
/// for tests and for wrapping a plain image file where every track is
/// available immediately and deterministically.
pub struct MemoryTransport {
    tracks: std::collections::HashMap<CylHead, TrackData>,
}

impl MemoryTransport {
    pub fn new(tracks: std::collections::HashMap<CylHead, TrackData>) -> Self {
        Self { tracks }
    }
}

impl Transport for MemoryTransport {
    fn load(&self, cylhead: CylHead, _first_read: bool) -> Result<TrackData> {
        Ok(self.tracks.get(&cylhead).cloned().unwrap_or_default())
    }

    fn supports_retries(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_transport_reports_no_retry_support() {
        let transport = MemoryTransport::new(Default::default());
        assert!(!transport.supports_retries());
    }

    #[test]
    fn memory_transport_returns_empty_for_unknown_track() {
        let transport = MemoryTransport::new(Default::default());
        let data = transport.load(CylHead::new(0, 0), true).unwrap();
        assert!(data.is_empty());
    }
}
