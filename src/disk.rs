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

//! [`Disk`]: an in-memory container mapping [`CylHead`] to [`TrackData`],
//! fully resident (as opposed to [`crate::demand_disk::DemandDisk`], which
//! loads tracks lazily from a [`crate::transport::Transport`]).

use crate::chs::CylHead;
use crate::format::Format;
use crate::range::Range;
use crate::trackdata::TrackData;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Disk {
    format: Format,
    tracks: HashMap<CylHead, TrackData>,
    metadata: HashMap<String, String>,
}

impl Disk {
    pub fn new(format: Format) -> Self {
        Self { format, tracks: HashMap::new(), metadata: HashMap::new() }
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn range(&self) -> Range {
        Range::new(self.format.cyls, self.format.heads, self.format.cyls_first)
    }

    pub fn track(&self, cylhead: CylHead) -> Option<&TrackData> {
        self.tracks.get(&cylhead)
    }

    pub fn track_mut(&mut self, cylhead: CylHead) -> &mut TrackData {
        self.tracks.entry(cylhead).or_default()
    }

    pub fn insert_track(&mut self, cylhead: CylHead, data: TrackData) {
        self.tracks.insert(cylhead, data);
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Swap the track data of both heads on every cylinder, for images
    /// whose side order was captured reversed.
    pub fn flip_sides(&mut self) {
        let mut swapped = HashMap::with_capacity(self.tracks.len());
        for (cylhead, data) in self.tracks.drain() {
            swapped.insert(cylhead.flip_head(), data);
        }
        self.tracks = swapped;
    }

    /// Grow or shrink the logical geometry. Tracks outside the new range are
    /// dropped; tracks inside it that did not previously exist read back as
    /// [`TrackData::Empty`].
    pub fn resize(&mut self, cyls: u16, heads: u8) {
        self.format.cyls = cyls;
        self.format.heads = heads;
        self.tracks.retain(|cylhead, _| cylhead.cyl() < cyls && cylhead.head() < heads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FdcType;
    use crate::sector::{DataRate, Encoding};

    fn format() -> Format {
        Format {
            name: "t",
            cyls: 80,
            heads: 2,
            sectors_per_track: 9,
            size_code: 2,
            base_id: 1,
            interleave: 1,
            skew: 0,
            head0_val: 0,
            head1_val: 1,
            gap3: 0x54,
            fill: 0xF6,
            data_rate: DataRate::Rate250Kbps,
            encoding: Encoding::Mfm,
            fdc_type: FdcType::Pc,
            cyls_first: true,
        }
    }

    #[test]
    fn unseen_track_reads_back_empty() {
        let disk = Disk::new(format());
        assert!(disk.track(CylHead::new(0, 0)).is_none());
    }

    #[test]
    fn flip_sides_swaps_head_assignment() {
        let mut disk = Disk::new(format());
        disk.insert_track(CylHead::new(0, 0), TrackData::Flux(Default::default()));
        disk.flip_sides();
        assert!(disk.track(CylHead::new(0, 0)).is_none());
        assert!(disk.track(CylHead::new(0, 1)).is_some());
    }

    #[test]
    fn resize_drops_out_of_range_tracks() {
        let mut disk = Disk::new(format());
        disk.insert_track(CylHead::new(79, 1), TrackData::Flux(Default::default()));
        disk.resize(40, 2);
        assert!(disk.track(CylHead::new(79, 1)).is_none());
    }
}
