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

//! [`Track`]: an ordered sequence of [`Sector`]s keyed by bit-offset from
//! the index, with the insert/merge/overlap logic that combines sectors
//! seen across multiple revolutions or retries.

use crate::error::{DiskImageError, Result};
use crate::sector::{DataRate, Encoding, MergeOutcome, Sector};
use log::{debug, trace, warn};

/// Two sectors with matching CHRN are considered the same physical sector
/// iff their offsets differ by less than this many bits (wrapping on
/// `tracklen`). Fixed at `64 * 16` bits, matching the source; exposed as a
/// named constant rather than buried so a future revisit is a one-line change.
pub const COMPARE_TOLERANCE_BITS: u32 = 64 * 16;

fn encoding_overhead_bytes(encoding: Encoding) -> usize {
    // ID CRC + gap2 + sync + address-mark byte + data CRC, approximated per
    // encoding. Used only to rank extents against the natural sector size.
    match encoding {
        Encoding::Fm => 2 + 11 + 6 + 1 + 2,
        Encoding::Mfm | Encoding::Rx02 => 2 + 22 + 12 + 3 + 1 + 2,
        Encoding::Amiga => 2 + 0 + 4 + 0 + 4,
        _ => 8,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Track {
    sectors: Vec<Sector>,
    /// Bits per revolution. Zero means unknown.
    tracklen: u32,
    /// Microseconds per revolution.
    tracktime: u32,
    datarate: Option<DataRate>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sectors_mut(&mut self) -> &mut [Sector] {
        &mut self.sectors
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn tracklen(&self) -> u32 {
        self.tracklen
    }

    pub fn set_tracklen(&mut self, bits: u32) {
        self.tracklen = bits;
    }

    pub fn tracktime(&self) -> u32 {
        self.tracktime
    }

    pub fn set_tracktime(&mut self, us: u32) {
        self.tracktime = us;
    }

    pub fn datarate(&self) -> Option<DataRate> {
        self.datarate
    }

    fn offset_distance(&self, a: u32, b: u32) -> u32 {
        let tl = self.tracklen.max(1);
        let d = a.abs_diff(b);
        d.min(tl.saturating_sub(d))
    }

    fn offset_forward_distance(&self, a: u32, b: u32) -> u32 {
        let tl = self.tracklen.max(1);
        if b >= a { b - a } else { tl.saturating_sub(a) + b }
    }

    fn find_match(&self, incoming: &Sector) -> Option<usize> {
        self.sectors.iter().position(|s| {
            s.header.compare_chrn(&incoming.header)
                && self.offset_distance(s.offset_bits, incoming.offset_bits) <= COMPARE_TOLERANCE_BITS
        })
    }

    /// Bytes of medium between this sector's IDAM sync and the next
    /// sector's IDAM sync (wrapping), minus per-encoding framing overhead.
    /// Used to detect a sector whose data record overlaps its successor.
    pub fn data_extent_bytes(&self, idx: usize) -> usize {
        let sector = &self.sectors[idx];
        let next_offset = if self.sectors.len() <= 1 {
            sector.offset_bits
        }
        else {
            self.sectors[(idx + 1) % self.sectors.len()].offset_bits
        };
        let extent_bits = self.offset_forward_distance(sector.offset_bits, next_offset);
        let shift = if sector.encoding == Encoding::Fm { 5 } else { 4 };
        let overhead = encoding_overhead_bytes(sector.encoding);
        ((extent_bits as usize) >> shift).saturating_sub(overhead)
    }

    fn overlaps_successor(&self, idx: usize) -> bool {
        if self.tracklen == 0 || self.sectors.len() < 2 {
            return false;
        }
        self.data_extent_bytes(idx) < self.sectors[idx].header.size_bytes()
    }

    /// Insert or merge `sector` into the track. See SPEC_FULL.md §4.3.
    pub fn add(&mut self, sector: Sector) -> Result<MergeOutcome> {
        match self.datarate {
            Some(dr) if dr != sector.data_rate => {
                warn!(
                    "rejecting sector with data rate {:?} on track already at {:?}",
                    sector.data_rate, dr
                );
                return Err(DiskImageError::GeometryMismatch(format!(
                    "track datarate {dr:?} does not match incoming sector datarate {:?}",
                    sector.data_rate
                )));
            }
            Some(_) => {}
            None => self.datarate = Some(sector.data_rate),
        }

        if sector.offset_bits == 0 {
            trace!("appending sector with unknown offset: {:?}", sector.header);
            self.sectors.push(sector);
            return Ok(MergeOutcome::NewData);
        }

        if let Some(idx) = self.find_match(&sector) {
            let outcome = self.sectors[idx].merge(&sector);
            if self.overlaps_successor(idx) && !self.sectors[idx].is_8k() {
                debug!("sector {:?} overlaps its successor; forcing single copy", self.sectors[idx].header);
                self.sectors[idx].force_max_copies(1);
            }
            return Ok(outcome);
        }

        let pos = self.sectors.partition_point(|s| s.offset_bits <= sector.offset_bits);
        self.sectors.insert(pos, sector);
        Ok(MergeOutcome::NewData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chs::Header;
    use crate::sector::Dam;

    fn sector_at(offset: u32) -> Sector {
        Sector::new(Header::new(0, 0, 1, 2), DataRate::Rate250Kbps, Encoding::Mfm, offset)
    }

    #[test]
    fn differing_datarate_is_geometry_mismatch_and_does_not_mutate() {
        let mut t = Track::new();
        t.add(sector_at(100)).unwrap();
        let mut other = Sector::new(Header::new(0, 0, 2, 2), DataRate::Rate500Kbps, Encoding::Mfm, 200);
        other.add(&[0u8; 512], false, Dam::Normal);
        let before_len = t.len();
        let result = t.add(other);
        assert!(matches!(result, Err(DiskImageError::GeometryMismatch(_))));
        assert_eq!(t.len(), before_len);
    }

    #[test]
    fn same_chrn_within_tolerance_merges_instead_of_duplicating() {
        let mut t = Track::new();
        t.set_tracklen(100_000);
        let mut a = sector_at(1000);
        a.add(&[0xAAu8; 512], false, Dam::Normal);
        t.add(a).unwrap();

        let mut b = sector_at(1000 + COMPARE_TOLERANCE_BITS - 1);
        b.add(&[0xAAu8; 512], false, Dam::Normal);
        t.add(b).unwrap();

        assert_eq!(t.len(), 1);
    }

    #[test]
    fn distant_same_chrn_sectors_are_kept_distinct() {
        let mut t = Track::new();
        t.set_tracklen(100_000);
        let mut a = sector_at(1000);
        a.add(&[0xAAu8; 512], false, Dam::Normal);
        t.add(a).unwrap();

        let mut b = sector_at(1000 + COMPARE_TOLERANCE_BITS * 4);
        b.add(&[0xBBu8; 512], false, Dam::Normal);
        t.add(b).unwrap();

        assert_eq!(t.len(), 2);
    }
}
