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

//! [`Format`]: a named geometry (sectors/track, interleave, skew, gap3,
//! fill) plus the sector-ID scheduling algorithm that turns it into a
//! concrete ID sequence per [`crate::chs::CylHead`].

use crate::chs::CylHead;
use crate::sector::{DataRate, Encoding};

/// Which controller family a format's address marks/gap layout follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdcType {
    None,
    Pc,
    Wd,
    Amiga,
    Apple,
}

#[derive(Debug, Clone, Copy)]
pub struct Format {
    pub name: &'static str,
    pub cyls: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
    pub size_code: u8,
    pub base_id: u8,
    pub interleave: u8,
    pub skew: u8,
    pub head0_val: u8,
    pub head1_val: u8,
    pub gap3: u8,
    pub fill: u8,
    pub data_rate: DataRate,
    pub encoding: Encoding,
    pub fdc_type: FdcType,
    pub cyls_first: bool,
}

impl Format {
    /// Number of bytes in one natural-size track (sectors * sector size).
    pub fn track_size(&self) -> usize {
        self.sectors_per_track as usize * crate::chs::n_size(self.size_code)
    }

    /// Total capacity of the disk at its natural sector size.
    pub fn disk_size(&self) -> usize {
        self.track_size() * self.cyls as usize * self.heads as usize
    }

    /// Sector-ID scheduling: for cylinder `cylhead.cyl()`, returns the
    /// permutation of `{base_id, .., base_id + sectors_per_track - 1}`
    /// assigned to each physical sector slot in order, per §4.6.
    pub fn get_ids(&self, cylhead: CylHead) -> Vec<u8> {
        let n = self.sectors_per_track as usize;
        if n == 0 {
            return Vec::new();
        }
        let mut ids = vec![0u8; n];
        let mut used = vec![false; n];
        let cyl = cylhead.cyl() as usize;

        for k in 0..n {
            let start = (k * self.interleave as usize + self.skew as usize * cyl) % n;
            let mut index = start;
            while used[index] {
                index = (index + 1) % n;
            }
            used[index] = true;
            ids[index] = self.base_id.wrapping_add(k as u8);
        }
        ids
    }

    /// Look up a named format whose natural disk size matches `total_bytes`,
    /// in a fixed priority order (closest to the source's `Format::FromSize`).
    pub fn from_size(total_bytes: usize) -> Option<Format> {
        KNOWN_FORMATS.iter().copied().find(|f| f.disk_size() == total_bytes)
    }
}

macro_rules! pc_format {
    ($name:literal, $cyls:expr, $heads:expr, $spt:expr, $size_code:expr) => {
        Format {
            name: $name,
            cyls: $cyls,
            heads: $heads,
            sectors_per_track: $spt,
            size_code: $size_code,
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
    };
}

/// Named formats in a fixed priority order, matching `Format::FromSize`'s
/// enumeration (PC 360/720/1440 first, then microcomputer formats).
pub static KNOWN_FORMATS: &[Format] = &[
    pc_format!("PC 360K", 40, 2, 9, 2),
    pc_format!("PC 720K", 80, 2, 9, 2),
    pc_format!("PC 1.2M", 80, 2, 15, 2),
    pc_format!("PC 1.44M", 80, 2, 18, 2),
    Format {
        name: "AmigaDOS 880K",
        cyls: 80,
        heads: 2,
        sectors_per_track: 11,
        size_code: 2,
        base_id: 0,
        interleave: 1,
        skew: 0,
        head0_val: 0,
        head1_val: 1,
        gap3: 0,
        fill: 0,
        data_rate: DataRate::Rate250Kbps,
        encoding: Encoding::Amiga,
        fdc_type: FdcType::Amiga,
        cyls_first: true,
    },
    Format {
        name: "AtariST 720K",
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
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_scenario_from_spec() {
        let format = Format {
            name: "test",
            cyls: 80,
            heads: 2,
            sectors_per_track: 9,
            size_code: 2,
            base_id: 1,
            interleave: 2,
            skew: 0,
            head0_val: 0,
            head1_val: 1,
            gap3: 0x54,
            fill: 0xF6,
            data_rate: DataRate::Rate250Kbps,
            encoding: Encoding::Mfm,
            fdc_type: FdcType::Pc,
            cyls_first: true,
        };
        let ids = format.get_ids(CylHead::new(0, 0));
        assert_eq!(ids, vec![1, 6, 2, 7, 3, 8, 4, 9, 5]);
    }

    #[test]
    fn get_ids_is_always_a_permutation() {
        let format = pc_format!("t", 80, 2, 9, 2);
        for cyl in 0..format.cyls {
            let ids = format.get_ids(CylHead::new(cyl, 0));
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            let expected: Vec<u8> = (format.base_id..format.base_id + format.sectors_per_track).collect();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn from_size_recognizes_known_formats() {
        let f = Format::from_size(360 * 1024).unwrap();
        assert_eq!(f.name, "PC 360K");
        let f = Format::from_size(1_474_560).unwrap();
        assert_eq!(f.name, "PC 1.44M");
    }
}
