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

//! [`Sector`]: one logical sector, its header, encoding metadata, and the
//! merge algebra that reconciles multiple noisy reads of the same physical
//! sector into a best-effort reconstruction.

use crate::chs::Header;
use strum::EnumIter;

/// Data rate of the medium a sector was read at or is to be written at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DataRate {
    Unknown,
    Rate250Kbps,
    Rate300Kbps,
    Rate500Kbps,
    Rate1Mbps,
}

impl DataRate {
    /// Nominal nanoseconds per bitcell at this data rate.
    pub fn bitcell_ns(&self) -> u32 {
        match self {
            DataRate::Rate1Mbps => 500,
            DataRate::Rate500Kbps => 667,
            DataRate::Rate300Kbps => 1000,
            DataRate::Rate250Kbps => 2000,
            DataRate::Unknown => 2000,
        }
    }
}

/// Track encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Encoding {
    Unknown,
    Mfm,
    Fm,
    Amiga,
    Gcr,
    Ace,
    Mx,
    Agat,
    Rx02,
}

impl Encoding {
    /// Bits on the medium per encoded data bit (2 for FM/MFM-style doubling,
    /// matching the reference crate's `byte_size`/`marker_size` helpers).
    pub fn bits_per_bit(&self) -> u32 {
        match self {
            Encoding::Fm => 2,
            _ => 2,
        }
    }
}

/// Address mark byte recorded with a sector's data copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dam {
    Normal,
    DeletedF8,
    DeletedF9,
    Alternate,
    Rx02,
}

impl Dam {
    pub fn byte(&self) -> u8 {
        match self {
            Dam::Normal => 0xFB,
            Dam::DeletedF8 => 0xF8,
            Dam::DeletedF9 => 0xF9,
            Dam::Alternate => 0xFA,
            Dam::Rx02 => 0xFD,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xFB => Some(Dam::Normal),
            0xF8 => Some(Dam::DeletedF8),
            0xF9 => Some(Dam::DeletedF9),
            0xFA => Some(Dam::Alternate),
            0xFD => Some(Dam::Rx02),
            _ => None,
        }
    }
}

/// Outcome of [`Sector::add`] / [`Sector::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The sector was not modified by the incoming data.
    Unchanged,
    /// An existing bad copy was replaced or upgraded by better data.
    Improved,
    /// A genuinely new data copy was retained alongside existing ones.
    NewData,
}

impl MergeOutcome {
    fn rank(&self) -> u8 {
        match self {
            MergeOutcome::Unchanged => 0,
            MergeOutcome::NewData => 1,
            MergeOutcome::Improved => 2,
        }
    }

    fn best(self, other: MergeOutcome) -> MergeOutcome {
        if self.rank() >= other.rank() { self } else { other }
    }
}

/// Default cap on retained data copies per sector, matching the source.
pub const DEFAULT_MAX_COPIES: u8 = 3;

/// "Complete size" used by the 8K-sector recognizer (§4.2 rule 8).
const EIGHT_K_COMPLETE_SIZE: usize = 0x1800;

#[derive(Debug, Clone)]
pub struct Sector {
    pub header: Header,
    pub data_rate: DataRate,
    pub encoding: Encoding,
    /// Bitstream offset of this sector's IDAM sync, measured from the index.
    pub offset_bits: u32,
    pub gap3: u8,
    pub dam: Dam,
    pub bad_id_crc: bool,
    pub bad_data_crc: bool,
    copies: Vec<Vec<u8>>,
    max_copies: u8,
}

impl Sector {
    /// A freshly decoded sector with a good ID but no data read yet.
    /// `bad_data_crc` starts `true` so the first real data copy is treated
    /// as an improvement rather than competing with nothing.
    pub fn new(header: Header, data_rate: DataRate, encoding: Encoding, offset_bits: u32) -> Self {
        Self {
            header,
            data_rate,
            encoding,
            offset_bits,
            gap3: 0,
            dam: Dam::Normal,
            bad_id_crc: false,
            bad_data_crc: true,
            copies: Vec::new(),
            max_copies: DEFAULT_MAX_COPIES,
        }
    }

    pub fn with_max_copies(mut self, max_copies: u8) -> Self {
        self.max_copies = max_copies.max(1);
        self
    }

    /// Mark the ID field itself as failing its CRC. Per the §3 invariant,
    /// a sector with a bad ID CRC carries no data copies.
    pub fn mark_bad_id_crc(mut self) -> Self {
        self.bad_id_crc = true;
        self.copies.clear();
        self
    }

    /// Force the copy cap down (used by [`crate::track::Track::add`] when a
    /// sector's data record is found to overlap its successor). Drops the
    /// oldest copies if the cap is now exceeded.
    pub fn force_max_copies(&mut self, max_copies: u8) {
        self.max_copies = max_copies.max(1);
        while self.copies.len() > self.max_copies as usize {
            self.copies.remove(0);
        }
    }

    pub fn copies(&self) -> &[Vec<u8>] {
        &self.copies
    }

    /// The most recently accepted data copy, if any.
    pub fn data(&self) -> Option<&[u8]> {
        self.copies.last().map(|v| v.as_slice())
    }

    pub fn has_good_data(&self) -> bool {
        !self.bad_data_crc && !self.copies.is_empty()
    }

    /// A sector is "8K" iff datarate=250K, encoding=MFM, size_code=6.
    pub fn is_8k(&self) -> bool {
        self.data_rate == DataRate::Rate250Kbps && self.encoding == Encoding::Mfm && self.header.size_code == 6
    }

    fn complete_size(&self) -> usize {
        if self.is_8k() { EIGHT_K_COMPLETE_SIZE } else { self.header.size_bytes() }
    }

    /// Merge another decoded read of (what is believed to be) this same
    /// physical sector. Implements §4.2 in full, including the ID-CRC
    /// replacement rules that precede the data-copy algebra.
    pub fn merge(&mut self, other: &Sector) -> MergeOutcome {
        // Rule 1: incoming ID CRC bad -> reject outright.
        if other.bad_id_crc {
            return MergeOutcome::Unchanged;
        }
        let mut outcome = MergeOutcome::Unchanged;
        // Rule 2: our ID CRC was bad, incoming is good -> adopt incoming header.
        if self.bad_id_crc {
            self.header = other.header;
            self.bad_id_crc = false;
            outcome = MergeOutcome::Improved;
        }
        if other.copies.is_empty() {
            return outcome;
        }
        for copy in &other.copies {
            let step = self.add(copy, other.bad_data_crc, other.dam);
            outcome = outcome.best(step);
        }
        outcome
    }

    /// Add one data copy, applying §4.2 rules 3-9. Assumes the ID has
    /// already been reconciled (by [`Sector::merge`] or by the caller).
    pub fn add(&mut self, data: &[u8], bad_crc: bool, dam: Dam) -> MergeOutcome {
        // Rule 3: both bad, disagreeing DAM -> reject.
        if self.bad_data_crc && bad_crc && !self.copies.is_empty() && self.dam != dam {
            return MergeOutcome::Unchanged;
        }
        // Rule 4: existing good, incoming bad -> reject.
        if !self.bad_data_crc && bad_crc {
            return MergeOutcome::Unchanged;
        }

        let mut improved = false;

        // Rule 5: existing bad, incoming good -> drop all existing copies.
        if self.bad_data_crc && !bad_crc {
            self.copies.clear();
            improved = true;
        }

        // Rule 6: 8K secondary-checksum recognizer.
        if self.is_8k() {
            if recognize_8k_checksum(data) == Some(true) {
                self.copies.clear();
                self.copies.push(data.to_vec());
                self.bad_data_crc = bad_crc;
                self.dam = dam;
                return MergeOutcome::Improved;
            }
            if let [only] = self.copies.as_slice() {
                if recognize_8k_checksum(only) == Some(true) {
                    return MergeOutcome::Unchanged;
                }
            }
        }

        // Rule 7: supersets of incoming reject it; subsets of incoming are erased.
        if self.copies.iter().any(|c| c.len() > data.len() && c.starts_with(data)) {
            return if improved { MergeOutcome::Improved } else { MergeOutcome::Unchanged };
        }
        self.copies.retain(|c| !(data.len() > c.len() && data.starts_with(c.as_slice())));

        // Rule 8: complete-size handling / length equalization.
        let complete_size = self.complete_size();
        if data.len() >= complete_size {
            let natural = &data[..complete_size];
            if let Some(existing) = self
                .copies
                .iter()
                .find(|c| c.len() >= complete_size && &c[..complete_size] == natural)
            {
                if data.len() <= existing.len() {
                    self.bad_data_crc = bad_crc;
                    self.dam = dam;
                    return if improved { MergeOutcome::Improved } else { MergeOutcome::Unchanged };
                }
            }
        } else if !self.copies.is_empty() {
            let min_len = self
                .copies
                .iter()
                .map(|c| c.len())
                .chain(std::iter::once(data.len()))
                .min()
                .unwrap_or(data.len());
            for c in self.copies.iter_mut() {
                c.truncate(min_len);
            }
        }

        // Rule 9: append, cap, and record the most recent flags. A
        // short-read copy must match the length the existing copies were
        // just equalized to above, not its own full length.
        let truncated_len = if data.len() < complete_size {
            self.copies.iter().map(|c| c.len()).min().unwrap_or(data.len())
        }
        else {
            data.len()
        };
        self.copies.push(data[..truncated_len].to_vec());
        while self.copies.len() > self.max_copies as usize {
            self.copies.remove(0);
        }
        self.bad_data_crc = bad_crc;
        self.dam = dam;

        if improved { MergeOutcome::Improved } else { MergeOutcome::NewData }
    }
}

/// Simplified secondary-checksum recognizer for "8K" sectors: treats the
/// final two bytes of the 0x1800-byte payload as a little-endian sum of the
/// preceding 16-bit words. Real-world 8K protections use several distinct
/// schemes; callers needing full fidelity can replace this with a
/// protection-specific recognizer.
fn recognize_8k_checksum(data: &[u8]) -> Option<bool> {
    if data.len() < EIGHT_K_COMPLETE_SIZE {
        return None;
    }
    let payload = &data[..EIGHT_K_COMPLETE_SIZE - 2];
    let trailer = &data[EIGHT_K_COMPLETE_SIZE - 2..EIGHT_K_COMPLETE_SIZE];
    let mut sum: u16 = 0;
    for chunk in payload.chunks(2) {
        let word = if chunk.len() == 2 { u16::from_le_bytes([chunk[0], chunk[1]]) } else { chunk[0] as u16 };
        sum = sum.wrapping_add(word);
    }
    let stored = u16::from_le_bytes([trailer[0], trailer[1]]);
    Some(sum == stored)
}
