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

//! Physical addressing: [`CylHead`] identifies a physical track, [`Header`]
//! identifies a sector as it appears on the medium (CHRN).

use crate::error::{DiskImageError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Upper bound on cylinder number accepted by [`CylHead::try_new`].
pub const MAX_DISK_CYLS: u16 = 256;
/// Upper bound on head number accepted by [`CylHead::try_new`].
pub const MAX_DISK_HEADS: u8 = 2;

/// Largest sector size representable by a `size_code` (capped at 8).
pub const MAX_SECTOR_SIZE: usize = 128 << 8;

/// A physical track address: (cylinder, head). Totally ordered
/// lexicographically, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CylHead {
    cyl: u16,
    head: u8,
}

impl CylHead {
    /// Construct a `CylHead`, validating against [`MAX_DISK_CYLS`] /
    /// [`MAX_DISK_HEADS`].
    pub fn try_new(cyl: u16, head: u8) -> Result<Self> {
        if cyl >= MAX_DISK_CYLS {
            return Err(DiskImageError::ParameterError(format!(
                "cylinder {cyl} exceeds MAX_DISK_CYLS ({MAX_DISK_CYLS})"
            )));
        }
        if head >= MAX_DISK_HEADS {
            return Err(DiskImageError::ParameterError(format!(
                "head {head} exceeds MAX_DISK_HEADS ({MAX_DISK_HEADS})"
            )));
        }
        Ok(Self { cyl, head })
    }

    /// Construct a `CylHead` from values already known to be in range (e.g.
    /// produced by a [`crate::range::Range`] iterator). Panics otherwise.
    pub fn new(cyl: u16, head: u8) -> Self {
        Self::try_new(cyl, head).expect("cyl/head out of range")
    }

    pub fn cyl(&self) -> u16 {
        self.cyl
    }

    pub fn head(&self) -> u8 {
        self.head
    }

    /// Flip to the other head on the same cylinder.
    pub fn flip_head(&self) -> Self {
        Self { cyl: self.cyl, head: self.head ^ 1 }
    }
}

impl PartialOrd for CylHead {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CylHead {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.cyl, self.head).cmp(&(other.cyl, other.head))
    }
}

impl fmt::Display for CylHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyl {} head {}", self.cyl, self.head)
    }
}

/// Sector header as it appears on the medium: cylinder, head, sector id,
/// and size code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub cyl: u16,
    pub head: u8,
    pub sector_id: u8,
    pub size_code: u8,
}

impl Header {
    pub fn new(cyl: u16, head: u8, sector_id: u8, size_code: u8) -> Self {
        Self { cyl, head, sector_id, size_code }
    }

    pub fn cylhead(&self) -> CylHead {
        CylHead::new(self.cyl, self.head)
    }

    /// `size_bytes = 128 << min(size_code, 8)`.
    pub fn size_bytes(&self) -> usize {
        n_size(self.size_code)
    }

    /// Strict comparison: all four fields (C, H, R, N) must match.
    pub fn compare_chrn(&self, other: &Header) -> bool {
        self.cyl == other.cyl
            && self.head == other.head
            && self.sector_id == other.sector_id
            && self.size_code == other.size_code
    }

    /// Permissive comparison: ignores head, matching WD17xx FDC behavior
    /// where the head bit in the ID field is not used to qualify a match.
    pub fn compare_crn(&self, other: &Header) -> bool {
        self.cyl == other.cyl && self.sector_id == other.sector_id && self.size_code == other.size_code
    }
}

/// `size_bytes = 128 << min(size_code, 8)`.
pub fn n_size(size_code: u8) -> usize {
    128usize << size_code.min(8)
}

/// Inverse of [`n_size`]: largest `size_code` whose `n_size` does not exceed
/// `bytes`, capped at 8.
pub fn bytes_to_size_code(bytes: usize) -> u8 {
    let mut code = 0u8;
    while code < 8 && n_size(code + 1) <= bytes {
        code += 1;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_code_scenarios_from_spec() {
        assert_eq!(n_size(2), 512);
        assert_eq!(n_size(6), 8192);
        assert_eq!(n_size(9), 32768); // capped at 8
    }

    #[test]
    fn cylhead_rejects_out_of_range() {
        assert!(CylHead::try_new(MAX_DISK_CYLS, 0).is_err());
        assert!(CylHead::try_new(0, MAX_DISK_HEADS).is_err());
        assert!(CylHead::try_new(79, 1).is_ok());
    }

    #[test]
    fn cylhead_orders_lexicographically() {
        assert!(CylHead::new(0, 1) < CylHead::new(1, 0));
        assert!(CylHead::new(1, 0) < CylHead::new(1, 1));
    }

    #[test]
    fn header_chrn_vs_crn() {
        let a = Header::new(5, 0, 3, 2);
        let b = Header::new(5, 1, 3, 2);
        assert!(!a.compare_chrn(&b));
        assert!(a.compare_crn(&b));
    }
}
