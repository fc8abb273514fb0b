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

//! [`Range`]: iterates `(cyl, head)` pairs in cyl-major or head-major order.

use crate::chs::CylHead;

#[derive(Debug, Clone, Copy)]
pub struct Range {
    cyls: u16,
    heads: u8,
    cyls_first: bool,
}

impl Range {
    pub fn new(cyls: u16, heads: u8, cyls_first: bool) -> Self {
        Self { cyls, heads, cyls_first }
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter { range: *self, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.cyls as usize * self.heads as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for Range {
    type Item = CylHead;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

pub struct RangeIter {
    range: Range,
    index: usize,
}

impl Iterator for RangeIter {
    type Item = CylHead;

    fn next(&mut self) -> Option<CylHead> {
        if self.index >= self.range.len() {
            return None;
        }
        let (cyl, head) = if self.range.cyls_first {
            // cyl-major: outer loop over cylinders, inner over heads.
            let cyl = self.index / self.range.heads as usize;
            let head = self.index % self.range.heads as usize;
            (cyl, head)
        }
        else {
            // head-major: outer loop over heads, inner over cylinders.
            let head = self.index / self.range.cyls as usize;
            let cyl = self.index % self.range.cyls as usize;
            (cyl, head)
        };
        self.index += 1;
        Some(CylHead::new(cyl as u16, head as u8))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.range.len() - self.index;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyls_first_visits_both_heads_before_advancing_cylinder() {
        let r = Range::new(2, 2, true);
        let visited: Vec<_> = r.iter().map(|ch| (ch.cyl(), ch.head())).collect();
        assert_eq!(visited, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn heads_first_visits_all_cylinders_before_advancing_head() {
        let r = Range::new(2, 2, false);
        let visited: Vec<_> = r.iter().map(|ch| (ch.cyl(), ch.head())).collect();
        assert_eq!(visited, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn length_matches_cyls_times_heads() {
        let r = Range::new(80, 2, true);
        assert_eq!(r.iter().count(), 160);
    }
}
