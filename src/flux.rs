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

//! [`FluxData`]: per-revolution sequences of nanosecond reversal timings, as
//! captured from a physical drive or read back from a flux-level image file.

/// One revolution's worth of flux-reversal intervals, in nanoseconds.
pub type Revolution = Vec<u32>;

#[derive(Debug, Clone, Default)]
pub struct FluxData {
    revolutions: Vec<Revolution>,
}

impl FluxData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_revolutions(revolutions: Vec<Revolution>) -> Self {
        Self { revolutions }
    }

    pub fn push_revolution(&mut self, revolution: Revolution) {
        self.revolutions.push(revolution);
    }

    pub fn revolutions(&self) -> &[Revolution] {
        &self.revolutions
    }

    pub fn revolution_count(&self) -> usize {
        self.revolutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revolutions.is_empty()
    }

    /// Total reversal time across a revolution, in nanoseconds.
    pub fn revolution_duration_ns(&self, index: usize) -> u64 {
        self.revolutions.get(index).map(|r| r.iter().map(|&t| t as u64).sum()).unwrap_or(0)
    }
}
