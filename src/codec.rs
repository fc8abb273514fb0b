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

//! Image codec abstraction: [`ImageReader`]/[`ImageWriter`] are the
//! capability a concrete image-file format implements; a [`CodecRegistry`]
//! tries each registered reader in turn against a byte slice. Concrete
//! format implementations (IMD, HFE, SCP, ...) are out of scope here — this
//! module is the seam they would plug into.

use crate::disk::Disk;
use crate::error::Result;

pub trait ImageReader: Send + Sync {
    /// A short, stable name for diagnostics (e.g. `"imd"`, `"scp"`).
    fn name(&self) -> &str;

    /// Attempt to recognize and decode `bytes`, filling `disk`. Returns
    /// `Ok(false)` if the bytes do not match this codec's format; any other
    /// error is a genuine read failure against a recognized format.
    fn read(&self, bytes: &[u8], disk: &mut Disk) -> Result<bool>;
}

pub trait ImageWriter: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, disk: &Disk) -> Result<Vec<u8>>;
}

/// Tries each registered reader in registration order, returning the first
/// to recognize the bytes.
#[derive(Default)]
pub struct CodecRegistry {
    readers: Vec<Box<dyn ImageReader>>,
    writers: Vec<Box<dyn ImageWriter>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_reader(&mut self, reader: Box<dyn ImageReader>) {
        self.readers.push(reader);
    }

    pub fn register_writer(&mut self, writer: Box<dyn ImageWriter>) {
        self.writers.push(writer);
    }

    pub fn read(&self, bytes: &[u8]) -> Result<Disk> {
        for reader in &self.readers {
            let mut disk = Disk::new(crate::format::Format::from_size(bytes.len()).unwrap_or(DEFAULT_FORMAT));
            if reader.read(bytes, &mut disk)? {
                return Ok(disk);
            }
        }
        Err(crate::error::DiskImageError::FormatUnrecognized)
    }

    pub fn writer(&self, name: &str) -> Option<&dyn ImageWriter> {
        self.writers.iter().find(|w| w.name() == name).map(|w| w.as_ref())
    }
}

const DEFAULT_FORMAT: crate::format::Format = crate::format::Format {
    name: "unknown",
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
    data_rate: crate::sector::DataRate::Rate250Kbps,
    encoding: crate::sector::Encoding::Mfm,
    fdc_type: crate::format::FdcType::Pc,
    cyls_first: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysRejects;
    impl ImageReader for AlwaysRejects {
        fn name(&self) -> &str {
            "always-rejects"
        }
        fn read(&self, _bytes: &[u8], _disk: &mut Disk) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn registry_reports_unrecognized_when_no_reader_matches() {
        let mut registry = CodecRegistry::new();
        registry.register_reader(Box::new(AlwaysRejects));
        let result = registry.read(&[0u8; 16]);
        assert!(matches!(result, Err(crate::error::DiskImageError::FormatUnrecognized)));
    }
}
