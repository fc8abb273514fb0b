//! Error types for the disk image core.
//!
//! `DiskImageError` is the single error surface returned by fallible library
//! functions. Bad ID/data CRCs are deliberately *not* variants here -- they
//! are sector-level state carried in [`crate::sector::Sector`], never an
//! `Err`. See the crate-level documentation for the propagation policy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskImageError {
    /// Underlying I/O failure reading or writing a transport or image file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A codec declined to recognize the input. Not fatal by itself; the
    /// caller tries the next codec in priority order.
    #[error("format not recognized")]
    FormatUnrecognized,

    /// Header signatures matched but content invariants were violated
    /// (short file, bad checksum, impossible geometry).
    #[error("corrupt image: {0}")]
    CorruptImage(String),

    /// Transport-level failure: I/O, timeout, protocol mismatch, missing
    /// firmware. May be retried by `DemandDisk`.
    #[error("device error: {0}")]
    DeviceError(String),

    /// Write path requested between incompatible source/target geometries,
    /// or a second data rate was observed on an existing [`crate::track::Track`].
    #[error("geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// A user-initiated abort was observed between worker pool tasks.
    #[error("operation aborted")]
    Aborted,

    /// A bit or byte position could not be resolved to a valid offset.
    #[error("seek error: {0}")]
    SeekError(String),

    /// A CRC computation was attempted with invalid input (e.g. zero-length).
    #[error("CRC error: {0}")]
    CrcError(String),

    /// A caller-supplied parameter was out of range or otherwise invalid.
    #[error("parameter error: {0}")]
    ParameterError(String),

    /// Write attempted against a write-protected target.
    #[error("target is write protected")]
    WriteProtectError,
}

pub type Result<T> = std::result::Result<T, DiskImageError>;
