//! Reader and writer errors

use core::fmt;

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Iso9660Error>;

/// Everything that can go wrong reading or writing a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iso9660Error {
    /// The block device refused a read
    IoError,
    /// No `CD001` descriptor where one was expected
    InvalidSignature,
    /// Descriptor version other than 1
    UnsupportedVersion,
    /// Directory record length fields disagree
    InvalidDirectoryRecord,
    /// Path component missing
    NotFound,
    /// More components than `MAX_DIRECTORY_DEPTH`
    PathTooLong,
    /// Directory used as a file or the other way round
    InvalidPath,
    /// Caller buffer shorter than the file
    BufferTooSmall,
    /// Date field out of range
    InvalidDatetime,
    /// Boot record descriptor missing or malformed
    NoBootRecord,
    /// Catalog sector could not be decoded
    InvalidBootCatalog,
    /// Volume has no boot catalog
    NoBootCatalog,
    /// Catalog entry with an unknown indicator
    InvalidBootEntry,
    /// Validation entry words do not sum to zero
    ChecksumFailed,
    /// Encoded record would exceed 255 bytes
    RecordTooLong,
    /// Two siblings share a name
    DuplicateName,
    /// Boot image path is not a file in the tree
    BootImageMissing,
    /// Boot image shorter than a boot info table needs
    BootImageTooSmall,
    /// Layout runs past sector 2^32
    ImageTooLarge,
}

impl Iso9660Error {
    fn describe(self) -> &'static str {
        match self {
            Self::IoError => "block device read failed",
            Self::InvalidSignature => "missing CD001 volume descriptor",
            Self::UnsupportedVersion => "unsupported volume descriptor version",
            Self::InvalidDirectoryRecord => "malformed directory record",
            Self::NotFound => "no such file or directory",
            Self::PathTooLong => "path is nested too deeply",
            Self::InvalidPath => "wrong entry kind for this operation",
            Self::BufferTooSmall => "buffer is shorter than the file",
            Self::InvalidDatetime => "date out of range",
            Self::NoBootRecord => "no El Torito boot record",
            Self::InvalidBootCatalog => "malformed El Torito boot catalog",
            Self::NoBootCatalog => "volume has no boot catalog",
            Self::InvalidBootEntry => "malformed boot catalog entry",
            Self::ChecksumFailed => "boot catalog validation checksum mismatch",
            Self::RecordTooLong => "directory record longer than 255 bytes",
            Self::DuplicateName => "duplicate name in directory",
            Self::BootImageMissing => "boot image is not in the tree",
            Self::BootImageTooSmall => "boot image too small for a boot info table",
            Self::ImageTooLarge => "image exceeds 2^32 sectors",
        }
    }
}

impl fmt::Display for Iso9660Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl core::error::Error for Iso9660Error {}
