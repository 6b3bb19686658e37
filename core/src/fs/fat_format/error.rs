// Common error type for FAT formatting and file operations

use super::FatKind;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatError {
    #[error("block I/O failed: {0}")]
    Io(String),

    #[error("partition too small for {0}")]
    PartitionTooSmall(FatKind),

    #[error("partition too large for {0}")]
    PartitionTooLarge(FatKind),

    #[error("invalid boot sector: {0}")]
    InvalidBootSector(&'static str),

    #[error("volume is full")]
    VolumeFull,

    #[error("directory is full")]
    DirectoryFull,

    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("invalid file name {0:?}")]
    InvalidName(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("file of {0} bytes does not fit in FAT")]
    FileTooLarge(u64),

    #[error("corrupt cluster chain at cluster {0}")]
    CorruptChain(u32),
}

impl FatError {
    pub(crate) fn io(err: impl fmt::Display) -> Self {
        FatError::Io(err.to_string())
    }
}
