//! Reading file data out of a mounted volume

use crate::error::{Iso9660Error, Result};
use crate::types::{FileEntry, SECTOR_SIZE};
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Contiguous run of sectors holding one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// First 2048-byte sector
    pub lba: u32,
    /// Length in bytes
    pub length: u32,
}

impl Extent {
    /// Extent of `length` bytes starting at sector `lba`
    pub fn new(lba: u32, length: u32) -> Self {
        Self { lba, length }
    }

    /// Byte range of the extent inside a raw image
    pub fn byte_range(&self) -> core::ops::Range<usize> {
        let start = self.lba as usize * SECTOR_SIZE;
        start..start + self.length as usize
    }
}

/// Copy the contents of `file` into the front of `buffer`
///
/// Returns the file length. The last sector is read whole and truncated.
pub fn read_file<B: BlockIo>(block_io: &mut B, file: &FileEntry, buffer: &mut [u8]) -> Result<usize> {
    if file.is_directory() {
        return Err(Iso9660Error::InvalidPath);
    }
    let len = file.size as usize;
    let out = buffer.get_mut(..len).ok_or(Iso9660Error::BufferTooSmall)?;

    let mut sector = [0u8; SECTOR_SIZE];
    for (index, chunk) in out.chunks_mut(SECTOR_SIZE).enumerate() {
        block_io
            .read_blocks(Lba(u64::from(file.extent_lba) + index as u64), &mut sector)
            .map_err(|_| Iso9660Error::IoError)?;
        chunk.copy_from_slice(&sector[..chunk.len()]);
    }
    Ok(len)
}

/// [`read_file`] into a freshly allocated buffer
pub fn read_file_vec<B: BlockIo>(block_io: &mut B, file: &FileEntry) -> Result<Vec<u8>> {
    let mut data = alloc::vec![0u8; file.size as usize];
    read_file(block_io, file, &mut data)?;
    Ok(data)
}
