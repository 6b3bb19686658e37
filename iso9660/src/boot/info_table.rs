//! Boot information table
//!
//! No-emulation boot images built with `-boot-info-table` receive a 56-byte
//! table at offset 8: the PVD LBA, the image LBA, the image length and a
//! 32-bit checksum of the image from offset 64 to its end.

use crate::error::{Iso9660Error, Result};
use crate::utils::checksum::checksum_32;

/// Offset of the table inside the boot image
pub const TABLE_OFFSET: usize = 8;

/// First byte covered by the checksum
pub const CHECKSUM_START: usize = 64;

/// Parsed boot information table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootInfoTable {
    /// LBA of the Primary Volume Descriptor
    pub pvd_lba: u32,
    /// LBA of the boot image
    pub file_lba: u32,
    /// Boot image length in bytes
    pub file_length: u32,
    /// Checksum of the image from byte 64
    pub checksum: u32,
}

impl BootInfoTable {
    /// Read the table back from a patched image
    pub fn read(image: &[u8]) -> Option<Self> {
        if image.len() < CHECKSUM_START {
            return None;
        }
        let word = |at: usize| {
            u32::from_le_bytes([image[at], image[at + 1], image[at + 2], image[at + 3]])
        };
        Some(Self {
            pvd_lba: word(TABLE_OFFSET),
            file_lba: word(TABLE_OFFSET + 4),
            file_length: word(TABLE_OFFSET + 8),
            checksum: word(TABLE_OFFSET + 12),
        })
    }
}

/// Patch the table into `image`, which is the boot file placed at `file_lba`
pub fn patch(image: &mut [u8], pvd_lba: u32, file_lba: u32) -> Result<BootInfoTable> {
    if image.len() < CHECKSUM_START {
        return Err(Iso9660Error::BootImageTooSmall);
    }
    let table = BootInfoTable {
        pvd_lba,
        file_lba,
        file_length: image.len() as u32,
        checksum: checksum_32(&image[CHECKSUM_START..]),
    };
    image[TABLE_OFFSET..CHECKSUM_START].fill(0);
    image[TABLE_OFFSET..TABLE_OFFSET + 4].copy_from_slice(&table.pvd_lba.to_le_bytes());
    image[TABLE_OFFSET + 4..TABLE_OFFSET + 8].copy_from_slice(&table.file_lba.to_le_bytes());
    image[TABLE_OFFSET + 8..TABLE_OFFSET + 12].copy_from_slice(&table.file_length.to_le_bytes());
    image[TABLE_OFFSET + 12..TABLE_OFFSET + 16].copy_from_slice(&table.checksum.to_le_bytes());
    Ok(table)
}
