// Protective disk label over an ISO9660 image
//
// With an EFI boot image the label is a GPT (behind a protective MBR) whose
// only entry is the EFI system partition. Without one it is a single MBR
// entry of type 0x17 spanning the image after sector 0.

use crate::disk::gpt::{self, GptPartitionSpec, RESERVED_SECTORS};
use crate::disk::mbr::{self, MbrEntry};
use crate::disk::{MemoryDisk, PartitionError, PartitionType, SECTOR_SIZE};
use iso9660::Extent;

const ISO_SECTOR_SIZE: usize = 2048;
/// 512-byte sectors per ISO sector
const SECTORS_PER_ISO_SECTOR: u64 = (ISO_SECTOR_SIZE / SECTOR_SIZE) as u64;

fn sectors(image: &[u8]) -> u64 {
    (image.len() / SECTOR_SIZE) as u64
}

/// Write the label, growing `image` when the backup GPT needs room
pub fn apply_label(image: &mut Vec<u8>, efi_image: Option<Extent>) -> Result<(), PartitionError> {
    match efi_image {
        Some(efi) => {
            let padded = (image.len() + RESERVED_SECTORS as usize * SECTOR_SIZE)
                .next_multiple_of(ISO_SECTOR_SIZE);
            image.resize(padded, 0);

            let start = u64::from(efi.lba) * SECTORS_PER_ISO_SECTOR;
            let length = u64::from(efi.length).div_ceil(SECTOR_SIZE as u64).max(1);
            gpt::write_gpt(
                MemoryDisk::new(image),
                &[GptPartitionSpec {
                    partition_type: PartitionType::EfiSystem,
                    start_lba: start,
                    end_lba: start + length - 1,
                }],
            )?;
        }
        None => {
            let total = u32::try_from(sectors(image)).map_err(|_| PartitionError::InvalidRange {
                start: 1,
                end: sectors(image),
            })?;
            mbr::write_mbr(
                MemoryDisk::new(image),
                &[MbrEntry {
                    bootable: true,
                    partition_type: PartitionType::IsoHybrid,
                    start_lba: 1,
                    sectors: total - 1,
                }],
            )?;
        }
    }
    Ok(())
}
