// Master Boot Record partition table

use super::block::SECTOR_SIZE;
use super::partition::{PartitionInfo, PartitionType};
use super::PartitionError;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

pub const PARTITION_TABLE_OFFSET: usize = 0x1BE;
pub const SIGNATURE_OFFSET: usize = 0x1FE;
pub const SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const MAX_ENTRIES: usize = 4;

const ENTRY_SIZE: usize = 16;
const HEADS: u64 = 255;
const SECTORS_PER_TRACK: u64 = 63;

/// Byte offset of the ISO9660 standard identifier in a raw image
const ISO_IDENTIFIER_OFFSET: usize = 16 * 2048 + 1;
/// GPT header locations probed for 512 and 4096 byte sectors
const GPT_PROBE_OFFSETS: [usize; 2] = [512, 4096];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbrEntry {
    pub bootable: bool,
    pub partition_type: PartitionType,
    pub start_lba: u32,
    pub sectors: u32,
}

impl MbrEntry {
    fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut raw = [0u8; ENTRY_SIZE];
        let last = u64::from(self.start_lba) + u64::from(self.sectors).saturating_sub(1);

        raw[0] = if self.bootable { 0x80 } else { 0x00 };
        raw[1..4].copy_from_slice(&chs(u64::from(self.start_lba)));
        raw[4] = self.partition_type.mbr_id();
        raw[5..8].copy_from_slice(&chs(last));
        raw[8..12].copy_from_slice(&self.start_lba.to_le_bytes());
        raw[12..16].copy_from_slice(&self.sectors.to_le_bytes());
        raw
    }

    fn decode(raw: &[u8]) -> Option<Self> {
        let type_id = raw[4];
        let sectors = u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]);
        if type_id == 0 || sectors == 0 {
            return None;
        }
        Some(Self {
            bootable: raw[0] & 0x80 != 0,
            partition_type: PartitionType::from_mbr_id(type_id),
            start_lba: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            sectors,
        })
    }
}

/// CHS triple for an LBA, saturating at the 1023/254/63 limit
pub fn chs(lba: u64) -> [u8; 3] {
    let cylinder = lba / (HEADS * SECTORS_PER_TRACK);
    if cylinder > 1023 {
        return [0xFE, 0xFF, 0xFF];
    }
    let head = (lba / SECTORS_PER_TRACK) % HEADS;
    let sector = lba % SECTORS_PER_TRACK + 1;

    [
        head as u8,
        (sector as u8 & 0x3F) | (((cylinder >> 8) as u8 & 0x03) << 6),
        cylinder as u8,
    ]
}

/// Write the partition table into sector 0, keeping the boot code area
pub fn write_mbr<B: BlockIo>(mut io: B, entries: &[MbrEntry]) -> Result<(), PartitionError> {
    if entries.len() > MAX_ENTRIES {
        return Err(PartitionError::TooManyPartitions("MBR"));
    }

    let total = io.num_blocks().map_err(PartitionError::io)?;
    for entry in entries {
        let end = u64::from(entry.start_lba) + u64::from(entry.sectors);
        if entry.sectors == 0 || end > total {
            return Err(PartitionError::InvalidRange {
                start: u64::from(entry.start_lba),
                end,
            });
        }
    }

    let mut sector = [0u8; SECTOR_SIZE];
    io.read_blocks(Lba(0), &mut sector)
        .map_err(PartitionError::io)?;

    sector[PARTITION_TABLE_OFFSET..SIGNATURE_OFFSET].fill(0);
    for (slot, entry) in entries.iter().enumerate() {
        let offset = PARTITION_TABLE_OFFSET + slot * ENTRY_SIZE;
        sector[offset..offset + ENTRY_SIZE].copy_from_slice(&entry.encode());
    }
    sector[SIGNATURE_OFFSET..].copy_from_slice(&SIGNATURE);

    io.write_blocks(Lba(0), &sector)
        .map_err(PartitionError::io)?;
    io.flush().map_err(PartitionError::io)?;
    Ok(())
}

/// Read the primary MBR partition entries
pub fn read_partition_table<B: BlockIo>(mut io: B) -> Result<Vec<PartitionInfo>, PartitionError> {
    let mut sector = [0u8; SECTOR_SIZE];
    io.read_blocks(Lba(0), &mut sector)
        .map_err(PartitionError::io)?;

    if !has_boot_signature(&sector) {
        return Err(PartitionError::MissingSignature);
    }

    let mut partitions = Vec::new();
    for slot in 0..MAX_ENTRIES {
        let offset = PARTITION_TABLE_OFFSET + slot * ENTRY_SIZE;
        if let Some(entry) = MbrEntry::decode(&sector[offset..offset + ENTRY_SIZE]) {
            let start = u64::from(entry.start_lba);
            partitions.push(PartitionInfo {
                index: slot as u32,
                partition_type: entry.partition_type,
                start_lba: start,
                end_lba: start + u64::from(entry.sectors) - 1,
            });
        }
    }
    Ok(partitions)
}

pub fn has_boot_signature(sector0: &[u8]) -> bool {
    sector0.len() >= SECTOR_SIZE && sector0[SIGNATURE_OFFSET..SECTOR_SIZE] == SIGNATURE
}

/// Raw image check for a GPT header at either sector size
pub fn has_gpt_signature(image: &[u8]) -> bool {
    GPT_PROBE_OFFSETS
        .iter()
        .any(|&offset| image.get(offset..offset + 8) == Some(b"EFI PART".as_slice()))
}

/// Raw image check for an ISO9660 primary volume descriptor
pub fn is_iso9660(image: &[u8]) -> bool {
    image.get(ISO_IDENTIFIER_OFFSET..ISO_IDENTIFIER_OFFSET + 5) == Some(b"CD001".as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block::MemoryDisk;

    #[test]
    fn test_chs() {
        assert_eq!(chs(0), [0, 1, 0]);
        assert_eq!(chs(2048), [32, 33, 0]);
        assert_eq!(chs(u64::from(u32::MAX)), [0xFE, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_and_read_table() {
        let mut data = vec![0u8; 4096 * SECTOR_SIZE];
        data[0] = 0xEB;

        let entry = MbrEntry {
            bootable: true,
            partition_type: PartitionType::Fat16,
            start_lba: 2048,
            sectors: 2048,
        };
        write_mbr(MemoryDisk::new(&mut data), &[entry]).unwrap();

        assert_eq!(data[0], 0xEB, "boot code area must survive");
        assert!(has_boot_signature(&data));
        assert_eq!(data[PARTITION_TABLE_OFFSET], 0x80);
        assert_eq!(data[PARTITION_TABLE_OFFSET + 4], 0x0E);

        let table = read_partition_table(MemoryDisk::new(&mut data)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].start_lba, 2048);
        assert_eq!(table[0].end_lba, 4095);
        assert_eq!(table[0].partition_type, PartitionType::Fat16);
    }

    #[test]
    fn test_entry_must_fit() {
        let mut data = vec![0u8; 16 * SECTOR_SIZE];
        let entry = MbrEntry {
            bootable: false,
            partition_type: PartitionType::Fat12,
            start_lba: 8,
            sectors: 9,
        };
        assert!(matches!(
            write_mbr(MemoryDisk::new(&mut data), &[entry]),
            Err(PartitionError::InvalidRange { start: 8, end: 17 })
        ));
    }

    #[test]
    fn test_signatures() {
        let mut image = vec![0u8; 40 * 1024];
        assert!(!has_gpt_signature(&image));
        assert!(!is_iso9660(&image));

        image[4096..4104].copy_from_slice(b"EFI PART");
        assert!(has_gpt_signature(&image));

        image[32769..32774].copy_from_slice(b"CD001");
        assert!(is_iso9660(&image));
        assert!(!has_gpt_signature(&image[..100]));
    }
}
