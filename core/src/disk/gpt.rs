// GPT operations using gpt-disk-rs

use super::partition::{PartitionInfo, PartitionType};
use super::PartitionError;
use gpt_disk_io::{BlockIo, Disk};
use gpt_disk_types::{BlockSize, GptHeader, GptPartitionEntryArray, LbaLe, U32Le};
use uguid::Guid;
use uuid::Uuid;

const ENTRY_COUNT: u32 = 128;
const ENTRY_ARRAY_BYTES: usize = 128 * 128;
/// Header plus the entry array, at either end of the disk
pub const RESERVED_SECTORS: u64 = 1 + (ENTRY_ARRAY_BYTES as u64) / 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GptPartitionSpec {
    pub partition_type: PartitionType,
    pub start_lba: u64,
    pub end_lba: u64,
}

pub fn random_guid() -> Guid {
    Guid::from_bytes(Uuid::new_v4().to_bytes_le())
}

/// Write both primary and secondary GPT headers and partition arrays
fn write_gpt_both<B: BlockIo>(
    disk: &mut Disk<B>,
    header: &GptHeader,
    entry_array: &GptPartitionEntryArray,
) -> Result<(), PartitionError> {
    disk.write_primary_gpt_header(header, &mut [0u8; 512])
        .map_err(PartitionError::io)?;
    disk.write_gpt_partition_entry_array(entry_array)
        .map_err(PartitionError::io)?;

    // Secondary copy swaps the header locations and keeps its array
    // directly in front of the backup header
    let mut secondary_header = header.clone();
    secondary_header.my_lba = header.alternate_lba;
    secondary_header.alternate_lba = header.my_lba;
    secondary_header.partition_entry_lba =
        LbaLe::from_u64(header.alternate_lba.to_u64() - (RESERVED_SECTORS - 1));
    secondary_header.update_header_crc32();

    disk.write_secondary_gpt_header(&secondary_header, &mut [0u8; 512])
        .map_err(PartitionError::io)?;

    let secondary_layout = secondary_header
        .get_partition_entry_array_layout()
        .map_err(|_| PartitionError::InvalidHeader)?;
    let mut secondary_buf = entry_array.storage().to_vec();
    let secondary_entry_array =
        GptPartitionEntryArray::new(secondary_layout, BlockSize::BS_512, &mut secondary_buf)
            .map_err(|_| PartitionError::InvalidHeader)?;
    disk.write_gpt_partition_entry_array(&secondary_entry_array)
        .map_err(PartitionError::io)?;

    disk.flush().map_err(PartitionError::io)?;
    Ok(())
}

/// Create a fresh GPT holding the given partitions
///
/// Sector 0 receives a protective MBR. Returns the disk GUID.
pub fn write_gpt<B: BlockIo>(
    mut io: B,
    partitions: &[GptPartitionSpec],
) -> Result<Guid, PartitionError> {
    let num_blocks = io.num_blocks().map_err(PartitionError::io)?;
    if num_blocks < 2 * RESERVED_SECTORS + 2 {
        return Err(PartitionError::InvalidRange {
            start: 0,
            end: num_blocks,
        });
    }
    if partitions.len() > ENTRY_COUNT as usize {
        return Err(PartitionError::TooManyPartitions("GPT"));
    }

    let first_usable = RESERVED_SECTORS + 1;
    let last_usable = num_blocks - RESERVED_SECTORS - 1;
    for spec in partitions {
        if spec.start_lba < first_usable || spec.end_lba > last_usable || spec.start_lba > spec.end_lba
        {
            return Err(PartitionError::InvalidRange {
                start: spec.start_lba,
                end: spec.end_lba,
            });
        }
    }

    let mut disk = Disk::new(io).map_err(PartitionError::io)?;

    let disk_guid = random_guid();
    let mut header = GptHeader {
        my_lba: LbaLe::from_u64(1),
        alternate_lba: LbaLe::from_u64(num_blocks - 1),
        first_usable_lba: LbaLe::from_u64(first_usable),
        last_usable_lba: LbaLe::from_u64(last_usable),
        disk_guid,
        partition_entry_lba: LbaLe::from_u64(2),
        number_of_partition_entries: U32Le::from_u32(ENTRY_COUNT),
        ..Default::default()
    };

    disk.write_protective_mbr(&mut [0u8; 512])
        .map_err(PartitionError::io)?;

    let layout = header
        .get_partition_entry_array_layout()
        .map_err(|_| PartitionError::InvalidHeader)?;
    let mut entry_buf = vec![0u8; ENTRY_ARRAY_BYTES];
    let mut entry_array = GptPartitionEntryArray::new(layout, BlockSize::BS_512, &mut entry_buf)
        .map_err(|_| PartitionError::InvalidHeader)?;

    for (slot, spec) in (0u32..).zip(partitions) {
        let entry = entry_array
            .get_partition_entry_mut(slot)
            .ok_or(PartitionError::TooManyPartitions("GPT"))?;
        entry.partition_type_guid = spec.partition_type.to_gpt_guid();
        entry.unique_partition_guid = random_guid();
        entry.starting_lba = LbaLe::from_u64(spec.start_lba);
        entry.ending_lba = LbaLe::from_u64(spec.end_lba);
        entry.attributes = Default::default();
    }

    header.partition_entry_array_crc32 = entry_array.calculate_crc32();
    header.update_header_crc32();

    write_gpt_both(&mut disk, &header, &entry_array)?;

    tracing::debug!(
        disk_guid = %disk_guid,
        partitions = partitions.len(),
        "wrote GPT"
    );
    Ok(disk_guid)
}

/// Scan the primary GPT for used entries
pub fn read_partitions<B: BlockIo>(io: B) -> Result<Vec<PartitionInfo>, PartitionError> {
    let mut disk = Disk::new(io).map_err(PartitionError::io)?;

    let header = disk
        .read_primary_gpt_header(&mut [0u8; 512])
        .map_err(PartitionError::io)?;
    if !header.is_signature_valid() {
        return Err(PartitionError::InvalidHeader);
    }

    let layout = header
        .get_partition_entry_array_layout()
        .map_err(|_| PartitionError::InvalidHeader)?;

    let mut block_buf = [0u8; 512];
    let iter = disk
        .gpt_partition_entry_array_iter(layout, &mut block_buf)
        .map_err(PartitionError::io)?;

    let mut partitions = Vec::new();
    for (index, entry_result) in (0u32..).zip(iter) {
        let entry = entry_result.map_err(PartitionError::io)?;
        if !entry.is_used() {
            continue;
        }

        // Copy the guid to avoid unaligned reference
        let guid = entry.partition_type_guid;
        partitions.push(PartitionInfo {
            index,
            partition_type: PartitionType::from_gpt_guid(&guid),
            start_lba: entry.starting_lba.to_u64(),
            end_lba: entry.ending_lba.to_u64(),
        });
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::block::MemoryDisk;
    use crate::disk::mbr;

    const DISK_SECTORS: usize = 4 * 2048;

    #[test]
    fn test_write_then_scan() {
        let mut data = vec![0u8; DISK_SECTORS * 512];
        let spec = GptPartitionSpec {
            partition_type: PartitionType::Fat16,
            start_lba: 2048,
            end_lba: 3 * 2048 - 1,
        };
        write_gpt(MemoryDisk::new(&mut data), &[spec]).unwrap();

        assert!(mbr::has_gpt_signature(&data));
        // Backup header lives in the last sector
        let backup = (DISK_SECTORS - 1) * 512;
        assert_eq!(&data[backup..backup + 8], b"EFI PART");

        let protective = mbr::read_partition_table(MemoryDisk::new(&mut data)).unwrap();
        assert_eq!(protective[0].partition_type, PartitionType::GptProtective);

        let partitions = read_partitions(MemoryDisk::new(&mut data)).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].partition_type, PartitionType::BasicData);
        assert_eq!(partitions[0].start_lba, 2048);
        assert_eq!(partitions[0].size_mb(), 2);
    }

    #[test]
    fn test_partition_must_be_usable() {
        let mut data = vec![0u8; DISK_SECTORS * 512];
        let spec = GptPartitionSpec {
            partition_type: PartitionType::EfiSystem,
            start_lba: 2048,
            end_lba: DISK_SECTORS as u64 - 1,
        };
        assert!(matches!(
            write_gpt(MemoryDisk::new(&mut data), &[spec]),
            Err(PartitionError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_blank_disk_has_no_gpt() {
        let mut data = vec![0u8; DISK_SECTORS * 512];
        assert!(matches!(
            read_partitions(MemoryDisk::new(&mut data)),
            Err(PartitionError::InvalidHeader)
        ));
    }
}
