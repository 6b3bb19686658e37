// Disk layout: boot record selection, geometry and partition tables

pub mod block;
pub mod geometry;
pub mod gpt;
pub mod mbr;
pub mod partition;
pub mod scheme;

pub use block::{FileDisk, MemoryDisk, SECTOR_SIZE};
pub use geometry::{plan, Geometry, Plan, UNIT};
pub use partition::{PartitionInfo, PartitionType};
pub use scheme::{BootRecordType, FilesystemType};

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("disk I/O failed: {0}")]
    Io(String),

    #[error("invalid GPT header")]
    InvalidHeader,

    #[error("missing MBR boot signature")]
    MissingSignature,

    #[error("partition range {start}..{end} does not fit the disk")]
    InvalidRange { start: u64, end: u64 },

    #[error("too many partitions for a {0} table")]
    TooManyPartitions(&'static str),
}

impl PartitionError {
    pub(crate) fn io(err: impl fmt::Display) -> Self {
        PartitionError::Io(err.to_string())
    }
}

/// Lay out the single payload partition of a FAT image
pub fn write_partition_table<B: gpt_disk_io::BlockIo>(
    io: B,
    boot_record: BootRecordType,
    fs: FilesystemType,
    geometry: &Geometry,
) -> Result<(), PartitionError> {
    let partition_type = PartitionType::for_filesystem(fs);
    let start = geometry.payload_start_lba();
    let sectors = geometry.payload_sectors();

    match boot_record {
        BootRecordType::Gpt => {
            gpt::write_gpt(
                io,
                &[gpt::GptPartitionSpec {
                    partition_type,
                    start_lba: start,
                    end_lba: start + sectors - 1,
                }],
            )?;
        }
        BootRecordType::Mbr | BootRecordType::Cd => {
            let start_lba = u32::try_from(start).map_err(|_| PartitionError::InvalidRange {
                start,
                end: start + sectors,
            })?;
            let sector_count = u32::try_from(sectors).map_err(|_| {
                PartitionError::InvalidRange {
                    start,
                    end: start + sectors,
                }
            })?;
            mbr::write_mbr(
                io,
                &[mbr::MbrEntry {
                    bootable: true,
                    partition_type,
                    start_lba,
                    sectors: sector_count,
                }],
            )?;
        }
    }
    Ok(())
}
