// Geometry planner
//
// Every FAT image is a single partition starting one alignment unit into
// the disk. GPT needs one more unit at the end for the backup header and
// entry array. ISO9660 images are sized by the payload itself.

use super::scheme::{BootRecordType, FilesystemType};
use crate::error::ConfigError;

/// Alignment unit (1 MiB)
pub const UNIT: u64 = 1024 * 1024;

/// Partitioned layout, in units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub image_units: u64,
    pub payload_offset_units: u64,
    pub payload_units: u64,
}

impl Geometry {
    pub fn image_bytes(&self) -> u64 {
        self.image_units * UNIT
    }

    pub fn payload_offset_bytes(&self) -> u64 {
        self.payload_offset_units * UNIT
    }

    pub fn payload_bytes(&self) -> u64 {
        self.payload_units * UNIT
    }

    /// First 512-byte sector of the payload
    pub fn payload_start_lba(&self) -> u64 {
        self.payload_offset_bytes() / 512
    }

    /// Payload length in 512-byte sectors
    pub fn payload_sectors(&self) -> u64 {
        self.payload_bytes() / 512
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Size is only known once the ISO9660 payload is built
    Optical,
    Partitioned(Geometry),
}

/// Payload capacity per FAT variant
///
/// Smallest sizes that hold the loader binaries plus metadata with headroom,
/// and that keep the cluster count inside each variant's legal range.
pub fn payload_units(fs: FilesystemType) -> Option<u64> {
    match fs {
        FilesystemType::Fat12 => Some(3),
        FilesystemType::Fat16 => Some(32),
        FilesystemType::Fat32 => Some(64),
        FilesystemType::Iso9660 => None,
    }
}

pub fn plan(boot_record: BootRecordType, fs: FilesystemType) -> Result<Plan, ConfigError> {
    if boot_record == BootRecordType::Cd && fs != FilesystemType::Iso9660 {
        return Err(ConfigError::CdRequiresIso9660(fs));
    }
    let Some(payload_units) = payload_units(fs) else {
        return Ok(Plan::Optical);
    };

    let alignment = 1;
    let backup = u64::from(boot_record == BootRecordType::Gpt);
    Ok(Plan::Partitioned(Geometry {
        image_units: payload_units + alignment + backup,
        payload_offset_units: alignment,
        payload_units,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(br: BootRecordType, fs: FilesystemType) -> Geometry {
        match plan(br, fs).unwrap() {
            Plan::Partitioned(g) => g,
            Plan::Optical => panic!("expected a partitioned plan"),
        }
    }

    #[test]
    fn test_fat_capacities() {
        for (fs, units) in [
            (FilesystemType::Fat12, 3),
            (FilesystemType::Fat16, 32),
            (FilesystemType::Fat32, 64),
        ] {
            let mbr = geometry(BootRecordType::Mbr, fs);
            assert_eq!(mbr.payload_units, units);
            assert_eq!(mbr.image_units, units + 1);
            assert_eq!(mbr.payload_offset_units, 1);

            let gpt = geometry(BootRecordType::Gpt, fs);
            assert_eq!(gpt.image_units, units + 2);
            assert_eq!(gpt.payload_offset_units, 1);
        }
    }

    #[test]
    fn test_byte_helpers() {
        let g = geometry(BootRecordType::Mbr, FilesystemType::Fat32);
        assert_eq!(g.image_bytes(), 65 * UNIT);
        assert_eq!(g.payload_start_lba(), 2048);
        assert_eq!(g.payload_sectors(), 131072);
    }

    #[test]
    fn test_iso_is_optical() {
        for br in [BootRecordType::Cd, BootRecordType::Mbr, BootRecordType::Gpt] {
            assert_eq!(plan(br, FilesystemType::Iso9660).unwrap(), Plan::Optical);
        }
    }

    #[test]
    fn test_cd_requires_iso() {
        assert_eq!(
            plan(BootRecordType::Cd, FilesystemType::Fat32),
            Err(ConfigError::CdRequiresIso9660(FilesystemType::Fat32))
        );
    }
}
