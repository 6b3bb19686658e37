// Partition information and type codes

use super::scheme::FilesystemType;
use gpt_disk_types::GptPartitionType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionInfo {
    pub index: u32,
    pub partition_type: PartitionType,
    pub start_lba: u64,
    pub end_lba: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionType {
    Fat12,
    Fat16,
    Fat32,
    /// Any FAT variant, as recorded in a GPT
    BasicData,
    EfiSystem,
    /// MBR entry covering an ISO9660 hybrid image
    IsoHybrid,
    GptProtective,
    Unknown,
}

impl PartitionInfo {
    pub fn sectors(&self) -> u64 {
        self.end_lba - self.start_lba + 1
    }

    pub fn size_mb(&self) -> u64 {
        (self.sectors() * 512) / (1024 * 1024)
    }

    pub fn type_name(&self) -> &'static str {
        match self.partition_type {
            PartitionType::Fat12 => "FAT12",
            PartitionType::Fat16 => "FAT16",
            PartitionType::Fat32 => "FAT32",
            PartitionType::BasicData => "Basic Data",
            PartitionType::EfiSystem => "EFI System",
            PartitionType::IsoHybrid => "ISO9660 Hybrid",
            PartitionType::GptProtective => "GPT Protective",
            PartitionType::Unknown => "Unknown",
        }
    }
}

impl PartitionType {
    /// Type used for a payload partition of the given filesystem
    pub fn for_filesystem(fs: FilesystemType) -> Self {
        match fs {
            FilesystemType::Fat12 => PartitionType::Fat12,
            FilesystemType::Fat16 => PartitionType::Fat16,
            FilesystemType::Fat32 => PartitionType::Fat32,
            FilesystemType::Iso9660 => PartitionType::IsoHybrid,
        }
    }

    pub fn mbr_id(self) -> u8 {
        match self {
            PartitionType::Fat12 => 0x01,
            // LBA-addressed variants
            PartitionType::Fat16 => 0x0E,
            PartitionType::Fat32 | PartitionType::BasicData => 0x0C,
            PartitionType::EfiSystem => 0xEF,
            PartitionType::IsoHybrid => 0x17,
            PartitionType::GptProtective => 0xEE,
            PartitionType::Unknown => 0x00,
        }
    }

    pub fn from_mbr_id(id: u8) -> Self {
        match id {
            0x01 => PartitionType::Fat12,
            0x04 | 0x06 | 0x0E => PartitionType::Fat16,
            0x0B | 0x0C => PartitionType::Fat32,
            0xEF => PartitionType::EfiSystem,
            0x17 => PartitionType::IsoHybrid,
            0xEE => PartitionType::GptProtective,
            _ => PartitionType::Unknown,
        }
    }

    /// Convert from gpt_disk_types GUID to PartitionType
    pub fn from_gpt_guid(guid: &GptPartitionType) -> Self {
        if guid == &GptPartitionType::EFI_SYSTEM {
            PartitionType::EfiSystem
        } else if guid == &GptPartitionType::BASIC_DATA {
            PartitionType::BasicData
        } else {
            PartitionType::Unknown
        }
    }

    /// Convert to gpt_disk_types GUID
    pub fn to_gpt_guid(self) -> GptPartitionType {
        match self {
            PartitionType::EfiSystem => GptPartitionType::EFI_SYSTEM,
            PartitionType::Fat12
            | PartitionType::Fat16
            | PartitionType::Fat32
            | PartitionType::BasicData => GptPartitionType::BASIC_DATA,
            PartitionType::IsoHybrid | PartitionType::GptProtective | PartitionType::Unknown => {
                GptPartitionType::UNUSED
            }
        }
    }
}
