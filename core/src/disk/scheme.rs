// Boot record and filesystem type selection

use crate::error::ConfigError;
use crate::fs::FatKind;
use std::fmt;
use std::str::FromStr;

/// Top-level bootable container convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootRecordType {
    /// El Torito optical image
    Cd,
    Mbr,
    Gpt,
}

impl BootRecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            BootRecordType::Cd => "CD",
            BootRecordType::Mbr => "MBR",
            BootRecordType::Gpt => "GPT",
        }
    }
}

impl fmt::Display for BootRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BootRecordType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_uppercase().as_str() {
            "CD" => Ok(BootRecordType::Cd),
            // HDD is what the test matrix calls a plain MBR disk
            "MBR" | "HDD" => Ok(BootRecordType::Mbr),
            "GPT" => Ok(BootRecordType::Gpt),
            _ => Err(ConfigError::UnknownBootRecord(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilesystemType {
    Fat12,
    Fat16,
    Fat32,
    Iso9660,
}

impl FilesystemType {
    pub fn as_str(self) -> &'static str {
        match self {
            FilesystemType::Fat12 => "FAT12",
            FilesystemType::Fat16 => "FAT16",
            FilesystemType::Fat32 => "FAT32",
            FilesystemType::Iso9660 => "ISO9660",
        }
    }

    pub fn fat_kind(self) -> Option<FatKind> {
        match self {
            FilesystemType::Fat12 => Some(FatKind::Fat12),
            FilesystemType::Fat16 => Some(FatKind::Fat16),
            FilesystemType::Fat32 => Some(FatKind::Fat32),
            FilesystemType::Iso9660 => None,
        }
    }

    pub fn is_fat(self) -> bool {
        self.fat_kind().is_some()
    }
}

impl fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilesystemType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_uppercase().as_str() {
            "FAT12" => Ok(FilesystemType::Fat12),
            "FAT16" => Ok(FilesystemType::Fat16),
            "FAT32" => Ok(FilesystemType::Fat32),
            "ISO9660" => Ok(FilesystemType::Iso9660),
            _ => Err(ConfigError::UnknownFilesystem(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boot_record() {
        assert_eq!("hdd".parse::<BootRecordType>().unwrap(), BootRecordType::Mbr);
        assert_eq!("GPT".parse::<BootRecordType>().unwrap(), BootRecordType::Gpt);
        assert_eq!(
            "APM".parse::<BootRecordType>(),
            Err(ConfigError::UnknownBootRecord("APM".into()))
        );
    }

    #[test]
    fn test_parse_filesystem() {
        assert_eq!("iso9660".parse::<FilesystemType>().unwrap(), FilesystemType::Iso9660);
        assert_eq!(FilesystemType::Fat16.fat_kind(), Some(FatKind::Fat16));
        assert!("ext4".parse::<FilesystemType>().is_err());
    }
}
