//! The 32-byte records of a boot catalog after the validation entry

use crate::error::{Iso9660Error, Result};
use crate::types::{BootMediaType, BootPlatform, VIRTUAL_SECTOR_SIZE};

const BOOTABLE: u8 = 0x88;
const NOT_BOOTABLE: u8 = 0x00;

/// Initial or section entry naming one boot image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootEntry {
    /// Indicator byte is 0x88
    pub bootable: bool,
    /// Emulation mode
    pub media_type: BootMediaType,
    /// Real-mode segment, 0 for the BIOS default of 0x7C0
    pub load_segment: u16,
    /// Partition type byte, only meaningful for hard disk emulation
    pub system_type: u8,
    /// 512-byte units loaded by the BIOS
    pub sector_count: u16,
    /// First 2048-byte sector of the image
    pub load_rba: u32,
}

impl BootEntry {
    /// Bootable no-emulation entry
    pub fn no_emulation(load_rba: u32, sector_count: u16) -> Self {
        Self {
            bootable: true,
            media_type: BootMediaType::NoEmulation,
            load_segment: 0,
            system_type: 0,
            sector_count,
            load_rba,
        }
    }

    /// Sector count covering `len` bytes, saturated to the 16-bit field
    pub fn sectors_for(len: u64) -> u16 {
        len.div_ceil(VIRTUAL_SECTOR_SIZE as u64).min(u16::MAX as u64) as u16
    }

    /// Decode an entry, rejecting indicator bytes other than 0x88 and 0x00
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw: &[u8; 32] = data
            .get(..32)
            .and_then(|d| d.try_into().ok())
            .ok_or(Iso9660Error::InvalidBootEntry)?;
        let bootable = match raw[0] {
            BOOTABLE => true,
            NOT_BOOTABLE => false,
            _ => return Err(Iso9660Error::InvalidBootEntry),
        };
        Ok(Self {
            bootable,
            media_type: BootMediaType::from_id(raw[1]),
            load_segment: u16::from_le_bytes([raw[2], raw[3]]),
            system_type: raw[4],
            sector_count: u16::from_le_bytes([raw[6], raw[7]]),
            load_rba: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
        })
    }

    /// On-disk form
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut raw = [0u8; 32];
        raw[0] = if self.bootable { BOOTABLE } else { NOT_BOOTABLE };
        raw[1] = self.media_type as u8;
        raw[2..4].copy_from_slice(&self.load_segment.to_le_bytes());
        raw[4] = self.system_type;
        raw[6..8].copy_from_slice(&self.sector_count.to_le_bytes());
        raw[8..12].copy_from_slice(&self.load_rba.to_le_bytes());
        raw
    }
}

/// Header opening a platform section of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Whether more headers follow this section
    pub final_header: bool,
    /// Platform of the entries in this section
    pub platform: BootPlatform,
    /// Number of section entries following
    pub entry_count: u16,
}

impl SectionHeader {
    /// Header indicator: more headers follow
    pub const MORE: u8 = 0x90;
    /// Header indicator: final header
    pub const FINAL: u8 = 0x91;

    /// Is `byte` a section header indicator?
    pub fn is_header(byte: u8) -> bool {
        byte == Self::MORE || byte == Self::FINAL
    }

    /// Parse a 32-byte header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 32 || !Self::is_header(data[0]) {
            return Err(Iso9660Error::InvalidBootCatalog);
        }
        Ok(Self {
            final_header: data[0] == Self::FINAL,
            platform: BootPlatform::from_id(data[1]).ok_or(Iso9660Error::InvalidBootCatalog)?,
            entry_count: u16::from_le_bytes([data[2], data[3]]),
        })
    }

    /// Encode to 32 bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[0] = if self.final_header { Self::FINAL } else { Self::MORE };
        bytes[1] = self.platform.id();
        bytes[2..4].copy_from_slice(&self.entry_count.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_count_saturates() {
        assert_eq!(BootEntry::sectors_for(2048), 4);
        assert_eq!(BootEntry::sectors_for(1 << 20), 2048);
        assert_eq!(BootEntry::sectors_for(1 << 30), u16::MAX);
    }

    #[test]
    fn test_entry_layout() {
        let bytes = BootEntry::no_emulation(21, 4).to_bytes();
        assert_eq!(bytes[0], 0x88);
        assert_eq!(&bytes[6..12], &[4, 0, 21, 0, 0, 0]);
        assert_eq!(BootEntry::parse(&bytes).unwrap().load_rba, 21);
    }

    #[test]
    fn test_unknown_indicator_rejected() {
        let mut bytes = BootEntry::no_emulation(21, 4).to_bytes();
        bytes[0] = 0x44;
        assert_eq!(BootEntry::parse(&bytes), Err(Iso9660Error::InvalidBootEntry));
        bytes[0] = 0x00;
        assert!(!BootEntry::parse(&bytes).unwrap().bootable);
    }
}
