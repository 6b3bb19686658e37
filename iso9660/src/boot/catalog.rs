//! Boot catalog
//!
//! El Torito Boot Catalog structure: a validation entry, the initial/default
//! entry, then optional section headers each followed by their entries.

use crate::boot::entry::{BootEntry, SectionHeader};
use crate::boot::validation::ValidationEntry;
use crate::error::{Iso9660Error, Result};
use crate::types::{BootPlatform, SECTOR_SIZE};
use alloc::vec::Vec;

/// One catalog section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSection {
    /// Platform of the section entries
    pub platform: BootPlatform,
    /// Section entries
    pub entries: Vec<BootEntry>,
}

/// Boot Catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootCatalog {
    /// Validation entry
    pub validation: ValidationEntry,
    
    /// Initial/default boot entry
    pub initial_entry: BootEntry,

    /// Additional sections
    pub sections: Vec<BootSection>,
}

impl BootCatalog {
    /// Catalog entry size (32 bytes)
    pub const ENTRY_SIZE: usize = 32;
    
    /// Parse boot catalog from sector data
    pub fn parse(data: &[u8]) -> Result<Self> {
        let validation = ValidationEntry::parse(data).map_err(|e| match e {
            Iso9660Error::ChecksumFailed => Iso9660Error::ChecksumFailed,
            _ => Iso9660Error::InvalidBootCatalog,
        })?;
        let initial_entry = BootEntry::parse(&data[Self::ENTRY_SIZE..])?;

        let mut sections = Vec::new();
        let mut offset = 2 * Self::ENTRY_SIZE;
        while offset + Self::ENTRY_SIZE <= data.len() && SectionHeader::is_header(data[offset]) {
            let header = SectionHeader::parse(&data[offset..])?;
            offset += Self::ENTRY_SIZE;

            let mut entries = Vec::with_capacity(header.entry_count as usize);
            for _ in 0..header.entry_count {
                if offset + Self::ENTRY_SIZE > data.len() {
                    return Err(Iso9660Error::InvalidBootCatalog);
                }
                entries.push(BootEntry::parse(&data[offset..])?);
                offset += Self::ENTRY_SIZE;
            }
            sections.push(BootSection { platform: header.platform, entries });

            if header.final_header {
                break;
            }
        }

        Ok(Self { validation, initial_entry, sections })
    }

    /// Encode into one catalog sector
    pub fn to_sector(&self) -> Result<[u8; SECTOR_SIZE]> {
        let mut sector = [0u8; SECTOR_SIZE];
        sector[..Self::ENTRY_SIZE].copy_from_slice(&self.validation.to_bytes());
        sector[Self::ENTRY_SIZE..2 * Self::ENTRY_SIZE].copy_from_slice(&self.initial_entry.to_bytes());

        let mut offset = 2 * Self::ENTRY_SIZE;
        for (i, section) in self.sections.iter().enumerate() {
            let needed = (1 + section.entries.len()) * Self::ENTRY_SIZE;
            if offset + needed > SECTOR_SIZE {
                return Err(Iso9660Error::InvalidBootCatalog);
            }
            let header = SectionHeader {
                final_header: i + 1 == self.sections.len(),
                platform: section.platform,
                entry_count: section.entries.len() as u16,
            };
            sector[offset..offset + Self::ENTRY_SIZE].copy_from_slice(&header.to_bytes());
            offset += Self::ENTRY_SIZE;
            for entry in &section.entries {
                sector[offset..offset + Self::ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
                offset += Self::ENTRY_SIZE;
            }
        }
        Ok(sector)
    }

    /// Every bootable entry, paired with its platform
    pub fn images(&self) -> impl Iterator<Item = (BootPlatform, &BootEntry)> {
        core::iter::once((self.validation.platform, &self.initial_entry)).chain(
            self.sections
                .iter()
                .flat_map(|s| s.entries.iter().map(move |e| (s.platform, e))),
        )
    }
}
