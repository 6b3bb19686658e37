//! El Torito Boot Record Volume Descriptor
//!
//! A type 0 descriptor whose boot system identifier is
//! "EL TORITO SPECIFICATION" and which points at the boot catalog.

use crate::error::{Iso9660Error, Result};
use crate::types::{VolumeDescriptorType, SECTOR_SIZE};
use crate::volume::VolumeDescriptorHeader;

/// Boot system identifier of an El Torito boot record
pub const EL_TORITO_ID: &[u8] = b"EL TORITO SPECIFICATION";

/// Parse a boot record sector, returning the boot catalog LBA
///
/// Boot records for other boot systems yield `NoBootRecord`.
pub fn parse(data: &[u8]) -> Result<u32> {
    let header = VolumeDescriptorHeader::parse(data)?;
    if header.type_code != VolumeDescriptorType::BootRecord as u8 || data.len() < 75 {
        return Err(Iso9660Error::NoBootRecord);
    }

    let system_id = &data[7..39];
    let id_matches = system_id.starts_with(EL_TORITO_ID)
        && system_id[EL_TORITO_ID.len()..].iter().all(|&b| b == 0);
    if !id_matches {
        return Err(Iso9660Error::NoBootRecord);
    }

    Ok(u32::from_le_bytes([data[71], data[72], data[73], data[74]]))
}

/// Encode an El Torito boot record pointing at `catalog_lba`
pub fn encode(catalog_lba: u32) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    VolumeDescriptorHeader::write(&mut sector, VolumeDescriptorType::BootRecord);
    sector[7..7 + EL_TORITO_ID.len()].copy_from_slice(EL_TORITO_ID);
    sector[71..75].copy_from_slice(&catalog_lba.to_le_bytes());
    sector
}
