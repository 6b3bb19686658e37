//! Primary Volume Descriptor
//!
//! The Primary Volume Descriptor (PVD) is always present and describes
//! the basic ISO9660 filesystem structure. See ECMA-119 8.4.

use crate::error::{Iso9660Error, Result};
use crate::types::{VolumeDescriptorType, SECTOR_SIZE};
use crate::utils::datetime::DateTime17;
use crate::utils::sector::{get_both_u16, get_both_u32, put_both_u16, put_both_u32};
use crate::utils::string::write_padded;
use crate::volume::VolumeDescriptorHeader;

/// Fields of a parsed Primary Volume Descriptor
#[derive(Debug, Clone)]
pub struct PrimaryVolumeDescriptor {
    /// System identifier (32 a-characters)
    pub system_id: [u8; 32],
    
    /// Volume identifier (32 d-characters)
    pub volume_id: [u8; 32],
    
    /// Volume space size in logical blocks
    pub volume_space_size: u32,
    
    /// Logical block size (usually 2048)
    pub logical_block_size: u16,
    
    /// Path table size in bytes
    pub path_table_size: u32,
    
    /// Type L path table location
    pub type_l_path_table: u32,
    
    /// Type M path table location
    pub type_m_path_table: u32,
    
    /// Root directory record (34 bytes)
    pub root_directory_record: [u8; 34],

    /// Volume creation date
    pub created: Option<DateTime17>,
}

/// Parse Primary Volume Descriptor from sector data
pub fn parse(data: &[u8]) -> Result<PrimaryVolumeDescriptor> {
    if data.len() < SECTOR_SIZE {
        return Err(Iso9660Error::InvalidSignature);
    }

    let header = VolumeDescriptorHeader::parse(data)?;
    if header.type_code != VolumeDescriptorType::Primary as u8 {
        return Err(Iso9660Error::InvalidSignature);
    }

    let mut pvd = PrimaryVolumeDescriptor {
        system_id: [0; 32],
        volume_id: [0; 32],
        volume_space_size: get_both_u32(&data[80..88]),
        logical_block_size: get_both_u16(&data[128..132]),
        path_table_size: get_both_u32(&data[132..140]),
        type_l_path_table: u32::from_le_bytes([data[140], data[141], data[142], data[143]]),
        type_m_path_table: u32::from_be_bytes([data[148], data[149], data[150], data[151]]),
        root_directory_record: [0; 34],
        created: None,
    };
    pvd.system_id.copy_from_slice(&data[8..40]);
    pvd.volume_id.copy_from_slice(&data[40..72]);
    pvd.root_directory_record.copy_from_slice(&data[156..190]);

    let mut created = [0u8; 17];
    created.copy_from_slice(&data[813..830]);
    pvd.created = DateTime17::from_bytes(&created);

    Ok(pvd)
}

/// Values needed to encode a Primary Volume Descriptor
pub struct PrimaryFields<'a> {
    /// System identifier
    pub system_id: &'a str,
    /// Volume identifier
    pub volume_id: &'a str,
    /// Application identifier
    pub application_id: &'a str,
    /// Volume space size in sectors
    pub volume_space_size: u32,
    /// Path table size in bytes
    pub path_table_size: u32,
    /// Type L path table sector
    pub type_l_path_table: u32,
    /// Type M path table sector
    pub type_m_path_table: u32,
    /// Encoded root directory record (34 bytes, no System Use)
    pub root_directory_record: &'a [u8],
    /// Creation and modification date
    pub created: DateTime17,
}

/// Encode a Primary Volume Descriptor sector
pub fn encode(fields: &PrimaryFields<'_>) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    VolumeDescriptorHeader::write(&mut sector, VolumeDescriptorType::Primary);

    write_padded(&mut sector[8..40], fields.system_id);
    write_padded(&mut sector[40..72], fields.volume_id);
    put_both_u32(&mut sector[80..88], fields.volume_space_size);
    put_both_u16(&mut sector[120..124], 1);
    put_both_u16(&mut sector[124..128], 1);
    put_both_u16(&mut sector[128..132], SECTOR_SIZE as u16);
    put_both_u32(&mut sector[132..140], fields.path_table_size);
    sector[140..144].copy_from_slice(&fields.type_l_path_table.to_le_bytes());
    sector[148..152].copy_from_slice(&fields.type_m_path_table.to_be_bytes());
    sector[156..190].copy_from_slice(&fields.root_directory_record[..34]);

    // Volume set, publisher, preparer and application identifiers
    write_padded(&mut sector[190..318], "");
    write_padded(&mut sector[318..446], "");
    write_padded(&mut sector[446..574], "");
    write_padded(&mut sector[574..702], fields.application_id);
    // Copyright, abstract and bibliographic file identifiers
    write_padded(&mut sector[702..813], "");

    let created = fields.created.to_bytes();
    sector[813..830].copy_from_slice(&created);
    sector[830..847].copy_from_slice(&created);
    sector[847..864].copy_from_slice(&DateTime17::UNSPECIFIED);
    sector[864..881].copy_from_slice(&DateTime17::UNSPECIFIED);
    sector[881] = 1; // File structure version
    sector
}
