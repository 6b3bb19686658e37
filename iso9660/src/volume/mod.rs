//! Volume descriptor set
//!
//! Descriptors occupy one sector each from sector 16 up to the terminator.
//! Only the primary descriptor and the El Torito boot record are read.

pub mod boot_record;
pub mod primary;

use crate::directory::record::DirectoryRecord;
use crate::error::{Iso9660Error, Result};
use crate::extensions::rock_ridge;
use crate::types::{VolumeDescriptorType, VolumeInfo, SECTOR_SIZE, VOLUME_DESCRIPTOR_START};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Descriptors scanned before giving up on a terminator
const MAX_DESCRIPTORS: u64 = 100;

fn read_sector<B: BlockIo>(block_io: &mut B, lba: u64, sector: &mut [u8; SECTOR_SIZE]) -> Result<()> {
    block_io
        .read_blocks(Lba(lba), sector)
        .map_err(|_| Iso9660Error::IoError)
}

/// Mount the volume whose sector 0 sits at `start_sector` of a 2048-byte device
///
/// Fails with `InvalidSignature` when no primary descriptor precedes the
/// terminator. A malformed boot record is ignored rather than fatal.
pub fn mount<B: BlockIo>(block_io: &mut B, start_sector: u64) -> Result<VolumeInfo> {
    let mut sector = [0u8; SECTOR_SIZE];
    let mut catalog = None;
    let mut found = None;

    for index in 0..MAX_DESCRIPTORS {
        read_sector(block_io, start_sector + VOLUME_DESCRIPTOR_START + index, &mut sector)?;
        let header = VolumeDescriptorHeader::parse(&sector)?;
        if header.type_code == VolumeDescriptorType::Terminator as u8 {
            break;
        }
        if header.type_code == VolumeDescriptorType::BootRecord as u8 {
            catalog = boot_record::parse(&sector).ok();
        } else if header.type_code == VolumeDescriptorType::Primary as u8 {
            let pvd = primary::parse(&sector)?;
            let root = DirectoryRecord::parse(&pvd.root_directory_record)?;
            found = Some(VolumeInfo {
                volume_id: pvd.volume_id,
                root_extent_lba: root.get_extent_lba(),
                root_extent_len: root.get_data_length(),
                logical_block_size: pvd.logical_block_size,
                volume_space_size: pvd.volume_space_size,
                boot_catalog_lba: None,
                has_rock_ridge: false,
            });
        }
    }

    let mut volume = found.ok_or(Iso9660Error::InvalidSignature)?;
    volume.boot_catalog_lba = catalog;
    volume.has_rock_ridge = root_has_susp(block_io, start_sector, &volume)?;
    Ok(volume)
}

/// Rock Ridge volumes announce SUSP in the System Use of the root `.` record
fn root_has_susp<B: BlockIo>(block_io: &mut B, start_sector: u64, volume: &VolumeInfo) -> Result<bool> {
    let mut sector = [0u8; SECTOR_SIZE];
    read_sector(block_io, start_sector + u64::from(volume.root_extent_lba), &mut sector)?;
    Ok(DirectoryRecord::parse(&sector)
        .map(|dot| rock_ridge::has_sharing_protocol(dot.system_use()))
        .unwrap_or(false))
}

/// Type, `CD001` and version bytes shared by every descriptor
#[derive(Debug, Clone, Copy)]
pub struct VolumeDescriptorHeader {
    /// Descriptor type byte
    pub type_code: u8,
    /// Descriptor version, 1 for every type read here
    pub version: u8,
}

impl VolumeDescriptorHeader {
    /// Standard identifier
    pub const MAGIC: &'static [u8; 5] = b"CD001";

    /// Check the identifier and version of a descriptor sector
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data.get(..7) {
            Some([type_code, id @ .., version]) if id == Self::MAGIC => {
                if *version != 1 {
                    return Err(Iso9660Error::UnsupportedVersion);
                }
                Ok(Self {
                    type_code: *type_code,
                    version: *version,
                })
            }
            _ => Err(Iso9660Error::InvalidSignature),
        }
    }

    /// Stamp a header of `kind` at the front of `sector`
    pub fn write(sector: &mut [u8], kind: VolumeDescriptorType) {
        sector[0] = kind as u8;
        sector[1..6].copy_from_slice(Self::MAGIC);
        sector[6] = 1;
    }
}

/// Encode the Volume Descriptor Set Terminator
pub fn terminator() -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    VolumeDescriptorHeader::write(&mut sector, VolumeDescriptorType::Terminator);
    sector
}
