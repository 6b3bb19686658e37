//! El Torito catalogs: decoding what a volume offers and encoding new ones

pub mod catalog;
pub mod entry;
pub mod info_table;
pub mod validation;

use crate::error::{Iso9660Error, Result};
use crate::types::{BootImage, VolumeInfo, SECTOR_SIZE};
use alloc::vec::Vec;
use catalog::BootCatalog;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Read the boot catalog referenced by the volume's boot record
pub fn read_catalog<B: BlockIo>(block_io: &mut B, volume: &VolumeInfo) -> Result<BootCatalog> {
    let lba = volume.boot_catalog_lba.ok_or(Iso9660Error::NoBootCatalog)?;
    let mut sector = [0u8; SECTOR_SIZE];
    block_io
        .read_blocks(Lba(lba as u64), &mut sector)
        .map_err(|_| Iso9660Error::IoError)?;
    BootCatalog::parse(&sector)
}

/// The initial entry of the catalog, the image a BIOS would load
pub fn find_boot_image<B: BlockIo>(block_io: &mut B, volume: &VolumeInfo) -> Result<BootImage> {
    let catalog = read_catalog(block_io, volume)?;
    boot_images_of(&catalog)
        .into_iter()
        .next()
        .ok_or(Iso9660Error::InvalidBootCatalog)
}

/// Every boot image in the catalog, default entry first
pub fn boot_images<B: BlockIo>(block_io: &mut B, volume: &VolumeInfo) -> Result<Vec<BootImage>> {
    let catalog = read_catalog(block_io, volume)?;
    Ok(boot_images_of(&catalog))
}

fn boot_images_of(catalog: &BootCatalog) -> Vec<BootImage> {
    catalog
        .images()
        .map(|(platform, entry)| BootImage {
            bootable: entry.bootable,
            media_type: entry.media_type,
            load_segment: entry.load_segment,
            system_type: entry.system_type,
            sector_count: entry.sector_count,
            load_rba: entry.load_rba,
            platform,
        })
        .collect()
}
