// ISO9660 payload: data disc, El Torito boot images and a hybrid disk label

pub mod esp;
pub mod hybrid;
pub mod tree;

use crate::disk::MemoryDisk;
use crate::error::{ConfigError, Result};
use crate::image::OpticalBoot;
use gpt_disk_types::BlockSize;
use iso9660::{write_image, BiosBoot, BootPlatform, Iso9660Error, IsoOptions};
use std::path::Path;

/// BIOS El Torito boot image expected at the tree root
pub const ISO_BOOT_RECORD_NAME: &str = "hyper_iso_boot";
/// Synthesized FAT image registered as the EFI boot image
pub const ESP_IMAGE_NAME: &str = "efi_esp";
/// Directory whose presence enables UEFI boot
pub const EFI_DIR_NAME: &str = "EFI";

/// Logical block size of an ISO9660 volume
pub const ISO_SECTOR_SIZE: u32 = 2048;

const VOLUME_ID: &str = "HYPER";
const APPLICATION_ID: &str = "HYPER BOOTLOADER";

/// A finished optical image and the boot paths it embeds
#[derive(Debug, Clone)]
pub struct OpticalImage {
    pub data: Vec<u8>,
    pub boot: OpticalBoot,
}

/// Boot images a source tree could provide
pub fn detect_boot_images(source: &Path) -> OpticalBoot {
    OpticalBoot {
        bios: source.join(ISO_BOOT_RECORD_NAME).is_file(),
        uefi: source.join(EFI_DIR_NAME).is_dir(),
    }
}

/// Fail when `wanted` asks for a boot image the tree cannot supply
pub fn check_boot_components(source: &Path, wanted: OpticalBoot) -> Result<(), ConfigError> {
    let present = detect_boot_images(source);
    if wanted.bios && !present.bios {
        return Err(ConfigError::MissingBootComponent {
            component: "BIOS CD",
            path: ISO_BOOT_RECORD_NAME,
        });
    }
    if wanted.uefi && !present.uefi {
        return Err(ConfigError::MissingBootComponent {
            component: "UEFI",
            path: EFI_DIR_NAME,
        });
    }
    Ok(())
}

/// Build an ISO9660 image of `source` embedding the boot images in `wanted`
///
/// A BIOS boot uses `hyper_iso_boot` at the root, a UEFI boot a FAT image of
/// the `EFI/` directory. Files of a boot path that is not wanted are stored
/// as plain data. The result always carries a protective disk label so it
/// can also be written to a hard disk.
pub fn build_optical(source: &Path, wanted: OpticalBoot) -> Result<OpticalImage> {
    check_boot_components(source, wanted)?;
    let mut root = tree::load_tree(source)?;

    let efi_boot = if wanted.uefi {
        let esp = esp::build_esp_image(&source.join(EFI_DIR_NAME))?;
        root.insert_file(ESP_IMAGE_NAME, esp)?;
        Some(ESP_IMAGE_NAME.to_string())
    } else {
        None
    };

    let options = IsoOptions {
        volume_id: VOLUME_ID.to_string(),
        application_id: APPLICATION_ID.to_string(),
        bios_boot: wanted.bios.then(|| BiosBoot::new(ISO_BOOT_RECORD_NAME)),
        efi_boot,
        ..IsoOptions::default()
    };
    let image = write_image(&root, &options)?;
    tracing::debug!(
        sectors = image.total_sectors(),
        bios_boot = wanted.bios,
        uefi_boot = wanted.uefi,
        "wrote ISO9660 volume"
    );

    let mut data = image.data;
    hybrid::apply_label(&mut data, image.efi_image)?;

    Ok(OpticalImage { data, boot: wanted })
}

/// Finished image viewed in 2048-byte logical blocks
pub fn optical_disk(image: &mut [u8]) -> Result<MemoryDisk<'_>> {
    let block_size = BlockSize::new(ISO_SECTOR_SIZE).ok_or(Iso9660Error::IoError)?;
    Ok(MemoryDisk::with_block_size(image, block_size))
}

/// Boot images recorded in the El Torito catalog of a finished image
pub fn embedded_boot_images(image: &mut [u8]) -> Result<OpticalBoot> {
    let mut disk = optical_disk(image)?;
    let volume = iso9660::mount(&mut disk, 0)?;
    let images = match iso9660::boot_images(&mut disk, &volume) {
        Ok(images) => images,
        Err(Iso9660Error::NoBootCatalog) => return Ok(OpticalBoot::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(OpticalBoot {
        bios: images.iter().any(|image| image.platform == BootPlatform::X86),
        uefi: images.iter().any(|image| image.platform == BootPlatform::Efi),
    })
}
