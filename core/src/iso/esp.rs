// EFI system partition image embedded in optical media

use super::EFI_DIR_NAME;
use crate::disk::MemoryDisk;
use crate::error::Result;
use crate::fs::{format_fat, tree::copy_tree_to, FatKind, FatVolume};
use std::path::Path;

/// Size of the synthesized ESP
pub const ESP_IMAGE_BYTES: usize = 1024 * 1024;

/// A FAT12 volume holding `efi_dir` as its `EFI/` directory
pub fn build_esp_image(efi_dir: &Path) -> Result<Vec<u8>> {
    let mut image = vec![0u8; ESP_IMAGE_BYTES];
    let mut disk = MemoryDisk::new(&mut image);
    format_fat(&mut disk, 0, (ESP_IMAGE_BYTES / 512) as u64, FatKind::Fat12)?;

    let mut volume = FatVolume::open(&mut disk, 0)?;
    volume.create_directory(EFI_DIR_NAME)?;
    let files = copy_tree_to(&mut volume, efi_dir, EFI_DIR_NAME)?;
    tracing::debug!(files, "built EFI system partition image");

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::read_file;

    #[test]
    fn test_esp_holds_only_efi_tree() {
        let efi = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(efi.path().join("BOOT")).unwrap();
        std::fs::write(efi.path().join("BOOT/BOOTX64.EFI"), b"MZ x64").unwrap();

        let mut image = build_esp_image(efi.path()).unwrap();
        assert_eq!(image.len(), ESP_IMAGE_BYTES);

        let mut disk = MemoryDisk::new(&mut image);
        assert_eq!(read_file(&mut disk, 0, "EFI/BOOT/BOOTX64.EFI").unwrap(), b"MZ x64");
        let root = crate::fs::list_directory(&mut disk, 0, "/").unwrap();
        assert_eq!(root.len(), 1);
    }
}
