//! Boot tests (El Torito)

mod common;

use common::{empty_volume, IsoBuilder, MemoryBlockDevice};
use iso9660::boot::info_table::BootInfoTable;
use iso9660::{boot_images, find_boot_image, find_file, mount, read_file_vec, BiosBoot, BootPlatform};
use iso9660::error::Iso9660Error;

fn bios_bootable() -> (iso9660::IsoImage, MemoryBlockDevice) {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper_iso_boot", &stage1());
    builder.options().bios_boot = Some(BiosBoot::new("hyper_iso_boot"));
    let image = builder.image();
    let device = MemoryBlockDevice::new(image.data.clone());
    (image, device)
}

#[test]
fn test_find_boot_image() {
    let (image, mut device) = bios_bootable();
    let volume = mount(&mut device, 0).expect("mount success");
    assert!(volume.boot_catalog_lba.is_some());

    let boot_image = find_boot_image(&mut device, &volume).expect("default entry");
    assert!(boot_image.bootable);
    assert_eq!(boot_image.platform, BootPlatform::X86);
    assert_eq!(Some(boot_image.load_rba), image.bios_image.map(|e| e.lba));
}

#[test]
fn test_no_boot_catalog() {
    let mut device = empty_volume();
    let volume = mount(&mut device, 0).expect("mount success");
    assert_eq!(
        find_boot_image(&mut device, &volume).err(),
        Some(Iso9660Error::NoBootCatalog)
    );
}

#[test]
fn test_invalid_boot_catalog_signature() {
    let (image, mut device) = bios_bootable();
    let catalog = image.catalog_lba.expect("catalog written") as usize;
    // Validation entry key byte 0x55
    device.data[catalog * 2048 + 30] = 0x00;

    let volume = mount(&mut device, 0).expect("mount success");
    assert_eq!(
        find_boot_image(&mut device, &volume).err(),
        Some(Iso9660Error::InvalidBootCatalog)
    );
}

fn stage1() -> Vec<u8> {
    let mut image = vec![0u8; 4096];
    image[0] = 0xEB;
    image[1] = 0x3C;
    image[100..104].copy_from_slice(b"HYPR");
    image
}

#[test]
fn test_written_bios_and_efi_catalog() {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper_iso_boot", &stage1());
    builder.add_file("efi_esp", &vec![0x5A; 3000]);
    builder.add_file("EFI/BOOT/BOOTX64.EFI", b"MZ efi");
    builder.options().bios_boot = Some(BiosBoot::new("hyper_iso_boot"));
    builder.options().efi_boot = Some("efi_esp".to_string());
    let image = builder.image();
    let mut device = MemoryBlockDevice::new(image.data.clone());

    let volume = mount(&mut device, 0).expect("mount");
    assert_eq!(volume.boot_catalog_lba, image.catalog_lba);

    let images = boot_images(&mut device, &volume).expect("catalog");
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].platform, BootPlatform::X86);
    assert_eq!(images[0].sector_count, 4);
    assert_eq!(Some(images[0].load_rba), image.bios_image.map(|e| e.lba));
    assert_eq!(images[1].platform, BootPlatform::Efi);
    // 3000 bytes in 512-byte virtual sectors
    assert_eq!(images[1].sector_count, 6);
    assert_eq!(Some(images[1].load_rba), image.efi_image.map(|e| e.lba));
}

#[test]
fn test_written_efi_only_catalog() {
    let mut builder = IsoBuilder::new();
    builder.add_file("efi_esp", &vec![0x5A; 1024]);
    builder.options().efi_boot = Some("efi_esp".to_string());
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount");
    let default = find_boot_image(&mut device, &volume).expect("default entry");
    assert_eq!(default.platform, BootPlatform::Efi);
    assert_eq!(default.sector_count, 2);
    assert_eq!(boot_images(&mut device, &volume).expect("catalog").len(), 1);
}

#[test]
fn test_boot_info_table_patched() {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper_iso_boot", &stage1());
    builder.options().bios_boot = Some(BiosBoot::new("hyper_iso_boot"));
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/hyper_iso_boot").expect("boot file");
    let data = read_file_vec(&mut device, &file).expect("read");

    let table = BootInfoTable::read(&data).expect("table present");
    assert_eq!(table.pvd_lba, 16);
    assert_eq!(table.file_lba, file.extent_lba);
    assert_eq!(table.file_length, 4096);
    assert_eq!(&data[100..104], b"HYPR");
}

#[test]
fn test_missing_boot_file_rejected() {
    let mut builder = IsoBuilder::new();
    builder.add_file("other", b"x");
    builder.options().bios_boot = Some(BiosBoot::new("hyper_iso_boot"));
    let mut root = iso9660::IsoDirectory::new();
    root.insert_file("other", b"x".to_vec()).expect("insert");
    let result = iso9660::write_image(&root, builder.options());
    assert_eq!(result.err(), Some(Iso9660Error::BootImageMissing));
}
