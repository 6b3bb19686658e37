//! End-to-end image assembly with the native toolkit

mod common;

use common::{kernel_contents, staged_root, HostArtifacts};
use hyper_core::disk::{gpt, mbr, plan, Geometry, MemoryDisk, PartitionType, Plan, UNIT};
use hyper_core::error::{ConfigError, ImageError, Step};
use hyper_core::fs::FatVolume;
use hyper_core::image::{assemble, AssembleOptions, Installer, NativeToolkit};
use hyper_core::{BootRecordType, FilesystemType};
use std::path::Path;

fn geometry(boot_record: BootRecordType, filesystem: FilesystemType) -> Geometry {
    match plan(boot_record, filesystem).unwrap() {
        Plan::Partitioned(geometry) => geometry,
        Plan::Optical => panic!("{filesystem} is not partitioned"),
    }
}

#[test]
fn test_fat_geometry() {
    for (fs, payload) in [
        (FilesystemType::Fat12, 3),
        (FilesystemType::Fat16, 32),
        (FilesystemType::Fat32, 64),
    ] {
        let mbr = geometry(BootRecordType::Mbr, fs);
        assert_eq!(mbr.payload_units, payload);
        assert_eq!(mbr.image_units, payload + 1);
        assert_eq!(mbr.payload_offset_units, 1);

        let gpt = geometry(BootRecordType::Gpt, fs);
        assert_eq!(gpt.image_units, payload + 2);
        assert_eq!(gpt.payload_offset_units, 1);
    }
    assert_eq!(plan(BootRecordType::Cd, FilesystemType::Iso9660), Ok(Plan::Optical));
    assert_eq!(
        plan(BootRecordType::Cd, FilesystemType::Fat32),
        Err(ConfigError::CdRequiresIso9660(FilesystemType::Fat32))
    );
}

#[test]
fn test_mbr_fat32_image() {
    let host = HostArtifacts::new();
    let root = staged_root(&host, false, false);
    let options = AssembleOptions::new(root.path(), BootRecordType::Mbr, FilesystemType::Fat32);
    let image = assemble(&options, &NativeToolkit).unwrap();

    let mut data = common::read_image(image.path());
    assert_eq!(data.len() as u64, 65 * UNIT);

    let table = mbr::read_partition_table(MemoryDisk::new(&mut data)).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].start_lba, 2048);
    assert_eq!(table[0].sectors() * 512, 64 * UNIT);
    assert_eq!(table[0].partition_type, PartitionType::Fat32);
}

#[test]
fn test_gpt_reserves_trailing_unit() {
    let host = HostArtifacts::new();
    let root = staged_root(&host, true, false);
    let options = AssembleOptions::new(root.path(), BootRecordType::Gpt, FilesystemType::Fat16);
    let image = assemble(&options, &NativeToolkit).unwrap();

    let mut data = common::read_image(image.path());
    assert_eq!(data.len() as u64, 34 * UNIT);

    let partitions = gpt::read_partitions(MemoryDisk::new(&mut data)).unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].start_lba, 2048);
    assert!(partitions[0].end_lba < 33 * UNIT / 512);

    let mut disk = MemoryDisk::new(&mut data);
    let mut volume = FatVolume::open(&mut disk, 2048).unwrap();
    assert_eq!(
        volume.read_file("EFI/BOOT/BOOTX64.EFI").unwrap(),
        b"MZ uefi loader"
    );
}

#[test]
fn test_fat32_read_back() {
    let host = HostArtifacts::new();
    let root = staged_root(&host, true, false);
    let options = AssembleOptions::new(root.path(), BootRecordType::Mbr, FilesystemType::Fat32);
    let image = assemble(&options, &NativeToolkit).unwrap();

    let mut data = common::read_image(image.path());
    let mut disk = MemoryDisk::new(&mut data);
    let mut volume = FatVolume::open(&mut disk, 2048).unwrap();

    assert_eq!(
        volume.read_file("EFI/BOOT/BOOTX64.EFI").unwrap(),
        b"MZ uefi loader"
    );
    assert_eq!(
        volume.read_file("/boot/kernel_amd64_higher_half").unwrap(),
        kernel_contents("kernel_amd64_higher_half")
    );
    let config = String::from_utf8(volume.read_file("/hyper.cfg").unwrap()).unwrap();
    assert!(config.contains("default-entry = amd64_higher_half"));
}

#[test]
fn test_iso_bios_and_uefi() {
    let host = HostArtifacts::new();
    let root = staged_root(&host, true, true);
    let out = tempfile::tempdir().unwrap();
    let options = AssembleOptions::new(root.path(), BootRecordType::Cd, FilesystemType::Iso9660)
        .uefi(true)
        .bios_cd(true)
        .output(out.path().join("hyper.iso"));
    let image = assemble(&options, &NativeToolkit).unwrap();
    assert!(image.is_cd());
    let boot = image.optical_boot().unwrap();
    assert!(boot.bios && boot.uefi);

    let mut data = common::read_image(image.path());
    assert!(mbr::is_iso9660(&data));
    assert!(mbr::has_gpt_signature(&data));

    let protective = mbr::read_partition_table(MemoryDisk::new(&mut data)).unwrap();
    assert_eq!(protective[0].partition_type, PartitionType::GptProtective);

    let partitions = gpt::read_partitions(MemoryDisk::new(&mut data)).unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].partition_type, PartitionType::EfiSystem);

    let mut disk = MemoryDisk::new(&mut data);
    let mut esp = FatVolume::open(&mut disk, partitions[0].start_lba).unwrap();
    let entries = esp.list_directory("EFI").unwrap();
    assert!(entries.iter().any(|e| e.is_dir && e.name == "BOOT"));
    assert!(esp.file_exists("EFI/BOOT/BOOTX64.EFI").unwrap());
}

#[test]
fn test_iso_without_uefi_uses_mbr_label() {
    let host = HostArtifacts::new();
    let root = staged_root(&host, false, true);
    let options = AssembleOptions::new(root.path(), BootRecordType::Mbr, FilesystemType::Iso9660)
        .bios_cd(true);
    let image = assemble(&options, &NativeToolkit).unwrap();

    let mut data = common::read_image(image.path());
    assert!(!mbr::has_gpt_signature(&data));
    let sectors = data.len() as u64 / 512;
    let table = mbr::read_partition_table(MemoryDisk::new(&mut data)).unwrap();
    assert_eq!(table[0].partition_type, PartitionType::IsoHybrid);
    assert_eq!(table[0].start_lba, 1);
    assert_eq!(table[0].end_lba, sectors - 1);
}

#[test]
fn test_installer_rejects_gpt_without_spawning() {
    let installer = Installer::new("/nonexistent/hyper_install");
    let err = installer
        .install(Path::new("/nonexistent/disk.img"), BootRecordType::Gpt)
        .unwrap_err();
    assert!(matches!(err, ImageError::Config(ConfigError::InstallerOnGpt)));
}

#[test]
fn test_missing_source_fails_at_populate() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("disk.img");
    let options = AssembleOptions::new(
        out.path().join("no-such-tree"),
        BootRecordType::Mbr,
        FilesystemType::Fat16,
    )
    .output(&target);
    let err = assemble(&options, &NativeToolkit).unwrap_err();
    assert_eq!(err.step, Step::Populate);
    assert!(!target.exists());
}
