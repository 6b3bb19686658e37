//! Volume descriptor parsing tests

mod common;

use common::{empty_volume, IsoBuilder, MemoryBlockDevice};
use iso9660::error::Iso9660Error;
use iso9660::volume::mount;

#[test]
fn test_mount_empty_volume() {
    let mut device = empty_volume();
    let volume = mount(&mut device, 0).expect("mount should succeed");

    assert_eq!(volume.logical_block_size, 2048);
    assert_eq!(volume.volume_space_size as usize, device.data.len() / 2048);
    assert_eq!(volume.root_extent_len, 2048);
    assert!(volume.root_extent_lba > 16);
}

#[test]
fn test_mount_blank_device() {
    let mut device = MemoryBlockDevice::blank(64);
    assert_eq!(mount(&mut device, 0).unwrap_err(), Iso9660Error::InvalidSignature);
}

#[test]
fn test_mount_truncated_device() {
    let mut device = MemoryBlockDevice::blank(10);
    assert!(mount(&mut device, 0).is_err());
}

#[test]
fn test_mount_at_offset() {
    let inner = empty_volume();
    let mut data = vec![0u8; 8 * 2048];
    data.extend_from_slice(&inner.data);
    let mut device = MemoryBlockDevice::new(data);

    let volume = mount(&mut device, 8).expect("mount should succeed");
    assert_eq!(volume.volume_space_size as usize, inner.data.len() / 2048);
}

#[test]
fn test_mount_read_only() {
    let mut device = empty_volume();
    let before = device.data.clone();
    mount(&mut device, 0).expect("mount should succeed");
    assert_eq!(device.data, before);
}

#[test]
fn test_mount_written_volume() {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper.cfg", b"default-entry = \"x\"\n");
    builder.options().volume_id = "HYPER_TEST".to_string();
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount should succeed");
    assert_eq!(&volume.volume_id[..10], b"HYPER_TEST");
    assert_eq!(volume.volume_id[10], b' ');
    assert_eq!(volume.volume_space_size as usize, device.data.len() / 2048);
    assert!(volume.has_rock_ridge);
    assert!(volume.boot_catalog_lba.is_none());
}

#[test]
fn test_mount_without_rock_ridge() {
    let mut builder = IsoBuilder::new();
    builder.add_file("a.txt", b"a");
    builder.options().rock_ridge = false;
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount should succeed");
    assert!(!volume.has_rock_ridge);
}
