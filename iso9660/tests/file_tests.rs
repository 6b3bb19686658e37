//! File reading tests

mod common;

use common::IsoBuilder;
use iso9660::{find_file, mount, read_file, read_file_vec, Iso9660Error};

fn image_with(path: &str, data: &[u8]) -> common::MemoryBlockDevice {
    let mut builder = IsoBuilder::new();
    builder.add_file(path, data);
    builder.build()
}

#[test]
fn test_read_into_caller_buffer() {
    let mut device = image_with("hyper.cfg", b"default-entry = amd64\n");
    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/HYPER.CFG").expect("find");

    let mut buf = [0xFFu8; 64];
    let len = read_file(&mut device, &file, &mut buf).expect("read");
    assert_eq!(&buf[..len], b"default-entry = amd64\n");
    assert_eq!(buf[len], 0xFF);
}

#[test]
fn test_file_spanning_sectors() {
    // Two whole sectors plus a short tail
    let data: Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
    let mut device = image_with("module.bin", &data);
    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/module.bin").expect("find");

    assert_eq!(file.size, 5000);
    assert_eq!(read_file_vec(&mut device, &file).expect("read"), data);
}

#[test]
fn test_short_buffer_rejected() {
    let mut device = image_with("blob", &[1u8; 3000]);
    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/blob").expect("find");

    let mut buf = [0u8; 2048];
    assert_eq!(
        read_file(&mut device, &file, &mut buf),
        Err(Iso9660Error::BufferTooSmall)
    );
}

#[test]
fn test_directory_is_not_readable() {
    let mut device = image_with("boot/kernel", b"k");
    let volume = mount(&mut device, 0).expect("mount");
    let dir = find_file(&mut device, &volume, "/boot").expect("find");
    assert_eq!(read_file_vec(&mut device, &dir), Err(Iso9660Error::InvalidPath));
}

#[test]
fn test_read_empty_file() {
    let mut builder = IsoBuilder::new();
    builder.add_file("empty", b"");
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/empty").expect("find");
    assert_eq!(file.size, 0);
    assert_eq!(file.extent_lba, 0);
    assert!(read_file_vec(&mut device, &file).expect("read").is_empty());
}

#[test]
fn test_read_nested_file() {
    let mut builder = IsoBuilder::new();
    builder.add_file("boot/kernel_amd64_higher_half", b"\x7fELF kernel");
    let mut device = builder.build();

    let volume = mount(&mut device, 0).expect("mount");
    let file = find_file(&mut device, &volume, "/boot/kernel_amd64_higher_half").expect("find");
    assert_eq!(read_file_vec(&mut device, &file).expect("read"), b"\x7fELF kernel");
}
