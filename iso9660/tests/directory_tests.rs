//! Path lookup against images from the writer

mod common;

use common::{empty_volume, IsoBuilder};
use iso9660::directory::read_directory;
use iso9660::{find_file, mount, read_file_vec};
use iso9660::error::Iso9660Error;

#[test]
fn test_find_nonexistent_file() {
    let mut device = empty_volume();
    let volume = mount(&mut device, 0).expect("mount");

    let result = find_file(&mut device, &volume, "/nonexistent.txt");
    assert_eq!(result.unwrap_err(), Iso9660Error::NotFound);
}

#[test]
fn test_root_paths() {
    let mut device = empty_volume();
    let volume = mount(&mut device, 0).expect("mount");

    for path in ["", "/", "//", "/./"] {
        let entry = find_file(&mut device, &volume, path)
            .unwrap_or_else(|err| panic!("`{path}` should resolve to the root: {err}"));
        assert_eq!(entry.extent_lba, volume.root_extent_lba);
        assert!(entry.is_directory());
    }
}

#[test]
fn test_path_depth_limit() {
    let mut device = empty_volume();
    let volume = mount(&mut device, 0).expect("mount");

    let deep_path = "/level".repeat(10);
    // Depth is checked before any lookup
    assert_eq!(
        find_file(&mut device, &volume, &deep_path).unwrap_err(),
        Iso9660Error::PathTooLong
    );
}

#[test]
fn test_case_sensitivity() {
    let mut builder = IsoBuilder::new();
    builder.add_file("TEST.TXT", b"case");
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    let upper = find_file(&mut device, &volume, "/TEST.TXT").expect("upper");
    let lower = find_file(&mut device, &volume, "/test.txt").expect("lower");
    assert_eq!(upper.extent_lba, lower.extent_lba);
}

#[test]
fn test_rock_ridge_names_listed() {
    let mut builder = IsoBuilder::new();
    builder.add_file("boot/kernel_aarch64_lower_half", b"k");
    builder.add_file("boot/module-1.bin", b"m");
    builder.add_dir("EFI/BOOT");
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    let boot = find_file(&mut device, &volume, "/boot").expect("boot dir");
    let mut names: Vec<String> = read_directory(&mut device, &boot)
        .expect("list")
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, ["kernel_aarch64_lower_half", "module-1.bin"]);

    let efi_boot = find_file(&mut device, &volume, "/EFI/BOOT").expect("nested dir");
    assert!(efi_boot.is_directory());
    assert!(read_directory(&mut device, &efi_boot).expect("list").is_empty());
}

#[test]
fn test_plain_identifiers_without_rock_ridge() {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper.cfg", b"cfg");
    builder.options().rock_ridge = false;
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    let root = find_file(&mut device, &volume, "/").expect("root");
    let entries = read_directory(&mut device, &root).expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "HYPER.CFG");
}

#[test]
fn test_large_directory_spans_sectors() {
    let mut builder = IsoBuilder::new();
    for i in 0..120 {
        builder.add_file(&format!("module_number_{i:03}.bin"), &[i as u8]);
    }
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    assert!(volume.root_extent_len > 2048);
    let root = find_file(&mut device, &volume, "/").expect("root");
    assert_eq!(read_directory(&mut device, &root).expect("list").len(), 120);
    let last = find_file(&mut device, &volume, "/module_number_119.bin").expect("last");
    assert_eq!(last.size, 1);
}

#[test]
fn test_file_used_as_directory() {
    let mut builder = IsoBuilder::new();
    builder.add_file("hyper.cfg", b"cfg");
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    assert_eq!(
        find_file(&mut device, &volume, "/hyper.cfg/inner").unwrap_err(),
        Iso9660Error::NotFound
    );
}

#[test]
fn test_long_rock_ridge_name() {
    let long = format!("module_{}.elf", "x".repeat(209));
    assert_eq!(long.len(), 220);
    let mut builder = IsoBuilder::new();
    builder.add_file(&format!("boot/{long}"), b"long payload");
    builder.add_file("boot/short.bin", b"short");
    let mut device = builder.build();
    let volume = mount(&mut device, 0).expect("mount");

    let boot = find_file(&mut device, &volume, "/boot").expect("boot dir");
    let mut names: Vec<String> = read_directory(&mut device, &boot)
        .expect("list")
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    assert_eq!(names, [long.clone(), "short.bin".to_string()]);

    let entry = find_file(&mut device, &volume, &format!("/boot/{long}")).expect("long name");
    assert_eq!(read_file_vec(&mut device, &entry).expect("read"), b"long payload");
}
