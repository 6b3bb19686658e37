//! Shared fixtures for the image tests

#![allow(dead_code)]

use hyper_core::config::{BootConfig, EntryKind, ModuleDescriptor};
use hyper_core::fs_root::{FsRoot, KERNEL_BINARIES};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Host-side loader artifacts with recognisable contents
pub struct HostArtifacts {
    pub dir: TempDir,
}

impl HostArtifacts {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let kernels = dir.path().join("kernels");
        std::fs::create_dir(&kernels).unwrap();
        for name in KERNEL_BINARIES {
            std::fs::write(kernels.join(name), kernel_contents(name)).unwrap();
        }
        std::fs::write(dir.path().join("BOOTX64.EFI"), b"MZ uefi loader").unwrap();
        // Four 512-byte sectors, the El Torito load size
        std::fs::write(dir.path().join("hyper_iso_boot"), vec![0xEBu8; 2048]).unwrap();
        Self { dir }
    }

    pub fn kernel_dir(&self) -> PathBuf {
        self.dir.path().join("kernels")
    }

    pub fn uefi_loader(&self) -> PathBuf {
        self.dir.path().join("BOOTX64.EFI")
    }

    pub fn iso_boot_record(&self) -> PathBuf {
        self.dir.path().join("hyper_iso_boot")
    }
}

pub fn kernel_contents(name: &str) -> Vec<u8> {
    let mut data = format!("ELF {name}\n").into_bytes();
    data.resize(3000, 0x90);
    data
}

pub fn default_config() -> BootConfig {
    BootConfig::new(
        EntryKind::Amd64HigherHalf,
        "no-shutdown",
        vec![ModuleDescriptor::kernel_alias()],
    )
}

/// Staged root with kernels, config and the requested boot artifacts
pub fn staged_root(host: &HostArtifacts, uefi: bool, iso_boot_record: bool) -> FsRoot {
    let root = FsRoot::new().unwrap();
    root.add_kernels(&host.kernel_dir()).unwrap();
    if uefi {
        root.add_uefi_loader(&host.uefi_loader()).unwrap();
    }
    if iso_boot_record {
        root.add_iso_boot_record(&host.iso_boot_record()).unwrap();
    }
    root.set_config(&default_config()).unwrap();
    root
}

pub fn read_image(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}
