//! Staging directory for the image payload
//!
//! Lays out what the loader expects to find on the boot volume: kernels in
//! `boot/`, UEFI loaders in `EFI/BOOT/`, the BIOS CD boot record at the root
//! and `hyper.cfg` next to it. The directory is removed on drop.

use crate::config::{BootConfig, CONFIG_FILE_NAME};
use crate::error::{ImageError, Result};
use crate::iso::ISO_BOOT_RECORD_NAME;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Kernel images copied into [`KERNEL_DIR`]
pub const KERNEL_BINARIES: [&str; 6] = [
    "kernel_i686_lower_half",
    "kernel_i686_higher_half",
    "kernel_amd64_lower_half",
    "kernel_amd64_higher_half",
    "kernel_aarch64_lower_half",
    "kernel_aarch64_higher_half",
];

pub const KERNEL_DIR: &str = "boot";
pub const UEFI_BOOT_DIR: &str = "EFI/BOOT";

#[derive(Debug)]
pub struct FsRoot {
    dir: TempDir,
}

fn copy(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .map_err(ImageError::io(format!("creating {}", parent.display())))?;
    }
    std::fs::copy(from, to).map_err(ImageError::io(format!(
        "copying {} to {}",
        from.display(),
        to.display()
    )))?;
    tracing::debug!(from = %from.display(), to = %to.display(), "staged file");
    Ok(())
}

impl FsRoot {
    /// Stage under the system temporary directory
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("hyper-root-")
            .tempdir()
            .map_err(ImageError::io("creating staging directory"))?;
        Ok(Self { dir })
    }

    /// Stage under `parent`, creating it if needed
    pub fn in_dir(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent)
            .map_err(ImageError::io(format!("creating {}", parent.display())))?;
        let dir = tempfile::Builder::new()
            .prefix("hyper-root-")
            .tempdir_in(parent)
            .map_err(ImageError::io(format!("creating staging directory in {}", parent.display())))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy the known kernel images found in `kernel_dir`
    ///
    /// Missing kernels are skipped with a warning; the number copied is
    /// returned.
    pub fn add_kernels(&self, kernel_dir: &Path) -> Result<usize> {
        let mut copied = 0;
        for name in KERNEL_BINARIES {
            let from = kernel_dir.join(name);
            if !from.is_file() {
                tracing::warn!(kernel = name, dir = %kernel_dir.display(), "kernel binary not found");
                continue;
            }
            copy(&from, &self.path().join(KERNEL_DIR).join(name))?;
            copied += 1;
        }
        Ok(copied)
    }

    /// Copy a UEFI loader into `EFI/BOOT/`, keeping its file name
    pub fn add_uefi_loader(&self, loader: &Path) -> Result<PathBuf> {
        let name = loader.file_name().ok_or_else(|| ImageError::Io {
            context: format!("staging UEFI loader {}", loader.display()),
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })?;
        let target = self.path().join(UEFI_BOOT_DIR).join(name);
        copy(loader, &target)?;
        Ok(target)
    }

    /// Copy the BIOS CD boot record to `hyper_iso_boot`
    pub fn add_iso_boot_record(&self, boot_record: &Path) -> Result<()> {
        copy(boot_record, &self.path().join(ISO_BOOT_RECORD_NAME))
    }

    /// Copy `host` to the absolute loader path `loader_path`
    pub fn add_file(&self, loader_path: &str, host: &Path) -> Result<()> {
        let relative = loader_path.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(ImageError::Io {
                context: format!("staging {loader_path}"),
                source: io::Error::from(io::ErrorKind::InvalidInput),
            });
        }
        copy(host, &self.path().join(relative))
    }

    /// Write `hyper.cfg`, warning about binaries the tree lacks
    pub fn set_config(&self, config: &BootConfig) -> Result<()> {
        for binary in config.missing_binaries(self.path()) {
            tracing::warn!(binary, "configured kernel binary missing from the tree");
        }
        let path = self.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, config.render())
            .map_err(ImageError::io(format!("writing {}", path.display())))
    }

    /// Remove the directory now, reporting failures
    pub fn close(self) -> Result<()> {
        self.dir
            .close()
            .map_err(ImageError::io("removing staging directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntryKind, ModuleDescriptor, ModuleSize};

    #[test]
    fn test_layout() {
        let host = tempfile::tempdir().unwrap();
        for name in &KERNEL_BINARIES[..4] {
            std::fs::write(host.path().join(name), name.as_bytes()).unwrap();
        }
        let loader = host.path().join("BOOTX64.EFI");
        std::fs::write(&loader, b"uefi").unwrap();
        let record = host.path().join("iso_br.bin");
        std::fs::write(&record, b"bios").unwrap();

        let root = FsRoot::new().unwrap();
        assert_eq!(root.add_kernels(host.path()).unwrap(), 4);
        root.add_uefi_loader(&loader).unwrap();
        root.add_iso_boot_record(&record).unwrap();

        assert!(root.path().join("boot/kernel_amd64_higher_half").is_file());
        assert!(!root.path().join("boot/kernel_aarch64_higher_half").exists());
        assert_eq!(std::fs::read(root.path().join("EFI/BOOT/BOOTX64.EFI")).unwrap(), b"uefi");
        assert_eq!(std::fs::read(root.path().join("hyper_iso_boot")).unwrap(), b"bios");
    }

    #[test]
    fn test_set_config_and_modules() {
        let host = tempfile::tempdir().unwrap();
        let blob = host.path().join("blob.bin");
        std::fs::write(&blob, [7u8; 16]).unwrap();

        let root = FsRoot::in_dir(&host.path().join("interm")).unwrap();
        root.add_file("/boot/blob.bin", &blob).unwrap();
        let config = BootConfig::new(
            EntryKind::Amd64HigherHalf,
            "no-shutdown",
            vec![ModuleDescriptor::file("blob", "/boot/blob.bin", ModuleSize::Auto).unwrap()],
        );
        root.set_config(&config).unwrap();

        let text = std::fs::read_to_string(root.path().join("hyper.cfg")).unwrap();
        assert_eq!(text, config.render());
        assert!(root.path().join("boot/blob.bin").is_file());
    }

    #[test]
    fn test_rejects_escaping_path() {
        let root = FsRoot::new().unwrap();
        assert!(root.add_file("/../outside", Path::new("/dev/null")).is_err());
        assert!(root.add_file("/", Path::new("/dev/null")).is_err());
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let root = FsRoot::new().unwrap();
        let path = root.path().to_path_buf();
        drop(root);
        assert!(!path.exists());
    }
}
