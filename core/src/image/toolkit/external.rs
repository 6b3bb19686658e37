// Toolkit delegating to host utilities
//
// parted writes the partition table, mformat/mcopy (mtools) handle FAT and
// xorriso builds the hybrid ISO. Each tool is looked up on PATH unless an
// explicit program is configured.

use super::{OpticalBoot, Toolkit};
use crate::disk::{BootRecordType, FilesystemType, Geometry};
use crate::error::{ImageError, Result};
use crate::fs::FatKind;
use crate::image::command;
use crate::iso::{self, EFI_DIR_NAME, ESP_IMAGE_NAME, ISO_BOOT_RECORD_NAME};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ExternalToolkit {
    parted: PathBuf,
    mformat: PathBuf,
    mcopy: PathBuf,
    xorriso: PathBuf,
}

impl Default for ExternalToolkit {
    fn default() -> Self {
        Self {
            parted: "parted".into(),
            mformat: "mformat".into(),
            mcopy: "mcopy".into(),
            xorriso: "xorriso".into(),
        }
    }
}

/// `image@@offset` drive specification understood by mtools
fn mtools_image(image: &Path, offset: u64) -> OsString {
    let mut spec = image.as_os_str().to_owned();
    spec.push(format!("@@{offset}"));
    spec
}

fn parted_label(boot_record: BootRecordType) -> &'static str {
    match boot_record {
        BootRecordType::Gpt => "gpt",
        BootRecordType::Mbr | BootRecordType::Cd => "msdos",
    }
}

fn parted_fs_type(filesystem: FilesystemType) -> &'static str {
    match filesystem {
        FilesystemType::Fat12 | FilesystemType::Fat16 => "fat16",
        _ => "fat32",
    }
}

/// Mirror `source` into `dest` so the staging copy can be modified freely
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|err| ImageError::Io {
            context: format!("walking {}", source.display()),
            source: err.into(),
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(ImageError::io(format!("creating {}", target.display())))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .map_err(ImageError::io(format!("copying {}", entry.path().display())))?;
        }
    }
    Ok(())
}

impl ExternalToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parted(mut self, program: impl Into<PathBuf>) -> Self {
        self.parted = program.into();
        self
    }

    pub fn with_mtools(mut self, mformat: impl Into<PathBuf>, mcopy: impl Into<PathBuf>) -> Self {
        self.mformat = mformat.into();
        self.mcopy = mcopy.into();
        self
    }

    pub fn with_xorriso(mut self, program: impl Into<PathBuf>) -> Self {
        self.xorriso = program.into();
        self
    }

    /// 1 MiB FAT12 image holding only the `EFI/` sub-tree
    fn create_esp(&self, efi_dir: &Path, esp: &Path) -> Result<()> {
        let file = std::fs::File::create(esp)
            .map_err(ImageError::io(format!("creating {}", esp.display())))?;
        file.set_len(iso::esp::ESP_IMAGE_BYTES as u64)
            .map_err(ImageError::io(format!("sizing {}", esp.display())))?;
        drop(file);

        command::run(
            Command::new(&self.mformat)
                .arg("-i")
                .arg(esp)
                .args(["-T", "2048", "-h", "64", "-s", "32", "::"]),
        )?;
        command::run(
            Command::new(&self.mcopy)
                .arg("-i")
                .arg(esp)
                .arg("-s")
                .arg("-Q")
                .arg(efi_dir)
                .arg("::/"),
        )?;
        Ok(())
    }
}

impl Toolkit for ExternalToolkit {
    fn name(&self) -> &'static str {
        "external"
    }

    fn create_partition_table(
        &self,
        image: &Path,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
        geometry: &Geometry,
    ) -> Result<()> {
        let start = geometry.payload_offset_units;
        let end = start + geometry.payload_units;

        let mut cmd = Command::new(&self.parted);
        cmd.arg("-s")
            .arg(image)
            .args(["mklabel", parted_label(boot_record)])
            .args(["mkpart", "primary", parted_fs_type(filesystem)])
            .arg(format!("{start}MiB"))
            .arg(format!("{end}MiB"));
        if boot_record != BootRecordType::Gpt {
            cmd.args(["set", "1", "boot", "on"]);
        }
        command::run(&mut cmd)?;
        Ok(())
    }

    fn create_fat_volume(&self, image: &Path, kind: FatKind, geometry: &Geometry) -> Result<()> {
        let mut cmd = Command::new(&self.mformat);
        cmd.arg("-i")
            .arg(mtools_image(image, geometry.payload_offset_bytes()))
            .arg("-T")
            .arg(geometry.payload_sectors().to_string())
            .arg("-H")
            .arg(geometry.payload_start_lba().to_string())
            .args(["-h", "64", "-s", "32"]);
        if kind == FatKind::Fat32 {
            cmd.arg("-F");
        }
        cmd.arg("::");
        command::run(&mut cmd)?;
        Ok(())
    }

    fn copy_tree_in(&self, image: &Path, geometry: &Geometry, source: &Path) -> Result<()> {
        let mut entries = std::fs::read_dir(source)
            .and_then(|dir| dir.map(|entry| entry.map(|e| e.path())).collect::<Result<Vec<_>, _>>())
            .map_err(ImageError::io(format!("listing {}", source.display())))?;
        if entries.is_empty() {
            return Ok(());
        }
        entries.sort();

        command::run(
            Command::new(&self.mcopy)
                .arg("-i")
                .arg(mtools_image(image, geometry.payload_offset_bytes()))
                .args(["-s", "-Q"])
                .args(&entries)
                .arg("::/"),
        )?;
        Ok(())
    }

    fn create_optical(&self, source: &Path, output: &Path, boot: OpticalBoot) -> Result<OpticalBoot> {
        iso::check_boot_components(source, boot)?;

        let staging = tempfile::Builder::new()
            .prefix("hyper-iso-")
            .tempdir()
            .map_err(ImageError::io("creating ISO staging directory"))?;
        let tree = staging.path().join("tree");
        std::fs::create_dir(&tree)
            .map_err(ImageError::io(format!("creating {}", tree.display())))?;
        copy_tree(source, &tree)?;

        let mut cmd = Command::new(&self.xorriso);
        cmd.args(["-as", "mkisofs", "-R", "-V", "HYPER"]);
        if boot.bios {
            cmd.args(["-b", ISO_BOOT_RECORD_NAME])
                .args(["-no-emul-boot", "-boot-load-size", "4", "-boot-info-table"]);
        }
        if boot.uefi {
            self.create_esp(&tree.join(EFI_DIR_NAME), &tree.join(ESP_IMAGE_NAME))?;
            cmd.args(["--efi-boot", ESP_IMAGE_NAME])
                .args(["-efi-boot-part", "--efi-boot-image"]);
        }
        cmd.arg("--protective-msdos-label")
            .arg(&tree)
            .arg("-o")
            .arg(output);
        command::run(&mut cmd)?;

        let mut image = std::fs::read(output)
            .map_err(ImageError::io(format!("reading {}", output.display())))?;
        let embedded = iso::embedded_boot_images(&mut image)?;
        if embedded != boot {
            tracing::warn!(
                requested = ?boot,
                embedded = ?embedded,
                "xorriso boot catalog differs from the request"
            );
        }
        Ok(embedded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::UNIT;
    use crate::error::ConfigError;

    #[test]
    fn test_mtools_image_spec() {
        assert_eq!(
            mtools_image(Path::new("/tmp/disk.img"), UNIT),
            OsString::from("/tmp/disk.img@@1048576")
        );
    }

    #[test]
    fn test_copy_tree_leaves_source_alone() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("EFI/BOOT")).unwrap();
        std::fs::write(source.path().join("EFI/BOOT/BOOTX64.EFI"), b"loader").unwrap();
        let dest = tempfile::tempdir().unwrap();

        copy_tree(source.path(), dest.path()).unwrap();
        assert_eq!(
            std::fs::read(dest.path().join("EFI/BOOT/BOOTX64.EFI")).unwrap(),
            b"loader"
        );
        std::fs::write(dest.path().join(ESP_IMAGE_NAME), b"esp").unwrap();
        assert!(!source.path().join(ESP_IMAGE_NAME).exists());
    }

    #[test]
    fn test_optical_request_checked_before_spawning() {
        let source = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let toolkit = ExternalToolkit::new().with_xorriso("/nonexistent/xorriso");
        let err = toolkit
            .create_optical(
                source.path(),
                &out.path().join("hyper.iso"),
                OpticalBoot {
                    bios: false,
                    uefi: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ImageError::Config(ConfigError::MissingBootComponent { .. })));
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let toolkit = ExternalToolkit::new().with_parted("/nonexistent/parted");
        let image = tempfile::NamedTempFile::new().unwrap();
        let geometry = Geometry {
            image_units: 4,
            payload_offset_units: 1,
            payload_units: 3,
        };
        let err = toolkit
            .create_partition_table(image.path(), BootRecordType::Mbr, FilesystemType::Fat12, &geometry)
            .unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }
}
