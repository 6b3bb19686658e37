//! Invocation of the bootstrap-code installer
//!
//! The installer patches BIOS boot code into an existing MBR image. It is an
//! external program called as `installer <image>`; a zero exit status means
//! success. GPT images are refused before anything is spawned.

use super::command;
use crate::disk::mbr::{has_boot_signature, has_gpt_signature, is_iso9660};
use crate::disk::{BootRecordType, FilesystemType, PartitionError};
use crate::error::{ConfigError, ImageError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Bytes read from the image head for the pre-checks
const PROBE_BYTES: u64 = 64 * 1024;

/// When [`assemble`](super::assemble) runs a configured installer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstallPolicy {
    /// Install into FAT images, and into ISO images only when they embed
    /// the BIOS CD boot record
    #[default]
    RequireIsoBootRecord,
    /// Install into every non-GPT image
    Always,
}

impl InstallPolicy {
    pub fn should_install(
        self,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
        has_iso_boot_record: bool,
    ) -> bool {
        if boot_record == BootRecordType::Gpt {
            return false;
        }
        match self {
            InstallPolicy::Always => true,
            InstallPolicy::RequireIsoBootRecord => {
                filesystem != FilesystemType::Iso9660 || has_iso_boot_record
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installer {
    path: PathBuf,
}

impl Installer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Install the BIOS boot code into `image`
    pub fn install(&self, image: &Path, boot_record: BootRecordType) -> Result<()> {
        if boot_record == BootRecordType::Gpt {
            return Err(ConfigError::InstallerOnGpt.into());
        }
        check_image(image)?;

        tracing::info!(
            installer = %self.path.display(),
            image = %image.display(),
            "installing BIOS boot code"
        );
        command::run(Command::new(&self.path).arg(image))?;
        Ok(())
    }
}

/// Refuse images the installer cannot handle
///
/// A non-ISO image must carry the MBR magic and no GPT header.
fn check_image(image: &Path) -> Result<()> {
    let context = || format!("reading {}", image.display());
    let mut head = Vec::new();
    File::open(image)
        .and_then(|file| file.take(PROBE_BYTES).read_to_end(&mut head))
        .map_err(ImageError::io(context()))?;

    if is_iso9660(&head) {
        return Ok(());
    }
    if has_gpt_signature(&head) {
        return Err(ConfigError::InstallerOnGpt.into());
    }
    if !has_boot_signature(&head) {
        return Err(PartitionError::MissingSignature.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::gpt::{write_gpt, GptPartitionSpec};
    use crate::disk::{MemoryDisk, PartitionType};

    #[test]
    fn test_default_policy() {
        let policy = InstallPolicy::default();
        assert!(policy.should_install(BootRecordType::Mbr, FilesystemType::Fat32, false));
        assert!(!policy.should_install(BootRecordType::Mbr, FilesystemType::Iso9660, false));
        assert!(policy.should_install(BootRecordType::Cd, FilesystemType::Iso9660, true));
        assert!(!policy.should_install(BootRecordType::Gpt, FilesystemType::Fat32, false));
    }

    #[test]
    fn test_always_policy_still_skips_gpt() {
        let policy = InstallPolicy::Always;
        assert!(policy.should_install(BootRecordType::Mbr, FilesystemType::Iso9660, false));
        assert!(!policy.should_install(BootRecordType::Gpt, FilesystemType::Iso9660, true));
    }

    #[test]
    fn test_rejects_gpt_record_without_spawning() {
        let installer = Installer::new("/nonexistent/hyper_install");
        let err = installer
            .install(Path::new("/nonexistent/image.img"), BootRecordType::Gpt)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageError::Config(ConfigError::InstallerOnGpt)
        ));
    }

    #[test]
    fn test_rejects_gpt_labelled_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut data = vec![0u8; 4 * 1024 * 1024];
        write_gpt(
            MemoryDisk::new(&mut data),
            &[GptPartitionSpec {
                partition_type: PartitionType::BasicData,
                start_lba: 2048,
                end_lba: 4095,
            }],
        )
        .unwrap();
        std::fs::write(&path, &data).unwrap();

        let err = Installer::new("/nonexistent/hyper_install")
            .install(&path, BootRecordType::Mbr)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageError::Config(ConfigError::InstallerOnGpt)
        ));
    }

    #[test]
    fn test_rejects_image_without_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.img");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        let err = Installer::new("/nonexistent/hyper_install")
            .install(&path, BootRecordType::Mbr)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageError::Partition(PartitionError::MissingSignature)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_installer_with_image_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.img");
        let mut data = vec![0u8; 1024];
        data[510] = 0x55;
        data[511] = 0xAA;
        std::fs::write(&image, &data).unwrap();

        let marker = dir.path().join("called");
        let script = dir.path().join("installer.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$1\" > {}\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        Installer::new(&script)
            .install(&image, BootRecordType::Mbr)
            .unwrap();
        let recorded = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(recorded.trim(), image.display().to_string());
    }
}
