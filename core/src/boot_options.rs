// Which firmware paths a build request can produce

use crate::disk::{BootRecordType, FilesystemType};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Loader artifacts available to a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootArtifacts {
    pub uefi_loaders: Vec<PathBuf>,
    pub installer: Option<PathBuf>,
    pub iso_boot_record: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootCapabilities {
    pub uefi: bool,
    /// BIOS boot code can be installed (disk boot)
    pub bios_hdd: bool,
    /// BIOS El Torito boot record is available (CD boot)
    pub bios_cd: bool,
}

impl BootCapabilities {
    /// Check that at least one boot path suits the requested image
    ///
    /// The installer cannot target GPT images and the CD boot record only
    /// helps ISO9660 images.
    pub fn detect(
        artifacts: &BootArtifacts,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
    ) -> Result<Self, ConfigError> {
        let caps = Self {
            uefi: !artifacts.uefi_loaders.is_empty(),
            bios_hdd: artifacts.installer.is_some(),
            bios_cd: artifacts.iso_boot_record.is_some(),
        };
        let hdd_only = filesystem != FilesystemType::Iso9660;
        let gpt_only = boot_record == BootRecordType::Gpt;

        if !caps.uefi && (!caps.bios_hdd || gpt_only) && (!caps.bios_cd || hdd_only) {
            return Err(ConfigError::NoBootOption);
        }
        Ok(caps)
    }

    /// Firmware paths the finished image can be booted with
    ///
    /// Disk boot is only listed when the installer actually ran on the image.
    pub fn summary(
        &self,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
        installed: bool,
    ) -> Vec<&'static str> {
        let bios_hdd = self.bios_hdd && installed;
        let mut paths = Vec::new();
        if self.uefi {
            paths.push("UEFI");
        }
        if filesystem == FilesystemType::Iso9660 {
            if self.bios_cd {
                paths.push("BIOS as CD");
            }
            if bios_hdd {
                paths.push("BIOS as HDD");
            }
        } else if bios_hdd && boot_record != BootRecordType::Gpt {
            paths.push("BIOS");
        }
        paths
    }
}
