//! Formatting capability used by the assembler
//!
//! [`NativeToolkit`] does all of the work in-process. [`ExternalToolkit`]
//! delegates to `parted`, `mtools` and `xorriso` the way a shell build
//! would. Both leave byte layouts that satisfy the same geometry.

mod external;
mod native;

pub use external::ExternalToolkit;
pub use native::NativeToolkit;

use crate::disk::{BootRecordType, FilesystemType, Geometry};
use crate::error::Result;
use crate::fs::FatKind;
use std::path::Path;

/// Boot paths embedded in an optical image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpticalBoot {
    /// El Torito BIOS boot record (`hyper_iso_boot`)
    pub bios: bool,
    /// El Torito EFI boot image (`efi_esp`)
    pub uefi: bool,
}

pub trait Toolkit {
    /// Short name for log output
    fn name(&self) -> &'static str;

    /// Write the single-partition table of a FAT image already sized to
    /// `geometry`
    fn create_partition_table(
        &self,
        image: &Path,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
        geometry: &Geometry,
    ) -> Result<()>;

    /// Format the payload partition
    fn create_fat_volume(&self, image: &Path, kind: FatKind, geometry: &Geometry) -> Result<()>;

    /// Copy the contents of `source` into the root of the payload volume
    fn copy_tree_in(&self, image: &Path, geometry: &Geometry, source: &Path) -> Result<()>;

    /// Write a hybrid ISO9660 image of `source` to `output`
    ///
    /// `boot` names the El Torito images to embed; the return value is what
    /// the finished catalog actually holds. `source` is never modified.
    fn create_optical(&self, source: &Path, output: &Path, boot: OpticalBoot) -> Result<OpticalBoot>;
}
