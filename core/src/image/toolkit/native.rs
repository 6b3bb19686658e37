// In-process toolkit built on the crate's own disk, FAT and ISO writers

use super::{OpticalBoot, Toolkit};
use crate::disk::{self, BootRecordType, FileDisk, FilesystemType, Geometry};
use crate::error::{ImageError, Result};
use crate::fs::{self, FatKind, FatVolume};
use crate::iso;
use std::fs::{File, OpenOptions};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeToolkit;

fn open_image(image: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(image)
        .map_err(ImageError::io(format!("opening {}", image.display())))
}

impl Toolkit for NativeToolkit {
    fn name(&self) -> &'static str {
        "native"
    }

    fn create_partition_table(
        &self,
        image: &Path,
        boot_record: BootRecordType,
        filesystem: FilesystemType,
        geometry: &Geometry,
    ) -> Result<()> {
        let file = open_image(image)?;
        disk::write_partition_table(FileDisk::new(&file), boot_record, filesystem, geometry)?;
        Ok(())
    }

    fn create_fat_volume(&self, image: &Path, kind: FatKind, geometry: &Geometry) -> Result<()> {
        let file = open_image(image)?;
        let mut disk = FileDisk::new(&file);
        let params = fs::format_fat(
            &mut disk,
            geometry.payload_start_lba(),
            geometry.payload_sectors(),
            kind,
        )?;
        tracing::debug!(
            kind = %params.kind,
            clusters = params.cluster_count(),
            sectors_per_cluster = params.sectors_per_cluster,
            "formatted FAT volume"
        );
        Ok(())
    }

    fn copy_tree_in(&self, image: &Path, geometry: &Geometry, source: &Path) -> Result<()> {
        let file = open_image(image)?;
        let mut disk = FileDisk::new(&file);
        let mut volume = FatVolume::open(&mut disk, geometry.payload_start_lba())?;
        let files = fs::copy_tree_in(&mut volume, source)?;
        tracing::debug!(files, source = %source.display(), "copied tree into FAT volume");
        Ok(())
    }

    fn create_optical(&self, source: &Path, output: &Path, boot: OpticalBoot) -> Result<OpticalBoot> {
        let image = iso::build_optical(source, boot)?;
        std::fs::write(output, &image.data)
            .map_err(ImageError::io(format!("writing {}", output.display())))?;
        Ok(image.boot)
    }
}
