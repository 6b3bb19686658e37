//! Disk image assembler
//!
//! [`assemble`] turns a staged filesystem root into a bootable image in five
//! steps: plan the geometry, size the output, write the partition table,
//! populate the payload and optionally run the BIOS installer. Any failure
//! removes the partial output and reports the step it happened in.

mod command;
pub mod guard;
pub mod installer;
pub mod toolkit;

pub use guard::PendingOutput;
pub use installer::{InstallPolicy, Installer};
pub use toolkit::{ExternalToolkit, NativeToolkit, OpticalBoot, Toolkit};

use crate::disk::{self, BootRecordType, FilesystemType, Geometry, Plan};
use crate::error::{AssembleError, ImageError, Step};
use crate::fs::FatKind;
use crate::iso;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// What [`assemble`] should build
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub source: PathBuf,
    pub boot_record: BootRecordType,
    pub filesystem: FilesystemType,
    /// Output path; a temporary file is used when absent
    pub output: Option<PathBuf>,
    /// Delete the image when the returned handle is dropped
    pub cleanup: bool,
    pub installer: Option<Installer>,
    pub install_policy: InstallPolicy,
    /// Embed the UEFI boot image in an ISO9660 payload
    pub uefi: bool,
    /// Embed the BIOS El Torito boot record in an ISO9660 payload
    pub bios_cd: bool,
}

impl AssembleOptions {
    pub fn new(source: impl Into<PathBuf>, boot_record: BootRecordType, filesystem: FilesystemType) -> Self {
        Self {
            source: source.into(),
            boot_record,
            filesystem,
            output: None,
            cleanup: false,
            installer: None,
            install_policy: InstallPolicy::default(),
            uefi: false,
            bios_cd: false,
        }
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn installer(mut self, installer: Option<Installer>) -> Self {
        self.installer = installer;
        self
    }

    pub fn install_policy(mut self, policy: InstallPolicy) -> Self {
        self.install_policy = policy;
        self
    }

    pub fn uefi(mut self, uefi: bool) -> Self {
        self.uefi = uefi;
        self
    }

    pub fn bios_cd(mut self, bios_cd: bool) -> Self {
        self.bios_cd = bios_cd;
        self
    }

    /// El Torito images requested for an ISO9660 payload
    pub fn optical_boot(&self) -> OpticalBoot {
        OpticalBoot {
            bios: self.bios_cd,
            uefi: self.uefi,
        }
    }
}

/// A finished image on disk
///
/// Temporary images are deleted when the handle is dropped; call
/// [`keep`](Self::keep) to retain one.
#[derive(Debug)]
pub struct DiskImage {
    path: PathBuf,
    boot_record: BootRecordType,
    filesystem: FilesystemType,
    optical_boot: Option<OpticalBoot>,
    installed: bool,
    temp: Option<TempPath>,
}

impl DiskImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boot_record(&self) -> BootRecordType {
        self.boot_record
    }

    pub fn filesystem(&self) -> FilesystemType {
        self.filesystem
    }

    pub fn is_cd(&self) -> bool {
        self.boot_record == BootRecordType::Cd
    }

    /// Boot images embedded by an ISO9660 payload
    pub fn optical_boot(&self) -> Option<OpticalBoot> {
        self.optical_boot
    }

    /// Whether the installer ran against this image
    pub fn installed(&self) -> bool {
        self.installed
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Disarm temporary cleanup and return the path
    pub fn keep(mut self) -> io::Result<PathBuf> {
        if let Some(temp) = self.temp.take() {
            temp.keep().map_err(|err| err.error)?;
        }
        Ok(std::mem::take(&mut self.path))
    }
}

enum Layout {
    Fat { geometry: Geometry, kind: FatKind },
    Optical,
}

fn at<E: Into<ImageError>>(step: Step) -> impl FnOnce(E) -> AssembleError {
    move |err| AssembleError::new(step, err)
}

fn create_output(output: Option<&Path>) -> Result<PathBuf, ImageError> {
    match output {
        Some(path) => {
            File::create(path).map_err(ImageError::io(format!("creating {}", path.display())))?;
            Ok(path.to_path_buf())
        }
        None => {
            let (_, path) = tempfile::Builder::new()
                .prefix("hyper-")
                .suffix(".img")
                .tempfile()
                .and_then(|file| file.keep().map_err(|err| err.error))
                .map_err(ImageError::io("creating temporary image"))?;
            Ok(path)
        }
    }
}

/// Build an image of `options.source`
pub fn assemble(options: &AssembleOptions, toolkit: &dyn Toolkit) -> Result<DiskImage, AssembleError> {
    let AssembleOptions {
        source,
        boot_record,
        filesystem,
        ..
    } = options;
    let (boot_record, filesystem) = (*boot_record, *filesystem);

    let layout = match (disk::plan(boot_record, filesystem).map_err(at(Step::Plan))?, filesystem.fat_kind()) {
        (Plan::Partitioned(geometry), Some(kind)) => Layout::Fat { geometry, kind },
        _ => {
            iso::check_boot_components(source, options.optical_boot()).map_err(at(Step::Plan))?;
            Layout::Optical
        }
    };
    tracing::info!(
        %boot_record,
        %filesystem,
        toolkit = toolkit.name(),
        source = %source.display(),
        "planned image"
    );

    let path = create_output(options.output.as_deref()).map_err(at(Step::Size))?;
    let pending = PendingOutput::new(&path);

    if let Layout::Fat { geometry, .. } = &layout {
        File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_len(geometry.image_bytes()))
            .map_err(ImageError::io(format!("sizing {}", path.display())))
            .map_err(at(Step::Size))?;
        tracing::info!(
            image_mib = geometry.image_units,
            payload_mib = geometry.payload_units,
            "sized image"
        );
    } else {
        tracing::debug!("optical image size follows the payload");
    }

    if let Layout::Fat { geometry, .. } = &layout {
        toolkit
            .create_partition_table(&path, boot_record, filesystem, geometry)
            .map_err(at(Step::Partition))?;
        tracing::info!(label = %boot_record, "wrote partition table");
    }

    let optical_boot = match &layout {
        Layout::Fat { geometry, kind } => {
            toolkit
                .create_fat_volume(&path, *kind, geometry)
                .and_then(|()| toolkit.copy_tree_in(&path, geometry, source))
                .map_err(at(Step::Populate))?;
            None
        }
        Layout::Optical => Some(
            toolkit
                .create_optical(source, &path, options.optical_boot())
                .map_err(at(Step::Populate))?,
        ),
    };
    tracing::info!(path = %path.display(), "populated image");

    let mut installed = false;
    if let Some(installer) = &options.installer {
        let has_iso_boot_record = optical_boot.is_some_and(|boot| boot.bios);
        if options
            .install_policy
            .should_install(boot_record, filesystem, has_iso_boot_record)
        {
            installer
                .install(&path, boot_record)
                .map_err(at(Step::Install))?;
            installed = true;
        } else {
            tracing::warn!(
                %boot_record,
                %filesystem,
                "skipping installer for this image"
            );
        }
    }

    let path = pending.commit();
    let temp = (options.output.is_none() || options.cleanup).then(|| TempPath::from_path(&path));

    Ok(DiskImage {
        path,
        boot_record,
        filesystem,
        optical_boot,
        installed,
        temp,
    })
}
