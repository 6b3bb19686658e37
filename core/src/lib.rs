//! Hyper Core Library
//!
//! Boot configuration and image assembly for the Hyper bootloader: renders
//! `hyper.cfg`, plans disk geometry, writes MBR/GPT labels, FAT12/16/32
//! volumes and hybrid ISO9660 images, and drives the BIOS installer.

pub mod boot_options;
pub mod config;
pub mod disk;
pub mod error;
pub mod fs;
pub mod fs_root;
pub mod image;
pub mod iso;
pub mod verdict;

pub use boot_options::{BootArtifacts, BootCapabilities};
pub use config::{BootConfig, EntryKind, ModuleDescriptor};
pub use disk::{BootRecordType, FilesystemType};
pub use error::{AssembleError, ConfigError, ImageError, Step};
pub use fs_root::FsRoot;
pub use image::{assemble, AssembleOptions, DiskImage, InstallPolicy, Installer, Toolkit};
pub use verdict::BootVerdict;
