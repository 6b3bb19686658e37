//! ISO9660 volumes for the Hyper image tooling
//!
//! `no_std` + `alloc`. The same crate reads volumes through any
//! [`gpt_disk_io::BlockIo`] with 2048-byte blocks and writes complete images
//! into memory.
//!
//! Reading covers the primary volume descriptor, directory lookup with
//! Rock Ridge names, file extents and the El Torito catalog (BIOS and UEFI
//! sections). Writing lays out a level 2 tree with Rock Ridge names, path
//! tables, an optional boot catalog and a patched boot info table.
//!
//! ```ignore
//! let volume = iso9660::mount(&mut disk, 0)?;
//! let entry = iso9660::find_file(&mut disk, &volume, "/boot/kernel_amd64_higher_half")?;
//! let kernel = iso9660::read_file_vec(&mut disk, &entry)?;
//!
//! for image in iso9660::boot_images(&mut disk, &volume)? {
//!     println!("{:?} image at sector {}", image.platform, image.load_rba);
//! }
//! ```
//!
//! ```ignore
//! use iso9660::{write_image, BiosBoot, IsoDirectory, IsoOptions};
//!
//! let mut root = IsoDirectory::new();
//! root.insert_file("hyper_iso_boot", stage1)?;
//! let image = write_image(&root, &IsoOptions {
//!     bios_boot: Some(BiosBoot::new("hyper_iso_boot")),
//!     ..IsoOptions::default()
//! })?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod boot;
pub mod directory;
pub mod error;
pub mod extensions;
pub mod file;
pub mod types;
pub mod utils;
pub mod volume;
pub mod writer;

pub use boot::{boot_images, find_boot_image};
pub use directory::{find_file, read_directory};
pub use error::{Iso9660Error, Result};
pub use file::{read_file, read_file_vec, Extent};
pub use types::{BootImage, BootPlatform, FileEntry, VolumeInfo};
pub use volume::mount;
pub use writer::tree::{IsoDirectory, IsoNode};
pub use writer::{write_image, BiosBoot, IsoImage, IsoOptions};
