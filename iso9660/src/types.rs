//! Shared ISO9660 constants and the records handed out by the reader

use alloc::string::String;

/// Logical sector size of every volume this crate reads or writes
pub const SECTOR_SIZE: usize = 2048;

/// First sector of the volume descriptor set
pub const VOLUME_DESCRIPTOR_START: u64 = 16;

/// Deepest path `find_file` will walk
pub const MAX_DIRECTORY_DEPTH: usize = 8;

/// El Torito counts boot image length in 512-byte units
pub const VIRTUAL_SECTOR_SIZE: usize = 512;

/// Descriptor type byte at offset 0 of each volume descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VolumeDescriptorType {
    /// El Torito boot record
    BootRecord = 0,
    /// Primary volume descriptor
    Primary = 1,
    /// Set terminator
    Terminator = 255,
}

/// What `mount` learns about a volume
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    /// Space-padded volume identifier
    pub volume_id: [u8; 32],
    /// First sector of the root directory
    pub root_extent_lba: u32,
    /// Root directory size in bytes
    pub root_extent_len: u32,
    /// Logical block size recorded in the primary descriptor
    pub logical_block_size: u16,
    /// Total sectors in the volume
    pub volume_space_size: u32,
    /// Sector of the El Torito catalog, if a boot record points at one
    pub boot_catalog_lba: Option<u32>,
    /// Root `.` record carries a SUSP `SP` entry
    pub has_rock_ridge: bool,
}

/// A file or directory found while walking the tree
///
/// `name` is the Rock Ridge name if one was recorded, otherwise the
/// identifier without its `;1` version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Display name
    pub name: String,
    /// First sector of the data
    pub extent_lba: u32,
    /// Length in bytes
    pub size: u32,
    /// Entry is a directory
    pub directory: bool,
}

impl FileEntry {
    /// Name without any leading directories
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry is a directory
    pub fn is_directory(&self) -> bool {
        self.directory
    }
}

/// A boot catalog entry with the platform of the section it sits in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImage {
    /// Entry is marked bootable (0x88)
    pub bootable: bool,
    /// Emulation mode
    pub media_type: BootMediaType,
    /// Real-mode load segment, 0 meaning the BIOS default
    pub load_segment: u16,
    /// Partition type byte for hard disk emulation
    pub system_type: u8,
    /// Image length in 512-byte units
    pub sector_count: u16,
    /// First 2048-byte sector of the image
    pub load_rba: u32,
    /// Firmware the entry targets
    pub platform: BootPlatform,
}

/// Emulation mode of a boot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootMediaType {
    /// Image loaded as-is
    NoEmulation = 0,
    /// 1.2M diskette
    Floppy12M = 1,
    /// 1.44M diskette
    Floppy144M = 2,
    /// 2.88M diskette
    Floppy288M = 3,
    /// Hard disk
    HardDisk = 4,
}

impl BootMediaType {
    /// Decode the low nibble of the media byte
    pub fn from_id(id: u8) -> Self {
        match id & 0x0F {
            1 => Self::Floppy12M,
            2 => Self::Floppy144M,
            3 => Self::Floppy288M,
            4 => Self::HardDisk,
            _ => Self::NoEmulation,
        }
    }
}

/// Platform ID of a catalog section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootPlatform {
    /// PC BIOS
    X86 = 0x00,
    /// PowerPC
    PowerPC = 0x01,
    /// Mac
    Mac = 0x02,
    /// UEFI
    Efi = 0xEF,
}

impl BootPlatform {
    /// Decode a platform byte, `None` for unassigned values
    pub fn from_id(id: u8) -> Option<Self> {
        [Self::X86, Self::PowerPC, Self::Mac, Self::Efi]
            .into_iter()
            .find(|platform| *platform as u8 == id)
    }

    /// Byte stored in the catalog
    pub fn id(self) -> u8 {
        self as u8
    }
}
