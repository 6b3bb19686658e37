//! ISO9660 image writer
//!
//! Lays out a complete volume in memory from an [`IsoDirectory`]:
//!
//! ```text
//! 0..16      system area (left zeroed for a hybrid label)
//! 16         Primary Volume Descriptor
//! 17         El Torito boot record      (bootable images only)
//! next       Volume Descriptor Set Terminator
//! next       boot catalog               (bootable images only)
//! next       type L path table, then type M path table
//! next       directory extents, breadth-first
//! next       Rock Ridge continuation areas (long names only)
//! next       file extents
//! ```
//!
//! Identifiers are level 2 d-character names; the original names are kept
//! in Rock Ridge `NM` entries when [`IsoOptions::rock_ridge`] is set.

pub mod tree;

use crate::boot::catalog::{BootCatalog, BootSection};
use crate::boot::entry::BootEntry;
use crate::boot::info_table;
use crate::boot::validation::ValidationEntry;
use crate::directory::path_table::{self, ByteOrder, PathTableEntry};
use crate::directory::record::{system_use_capacity, RecordSpec, FLAG_DIRECTORY};
use crate::error::{Iso9660Error, Result};
use crate::extensions::rock_ridge::{self, ContinuationArea};
use crate::file::Extent;
use crate::types::{BootPlatform, MAX_DIRECTORY_DEPTH, SECTOR_SIZE, VOLUME_DESCRIPTOR_START};
use crate::utils::datetime::{DateTime17, DateTime7};
use crate::utils::sector::sectors_for_bytes;
use crate::utils::string::{level2_identifier, MAX_DIRECTORY_IDENTIFIER, MAX_FILE_IDENTIFIER};
use crate::volume::{boot_record, primary, terminator};
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use tree::{IsoDirectory, IsoNode};

/// No-emulation BIOS boot image settings
#[derive(Debug, Clone)]
pub struct BiosBoot {
    /// Path of the boot file inside the tree
    pub path: String,
    /// Virtual 512-byte sectors the firmware loads
    pub load_sectors: u16,
    /// Patch a boot info table into the image
    pub info_table: bool,
}

impl BiosBoot {
    /// `-no-emul-boot -boot-load-size 4 -boot-info-table` for `path`
    pub fn new(path: &str) -> Self {
        Self {
            path: String::from(path),
            load_sectors: 4,
            info_table: true,
        }
    }
}

/// Writer options
#[derive(Debug, Clone)]
pub struct IsoOptions {
    /// Volume identifier
    pub volume_id: String,
    /// System identifier
    pub system_id: String,
    /// Application identifier
    pub application_id: String,
    /// Timestamp recorded on every record and descriptor
    pub recorded: DateTime7,
    /// Emit Rock Ridge `SP`/`ER`/`NM` entries
    pub rock_ridge: bool,
    /// BIOS El Torito image
    pub bios_boot: Option<BiosBoot>,
    /// Path of the EFI El Torito image (a FAT volume) inside the tree
    pub efi_boot: Option<String>,
}

impl Default for IsoOptions {
    fn default() -> Self {
        Self {
            volume_id: String::from("ISOIMAGE"),
            system_id: String::new(),
            application_id: String::new(),
            recorded: DateTime7::default(),
            rock_ridge: true,
            bios_boot: None,
            efi_boot: None,
        }
    }
}

/// A finished image
#[derive(Debug, Clone)]
pub struct IsoImage {
    /// Raw image bytes, a whole number of 2048-byte sectors
    pub data: Vec<u8>,
    /// Boot catalog sector
    pub catalog_lba: Option<u32>,
    /// Where the BIOS boot image landed
    pub bios_image: Option<Extent>,
    /// Where the EFI boot image landed
    pub efi_image: Option<Extent>,
}

impl IsoImage {
    /// Volume size in 2048-byte sectors
    pub fn total_sectors(&self) -> u32 {
        (self.data.len() / SECTOR_SIZE) as u32
    }
}

enum Target {
    Dir(usize),
    File(usize),
}

struct PlannedChild {
    identifier: Vec<u8>,
    name: String,
    target: Target,
    continuation: Option<ContinuationArea>,
}

impl PlannedChild {
    /// Rock Ridge System Use bytes, plus the spilled part of a long name
    fn system_use(&self) -> (Vec<u8>, Option<Vec<u8>>) {
        let (mut inline, spill) =
            rock_ridge::split_alternate_name(&self.name, system_use_capacity(self.identifier.len()));
        if let Some(area) = &spill {
            // Placeholder location until continuation areas are laid out
            let location = self.continuation.unwrap_or(ContinuationArea {
                lba: 0,
                offset: 0,
                length: area.len() as u32,
            });
            inline.extend_from_slice(&rock_ridge::continuation_entry(location));
        }
        (inline, spill)
    }
}

struct PlannedDir<'a> {
    dir: &'a IsoDirectory,
    path: String,
    identifier: Vec<u8>,
    parent: usize,
    depth: usize,
    children: Vec<PlannedChild>,
    extent: u32,
    size: u32,
}

struct PlannedFile<'a> {
    path: String,
    data: &'a [u8],
    extent: u32,
}

/// Owned form of a record, sized before extents are known
struct PendingRecord {
    extent: u32,
    length: u32,
    flags: u8,
    identifier: Vec<u8>,
    system_use: Vec<u8>,
}

impl PendingRecord {
    fn spec(&self, recorded: DateTime7) -> RecordSpec<'_> {
        RecordSpec {
            extent_lba: self.extent,
            data_length: self.length,
            flags: self.flags,
            recorded,
            identifier: &self.identifier,
            system_use: &self.system_use,
        }
    }
}

fn uniquify(id: &str, n: u32, directory: bool) -> String {
    let suffix = format!("{n}");
    if directory {
        let keep = MAX_DIRECTORY_IDENTIFIER.saturating_sub(suffix.len()).min(id.len());
        return format!("{}{}", &id[..keep], suffix);
    }
    let stem = id.trim_end_matches(";1");
    let (base, ext) = stem.rsplit_once('.').unwrap_or((stem, ""));
    let keep = MAX_FILE_IDENTIFIER
        .saturating_sub(1 + ext.len() + suffix.len())
        .min(base.len());
    format!("{}{}.{};1", &base[..keep], suffix, ext)
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        String::from(name)
    } else {
        format!("{parent}/{name}")
    }
}

struct Layout<'a> {
    dirs: Vec<PlannedDir<'a>>,
    files: Vec<PlannedFile<'a>>,
}

impl<'a> Layout<'a> {
    /// Breadth-first walk so directory numbers match path table order
    fn plan(root: &'a IsoDirectory) -> Result<Self> {
        let mut dirs = vec![PlannedDir {
            dir: root,
            path: String::new(),
            identifier: vec![0],
            parent: 0,
            depth: 1,
            children: Vec::new(),
            extent: 0,
            size: 0,
        }];
        let mut files = Vec::new();

        let mut index = 0;
        while index < dirs.len() {
            let dir = dirs[index].dir;
            let depth = dirs[index].depth;
            let dir_path = dirs[index].path.clone();

            let mut named: Vec<(String, &'a str, &'a IsoNode)> = dir
                .entries()
                .map(|(name, node)| {
                    let directory = matches!(node, IsoNode::Directory(_));
                    (level2_identifier(name, directory), name, node)
                })
                .collect();
            named.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(b.1)));

            let mut used = BTreeSet::new();
            let mut sorted = Vec::with_capacity(named.len());
            for (mut identifier, name, node) in named {
                let directory = matches!(node, IsoNode::Directory(_));
                let mut n = 1;
                while used.contains(&identifier) {
                    identifier = uniquify(&identifier, n, directory);
                    n += 1;
                }
                used.insert(identifier.clone());
                sorted.push((identifier.into_bytes(), name, node));
            }
            // Records must be sorted by identifier and suffixing may reorder.
            // Subdirectories are numbered afterwards to keep the path table sorted.
            sorted.sort_by(|a, b| a.0.cmp(&b.0));

            let mut children = Vec::with_capacity(sorted.len());
            for (identifier, name, node) in sorted {
                let path = join(&dir_path, name);
                let target = match node {
                    IsoNode::Directory(sub) => {
                        if depth + 1 > MAX_DIRECTORY_DEPTH {
                            return Err(Iso9660Error::PathTooLong);
                        }
                        dirs.push(PlannedDir {
                            dir: sub,
                            path,
                            identifier: identifier.clone(),
                            parent: index,
                            depth: depth + 1,
                            children: Vec::new(),
                            extent: 0,
                            size: 0,
                        });
                        Target::Dir(dirs.len() - 1)
                    }
                    IsoNode::File(data) => {
                        if data.len() > u32::MAX as usize {
                            return Err(Iso9660Error::ImageTooLarge);
                        }
                        files.push(PlannedFile { path, data, extent: 0 });
                        Target::File(files.len() - 1)
                    }
                };
                children.push(PlannedChild {
                    identifier,
                    name: String::from(name),
                    target,
                    continuation: None,
                });
            }
            dirs[index].children = children;
            index += 1;
        }

        Ok(Self { dirs, files })
    }

    /// Records of directory `index`; extents are filled once assigned
    fn records(&self, index: usize, rock_ridge: bool) -> Vec<PendingRecord> {
        let dir = &self.dirs[index];
        let parent = &self.dirs[dir.parent];

        let mut dot_su = Vec::new();
        if rock_ridge && index == 0 {
            dot_su.extend_from_slice(&rock_ridge::sharing_protocol_entry());
            dot_su.extend_from_slice(&rock_ridge::extensions_reference_entry());
        }

        let mut records = vec![
            PendingRecord {
                extent: dir.extent,
                length: dir.size,
                flags: FLAG_DIRECTORY,
                identifier: vec![0],
                system_use: dot_su,
            },
            PendingRecord {
                extent: parent.extent,
                length: parent.size,
                flags: FLAG_DIRECTORY,
                identifier: vec![1],
                system_use: Vec::new(),
            },
        ];

        for child in &dir.children {
            let system_use = if rock_ridge { child.system_use().0 } else { Vec::new() };
            let (extent, length, flags) = match child.target {
                Target::Dir(d) => (self.dirs[d].extent, self.dirs[d].size, FLAG_DIRECTORY),
                Target::File(f) => (self.files[f].extent, self.files[f].data.len() as u32, 0),
            };
            records.push(PendingRecord {
                extent,
                length,
                flags,
                identifier: child.identifier.clone(),
                system_use,
            });
        }
        records
    }

    /// Pack spilled names into sectors starting at `first_lba`
    fn place_continuations(&mut self, first_lba: u64) -> Vec<(ContinuationArea, Vec<u8>)> {
        let mut areas = Vec::new();
        let mut lba = first_lba;
        let mut used = 0usize;
        for child in self.dirs.iter_mut().flat_map(|d| d.children.iter_mut()) {
            let Some(area) = child.system_use().1 else {
                continue;
            };
            if used + area.len() > SECTOR_SIZE {
                lba += 1;
                used = 0;
            }
            let location = ContinuationArea {
                lba: lba as u32,
                offset: used as u32,
                length: area.len() as u32,
            };
            child.continuation = Some(location);
            used += area.len();
            areas.push((location, area));
        }
        areas
    }

    fn find_file(&self, path: &str) -> Option<&PlannedFile<'a>> {
        let path = path.trim_matches('/');
        self.files.iter().find(|f| f.path == path)
    }
}

/// Records never straddle a sector boundary
fn packed_size(lengths: impl Iterator<Item = usize>) -> u32 {
    let mut sectors = 1u32;
    let mut used = 0usize;
    for len in lengths {
        if used + len > SECTOR_SIZE {
            sectors += 1;
            used = 0;
        }
        used += len;
    }
    sectors * SECTOR_SIZE as u32
}

fn write_records(dst: &mut [u8], records: &[PendingRecord], recorded: DateTime7) -> Result<()> {
    let mut offset = 0usize;
    let mut buf = Vec::new();
    for record in records {
        buf.clear();
        record.spec(recorded).encode(&mut buf)?;
        if offset % SECTOR_SIZE + buf.len() > SECTOR_SIZE {
            offset = (offset / SECTOR_SIZE + 1) * SECTOR_SIZE;
        }
        dst[offset..offset + buf.len()].copy_from_slice(&buf);
        offset += buf.len();
    }
    Ok(())
}

fn sector_mut(data: &mut [u8], lba: u32) -> &mut [u8] {
    let start = lba as usize * SECTOR_SIZE;
    &mut data[start..start + SECTOR_SIZE]
}

/// Build a complete image from `root`
pub fn write_image(root: &IsoDirectory, options: &IsoOptions) -> Result<IsoImage> {
    let mut layout = Layout::plan(root)?;
    let bootable = options.bios_boot.is_some() || options.efi_boot.is_some();

    for index in 0..layout.dirs.len() {
        let records = layout.records(index, options.rock_ridge);
        layout.dirs[index].size =
            packed_size(records.iter().map(|r| r.spec(options.recorded).encoded_len()));
    }

    let path_table: Vec<PathTableEntry> = layout
        .dirs
        .iter()
        .map(|d| PathTableEntry {
            identifier: d.identifier.clone(),
            extent_lba: 0,
            parent: 0,
        })
        .collect();
    let path_table_size = path_table::encoded_size(&path_table) as u32;
    let path_table_sectors = sectors_for_bytes(path_table_size).max(1) as u64;

    // Sector assignment
    let mut next = VOLUME_DESCRIPTOR_START;
    let pvd_lba = next as u32;
    next += 1;
    let boot_record_lba = bootable.then(|| {
        next += 1;
        (next - 1) as u32
    });
    let terminator_lba = next as u32;
    next += 1;
    let catalog_lba = bootable.then(|| {
        next += 1;
        (next - 1) as u32
    });
    let type_l_lba = next as u32;
    next += path_table_sectors;
    let type_m_lba = next as u32;
    next += path_table_sectors;
    for dir in layout.dirs.iter_mut() {
        dir.extent = next as u32;
        next += (dir.size / SECTOR_SIZE as u32) as u64;
    }
    let continuations = if options.rock_ridge {
        layout.place_continuations(next)
    } else {
        Vec::new()
    };
    if let Some((last, _)) = continuations.last() {
        next = u64::from(last.lba) + 1;
    }
    for file in layout.files.iter_mut() {
        if file.data.is_empty() {
            continue;
        }
        file.extent = next as u32;
        next += sectors_for_bytes(file.data.len() as u32) as u64;
    }
    if next > u32::MAX as u64 {
        return Err(Iso9660Error::ImageTooLarge);
    }
    let total_sectors = next as u32;

    let mut data = vec![0u8; total_sectors as usize * SECTOR_SIZE];

    // Directories and files
    for index in 0..layout.dirs.len() {
        let records = layout.records(index, options.rock_ridge);
        let dir = &layout.dirs[index];
        let start = dir.extent as usize * SECTOR_SIZE;
        write_records(&mut data[start..start + dir.size as usize], &records, options.recorded)?;
    }
    for (location, area) in &continuations {
        let start = location.lba as usize * SECTOR_SIZE + location.offset as usize;
        data[start..start + area.len()].copy_from_slice(area);
    }
    for file in &layout.files {
        let start = file.extent as usize * SECTOR_SIZE;
        data[start..start + file.data.len()].copy_from_slice(file.data);
    }

    // Path tables
    let path_table: Vec<PathTableEntry> = layout
        .dirs
        .iter()
        .map(|d| PathTableEntry {
            identifier: d.identifier.clone(),
            extent_lba: d.extent,
            parent: (d.parent + 1) as u16,
        })
        .collect();
    for (lba, order) in [(type_l_lba, ByteOrder::Little), (type_m_lba, ByteOrder::Big)] {
        let table = path_table::encode(&path_table, order);
        let start = lba as usize * SECTOR_SIZE;
        data[start..start + table.len()].copy_from_slice(&table);
    }

    // Boot images and catalog
    let locate = |path: &str| -> Result<Extent> {
        let file = layout.find_file(path).ok_or(Iso9660Error::BootImageMissing)?;
        if file.data.is_empty() {
            return Err(Iso9660Error::BootImageTooSmall);
        }
        Ok(Extent::new(file.extent, file.data.len() as u32))
    };
    let bios_image = options.bios_boot.as_ref().map(|b| locate(&b.path)).transpose()?;
    let efi_image = options.efi_boot.as_deref().map(locate).transpose()?;

    if let (Some(bios), Some(extent)) = (&options.bios_boot, bios_image) {
        if bios.info_table {
            info_table::patch(&mut data[extent.byte_range()], pvd_lba, extent.lba)?;
        }
    }

    let efi_entry = efi_image.map(|e| BootEntry::no_emulation(e.lba, BootEntry::sectors_for(e.length as u64)));
    let catalog = match (&options.bios_boot, bios_image) {
        (Some(bios), Some(extent)) => Some(BootCatalog {
            validation: ValidationEntry::new(BootPlatform::X86, ""),
            initial_entry: BootEntry::no_emulation(extent.lba, bios.load_sectors),
            sections: efi_entry
                .map(|entry| BootSection {
                    platform: BootPlatform::Efi,
                    entries: vec![entry],
                })
                .into_iter()
                .collect(),
        }),
        _ => efi_entry.map(|entry| BootCatalog {
            validation: ValidationEntry::new(BootPlatform::Efi, ""),
            initial_entry: entry,
            sections: Vec::new(),
        }),
    };
    if let (Some(catalog), Some(lba)) = (catalog, catalog_lba) {
        sector_mut(&mut data, lba).copy_from_slice(&catalog.to_sector()?);
    }

    // Volume descriptors
    let root = &layout.dirs[0];
    let mut root_record = Vec::new();
    RecordSpec {
        extent_lba: root.extent,
        data_length: root.size,
        flags: FLAG_DIRECTORY,
        recorded: options.recorded,
        identifier: &[0],
        system_use: &[],
    }
    .encode(&mut root_record)?;

    let pvd = primary::encode(&primary::PrimaryFields {
        system_id: &options.system_id,
        volume_id: &options.volume_id,
        application_id: &options.application_id,
        volume_space_size: total_sectors,
        path_table_size,
        type_l_path_table: type_l_lba,
        type_m_path_table: type_m_lba,
        root_directory_record: &root_record,
        created: DateTime17::from(options.recorded),
    });
    sector_mut(&mut data, pvd_lba).copy_from_slice(&pvd);
    if let (Some(lba), Some(catalog_lba)) = (boot_record_lba, catalog_lba) {
        sector_mut(&mut data, lba).copy_from_slice(&boot_record::encode(catalog_lba));
    }
    sector_mut(&mut data, terminator_lba).copy_from_slice(&terminator());

    Ok(IsoImage {
        data,
        catalog_lba,
        bios_image,
        efi_image,
    })
}
