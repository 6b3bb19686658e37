//! Directory records and path lookup

pub mod iterator;
pub mod path_table;
pub mod record;

use crate::error::{Iso9660Error, Result};
use crate::types::{FileEntry, VolumeInfo, MAX_DIRECTORY_DEPTH};
use alloc::string::String;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;

/// Resolve `path` from the root directory
///
/// Components match case-insensitively against each entry's display name,
/// so Rock Ridge volumes are searched by their long names. An empty path
/// or `/` yields the root itself.
///
/// ```ignore
/// let volume = iso9660::mount(&mut disk, 0)?;
/// let config = iso9660::find_file(&mut disk, &volume, "/hyper.cfg")?;
/// ```
pub fn find_file<B: BlockIo>(
    block_io: &mut B,
    volume: &VolumeInfo,
    path: &str,
) -> Result<FileEntry> {
    let components: Vec<&str> = path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    if components.len() > MAX_DIRECTORY_DEPTH {
        return Err(Iso9660Error::PathTooLong);
    }

    let mut current = FileEntry {
        name: String::from("/"),
        extent_lba: volume.root_extent_lba,
        size: volume.root_extent_len,
        directory: true,
    };
    for component in components {
        if !current.is_directory() {
            return Err(Iso9660Error::NotFound);
        }
        current = read_directory(block_io, &current)?
            .into_iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(component))
            .ok_or(Iso9660Error::NotFound)?;
    }
    Ok(current)
}

/// List the entries of a directory
pub fn read_directory<B: BlockIo>(block_io: &mut B, dir: &FileEntry) -> Result<Vec<FileEntry>> {
    if !dir.is_directory() {
        return Err(Iso9660Error::InvalidPath);
    }
    iterator::DirectoryIterator::new(block_io, dir.extent_lba, dir.size).collect()
}
