// Recursive copy of a host directory into a FAT volume

use super::{FatError, FatVolume};
use crate::error::{ImageError, Result};
use gpt_disk_io::BlockIo;
use std::path::Path;
use walkdir::WalkDir;

/// `/`-joined path of `path` relative to `root`, under `prefix`
fn volume_path(prefix: &str, root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = vec![prefix];
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            FatError::InvalidName(component.as_os_str().to_string_lossy().into_owned())
        })?;
        parts.push(part);
    }
    parts.retain(|part| !part.is_empty());
    Ok(parts.join("/"))
}

/// Copy every file and directory under `source` into the volume root
///
/// Entries are visited in name order so the resulting volume does not
/// depend on host directory ordering. Returns the number of files copied.
pub fn copy_tree_in<B: BlockIo>(volume: &mut FatVolume<'_, B>, source: &Path) -> Result<usize> {
    copy_tree_to(volume, source, "")
}

/// Like [`copy_tree_in`], placing the tree under the volume directory `prefix`
pub fn copy_tree_to<B: BlockIo>(
    volume: &mut FatVolume<'_, B>,
    source: &Path,
    prefix: &str,
) -> Result<usize> {
    let mut files = 0;

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let context = format!("walking {}", source.display());
            match err.into_io_error() {
                Some(source) => ImageError::Io { context, source },
                None => ImageError::Io {
                    context,
                    source: std::io::Error::other("filesystem loop"),
                },
            }
        })?;
        let target = volume_path(prefix, source, entry.path())?;

        if entry.file_type().is_dir() {
            volume.create_directory(&target)?;
        } else if entry.file_type().is_file() {
            let data = std::fs::read(entry.path())
                .map_err(ImageError::io(format!("reading {}", entry.path().display())))?;
            tracing::debug!(path = %target, bytes = data.len(), "copying into FAT volume");
            volume.write_file(&target, &data)?;
            files += 1;
        } else {
            tracing::warn!(path = %entry.path().display(), "skipping special file");
        }
    }

    volume.flush()?;
    Ok(files)
}
