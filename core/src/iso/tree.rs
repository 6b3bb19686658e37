// Host directory to in-memory ISO tree

use crate::error::{ImageError, Result};
use iso9660::IsoDirectory;
use std::path::Path;
use walkdir::WalkDir;

/// Load every file under `source`, keyed by its `/`-separated relative path
pub fn load_tree(source: &Path) -> Result<IsoDirectory> {
    let mut root = IsoDirectory::new();

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| ImageError::Io {
            context: format!("walking {}", source.display()),
            source: err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        if entry.file_type().is_dir() {
            root.create_directory(&relative)?;
        } else if entry.file_type().is_file() {
            let data = std::fs::read(entry.path())
                .map_err(ImageError::io(format!("reading {}", entry.path().display())))?;
            root.insert_file(&relative, data)?;
        }
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso9660::IsoNode;

    #[test]
    fn test_load_tree() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("boot")).unwrap();
        std::fs::create_dir_all(source.path().join("empty")).unwrap();
        std::fs::write(source.path().join("boot/kernel_i686_lower_half"), b"ELF").unwrap();

        let root = load_tree(source.path()).unwrap();
        assert!(matches!(
            root.get("boot/kernel_i686_lower_half"),
            Some(IsoNode::File(data)) if data == b"ELF"
        ));
        assert!(matches!(root.get("empty"), Some(IsoNode::Directory(d)) if d.is_empty()));
    }
}
