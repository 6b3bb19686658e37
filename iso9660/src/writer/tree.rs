//! In-memory directory tree handed to the image writer

use crate::error::{Iso9660Error, Result};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A file or directory of an [`IsoDirectory`]
#[derive(Debug, Clone)]
pub enum IsoNode {
    /// Regular file contents
    File(Vec<u8>),
    /// Sub-directory
    Directory(IsoDirectory),
}

/// Directory keyed by original (Rock Ridge) name
#[derive(Debug, Clone, Default)]
pub struct IsoDirectory {
    entries: BTreeMap<String, IsoNode>,
}

fn components(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    if parts.iter().any(|c| *c == "." || *c == "..") {
        return Err(Iso9660Error::InvalidPath);
    }
    Ok(parts)
}

impl IsoDirectory {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Has no entries?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct entries in name order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &IsoNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Create `path` and any missing parents, returning the innermost directory
    pub fn create_directory(&mut self, path: &str) -> Result<&mut IsoDirectory> {
        let mut dir = self;
        for part in components(path)? {
            let node = dir
                .entries
                .entry(part.to_string())
                .or_insert_with(|| IsoNode::Directory(IsoDirectory::new()));
            dir = match node {
                IsoNode::Directory(d) => d,
                IsoNode::File(_) => return Err(Iso9660Error::DuplicateName),
            };
        }
        Ok(dir)
    }

    /// Insert a file, creating parent directories; an existing file is replaced
    pub fn insert_file(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        let (parent, name) = match path.trim_matches('/').rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path.trim_matches('/')),
        };
        if name.is_empty() || name == "." || name == ".." {
            return Err(Iso9660Error::InvalidPath);
        }
        let dir = self.create_directory(parent)?;
        if let Some(IsoNode::Directory(_)) = dir.entries.get(name) {
            return Err(Iso9660Error::DuplicateName);
        }
        dir.entries.insert(name.to_string(), IsoNode::File(data));
        Ok(())
    }

    /// Look up a node by path
    pub fn get(&self, path: &str) -> Option<&IsoNode> {
        let parts = components(path).ok()?;
        let (last, parents) = parts.split_last()?;
        let mut dir = self;
        for part in parents {
            match dir.entries.get(*part)? {
                IsoNode::Directory(d) => dir = d,
                IsoNode::File(_) => return None,
            }
        }
        dir.entries.get(*last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_insert_creates_parents() {
        let mut root = IsoDirectory::new();
        root.insert_file("/EFI/BOOT/BOOTX64.EFI", vec![1, 2, 3]).unwrap();
        assert!(matches!(root.get("EFI/BOOT"), Some(IsoNode::Directory(_))));
        assert!(matches!(root.get("/EFI/BOOT/BOOTX64.EFI"), Some(IsoNode::File(d)) if d.len() == 3));
        assert!(root.get("EFI/missing").is_none());
    }

    #[test]
    fn test_file_directory_conflicts() {
        let mut root = IsoDirectory::new();
        root.insert_file("boot", vec![]).unwrap();
        assert_eq!(root.insert_file("boot/kernel", vec![]), Err(Iso9660Error::DuplicateName));
        assert_eq!(root.insert_file("../escape", vec![]), Err(Iso9660Error::InvalidPath));
    }
}
