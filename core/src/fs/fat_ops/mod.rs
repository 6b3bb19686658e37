// FAT12/16/32 filesystem operations
//
// Paths are `/`-separated and resolved from the volume root; name lookups
// are case-insensitive and match either the long or the 8.3 name.

mod context;
mod directory;
mod file_ops;
pub(crate) mod filename;
mod types;

pub use types::FatEntry;

use crate::fs::fat_format::{FatError, FatParams};
use context::FatContext;
use directory::{open_directory, Directory};
use gpt_disk_io::BlockIo;

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Split into parent components and the final name
fn split_leaf(path: &str) -> Result<(Vec<&str>, &str), FatError> {
    let mut parts = split_path(path);
    let leaf = parts
        .pop()
        .ok_or_else(|| FatError::InvalidName(path.to_string()))?;
    Ok((parts, leaf))
}

/// An opened FAT volume on a block device
///
/// Directory changes reach the device immediately; the allocation table is
/// written back by [`FatVolume::flush`].
pub struct FatVolume<'a, B: BlockIo> {
    block_io: &'a mut B,
    ctx: FatContext,
}

impl<'a, B: BlockIo> FatVolume<'a, B> {
    pub fn open(block_io: &'a mut B, partition_lba_start: u64) -> Result<Self, FatError> {
        let ctx = FatContext::from_boot_sector(block_io, partition_lba_start)?;
        Ok(Self { block_io, ctx })
    }

    pub fn params(&self) -> &FatParams {
        &self.ctx.params
    }

    fn directory(&mut self, components: &[&str], create: bool) -> Result<Directory, FatError> {
        open_directory(self.block_io, &mut self.ctx, components, create)
    }

    /// Write a file, creating missing parent directories
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), FatError> {
        let (parents, name) = split_leaf(path)?;
        let mut dir = self.directory(&parents, true)?;
        file_ops::write_file_in_directory(self.block_io, &mut self.ctx, &mut dir, name, data)
    }

    /// Create a directory and every missing parent
    pub fn create_directory(&mut self, path: &str) -> Result<(), FatError> {
        self.directory(&split_path(path), true).map(|_| ())
    }

    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>, FatError> {
        let (parents, name) = split_leaf(path)?;
        let dir = self.directory(&parents, false)?;
        let slot = dir
            .find(name)
            .ok_or_else(|| FatError::NotFound(path.to_string()))?;
        if slot.entry.is_directory() {
            return Err(FatError::IsADirectory(path.to_string()));
        }
        file_ops::read_file_data(self.block_io, &self.ctx, &slot)
    }

    /// True only for an existing regular file
    pub fn file_exists(&mut self, path: &str) -> Result<bool, FatError> {
        let (parents, name) = split_leaf(path)?;
        match self.directory(&parents, false) {
            Ok(dir) => Ok(dir
                .find(name)
                .is_some_and(|slot| !slot.entry.is_directory())),
            Err(FatError::NotFound(_) | FatError::NotADirectory(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn list_directory(&mut self, path: &str) -> Result<Vec<FatEntry>, FatError> {
        let dir = self.directory(&split_path(path), false)?;
        Ok(dir
            .slots()
            .into_iter()
            .map(|slot| FatEntry {
                name: slot.name,
                is_dir: slot.entry.is_directory(),
                size: slot.entry.file_size,
            })
            .collect())
    }

    pub fn flush(&mut self) -> Result<(), FatError> {
        self.ctx.flush(self.block_io)
    }
}

/// Write file to a FAT partition
pub fn write_file<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    path: &str,
    data: &[u8],
) -> Result<(), FatError> {
    let mut volume = FatVolume::open(block_io, partition_lba_start)?;
    volume.write_file(path, data)?;
    volume.flush()
}

/// Create directory (creates full path)
pub fn create_directory<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    path: &str,
) -> Result<(), FatError> {
    let mut volume = FatVolume::open(block_io, partition_lba_start)?;
    volume.create_directory(path)?;
    volume.flush()
}

/// Read file data from a FAT partition
pub fn read_file<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    path: &str,
) -> Result<Vec<u8>, FatError> {
    FatVolume::open(block_io, partition_lba_start)?.read_file(path)
}

/// Check if file exists
pub fn file_exists<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    path: &str,
) -> Result<bool, FatError> {
    FatVolume::open(block_io, partition_lba_start)?.file_exists(path)
}

pub fn list_directory<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    path: &str,
) -> Result<Vec<FatEntry>, FatError> {
    FatVolume::open(block_io, partition_lba_start)?.list_directory(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;
    use crate::fs::fat_format::{format_fat, FatKind};

    const START: u64 = 2048;

    fn formatted(kind: FatKind, sectors: u64) -> Vec<u8> {
        let mut data = vec![0u8; (START + sectors) as usize * 512];
        format_fat(&mut MemoryDisk::new(&mut data), START, sectors, kind).unwrap();
        data
    }

    #[test]
    fn test_write_read_nested_long_names() {
        for (kind, sectors) in [
            (FatKind::Fat12, 6144),
            (FatKind::Fat16, 65536),
            (FatKind::Fat32, 131072),
        ] {
            let mut data = formatted(kind, sectors);
            let mut disk = MemoryDisk::new(&mut data);
            let kernel: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

            write_file(&mut disk, START, "/boot/kernel_amd64_higher_half", &kernel).unwrap();
            write_file(&mut disk, START, "hyper.cfg", b"default-entry = x\n").unwrap();

            assert_eq!(
                read_file(&mut disk, START, "/boot/kernel_amd64_higher_half").unwrap(),
                kernel,
                "{kind}"
            );
            assert_eq!(
                read_file(&mut disk, START, "/HYPER.CFG").unwrap(),
                b"default-entry = x\n"
            );
            assert!(file_exists(&mut disk, START, "boot/kernel_amd64_higher_half").unwrap());
            assert!(!file_exists(&mut disk, START, "boot").unwrap());
            assert!(!file_exists(&mut disk, START, "missing/file").unwrap());
        }
    }

    #[test]
    fn test_colliding_aliases() {
        let mut data = formatted(FatKind::Fat16, 65536);
        let mut disk = MemoryDisk::new(&mut data);
        let mut volume = FatVolume::open(&mut disk, START).unwrap();

        let names: Vec<String> = (0..8).map(|i| format!("kernel_variant_{i}")).collect();
        for name in &names {
            volume.write_file(&format!("boot/{name}"), name.as_bytes()).unwrap();
        }
        volume.flush().unwrap();

        let listing = volume.list_directory("boot").unwrap();
        let mut listed: Vec<String> = listing.into_iter().map(|e| e.name).collect();
        listed.sort();
        assert_eq!(listed, names);
        for name in &names {
            assert_eq!(volume.read_file(&format!("boot/{name}")).unwrap(), name.as_bytes());
        }
    }

    #[test]
    fn test_overwrite_and_empty_file() {
        let mut data = formatted(FatKind::Fat12, 6144);
        let mut disk = MemoryDisk::new(&mut data);
        write_file(&mut disk, START, "a.bin", &[1u8; 3000]).unwrap();
        write_file(&mut disk, START, "a.bin", b"short").unwrap();
        write_file(&mut disk, START, "empty", b"").unwrap();

        assert_eq!(read_file(&mut disk, START, "a.bin").unwrap(), b"short");
        assert!(read_file(&mut disk, START, "empty").unwrap().is_empty());

        let entries = list_directory(&mut disk, START, "/").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.name == "empty" && e.size == 0));
    }

    #[test]
    fn test_directory_errors() {
        let mut data = formatted(FatKind::Fat16, 65536);
        let mut disk = MemoryDisk::new(&mut data);
        create_directory(&mut disk, START, "EFI/BOOT").unwrap();

        let root = list_directory(&mut disk, START, "").unwrap();
        assert_eq!(
            root,
            vec![FatEntry {
                name: "EFI".into(),
                is_dir: true,
                size: 0
            }]
        );
        assert!(matches!(
            read_file(&mut disk, START, "EFI/BOOT"),
            Err(FatError::IsADirectory(_))
        ));
        assert!(matches!(
            write_file(&mut disk, START, "EFI", b"x"),
            Err(FatError::IsADirectory(_))
        ));
        assert!(matches!(
            read_file(&mut disk, START, "nope/x"),
            Err(FatError::NotFound(_))
        ));
        assert!(matches!(
            write_file(&mut disk, START, "bad:name", b"x"),
            Err(FatError::InvalidName(_))
        ));
    }

    #[test]
    fn test_cluster_directory_grows() {
        let mut data = formatted(FatKind::Fat32, 131072);
        let mut disk = MemoryDisk::new(&mut data);
        let mut volume = FatVolume::open(&mut disk, START).unwrap();
        // 512-byte clusters hold 16 entries; long names take three each
        for i in 0..40 {
            volume
                .write_file(&format!("module_with_a_long_name_{i:02}"), &[i as u8])
                .unwrap();
        }
        volume.flush().unwrap();
        assert_eq!(volume.list_directory("/").unwrap().len(), 40);
        assert_eq!(volume.read_file("module_with_a_long_name_39").unwrap(), vec![39]);
    }

    #[test]
    fn test_fixed_root_full() {
        let mut data = formatted(FatKind::Fat12, 6144);
        let mut disk = MemoryDisk::new(&mut data);
        let mut volume = FatVolume::open(&mut disk, START).unwrap();
        let mut result = Ok(());
        for i in 0..600 {
            result = volume.write_file(&format!("F{i}"), b"");
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(FatError::DirectoryFull)));
    }
}
