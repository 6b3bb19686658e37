// Block device adapters for gpt_disk_io

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Logical sector size of every disk image produced here
pub const SECTOR_SIZE: usize = 512;

/// Byte slice viewed as a block device
#[derive(Debug)]
pub struct MemoryDisk<'a> {
    data: &'a mut [u8],
    block_size: BlockSize,
}

impl<'a> MemoryDisk<'a> {
    /// 512-byte sectors
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            block_size: BlockSize::BS_512,
        }
    }

    pub fn with_block_size(data: &'a mut [u8], block_size: BlockSize) -> Self {
        Self { data, block_size }
    }

    fn range(&self, start_lba: Lba, len: usize) -> io::Result<std::ops::Range<usize>> {
        let start = usize::try_from(start_lba.0 * self.block_size.to_u64())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "LBA out of range"))?;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "access beyond end of device")
            })?;
        Ok(start..end)
    }
}

impl BlockIo for MemoryDisk<'_> {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        self.block_size
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.data.len() as u64 / self.block_size.to_u64())
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.range(start_lba, dst.len())?;
        dst.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let range = self.range(start_lba, src.len())?;
        self.data[range].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Image file viewed as a 512-byte sector device
#[derive(Debug, Clone, Copy)]
pub struct FileDisk<'a> {
    file: &'a File,
}

impl<'a> FileDisk<'a> {
    pub fn new(file: &'a File) -> Self {
        Self { file }
    }

    fn seek_to(&mut self, lba: Lba) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(lba.0 * SECTOR_SIZE as u64))?;
        Ok(())
    }
}

impl BlockIo for FileDisk<'_> {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok(self.file.metadata()?.len() / SECTOR_SIZE as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.seek_to(start_lba)?;
        self.file.read_exact(dst)
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        self.seek_to(start_lba)?;
        self.file.write_all(src)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.file.flush()
    }
}
