//! Shared fixtures: an in-memory 2048-byte block device and writer-built volumes

#![allow(dead_code)]

pub mod builder;
pub use builder::IsoBuilder;

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::io;

const BLOCK: usize = 2048;

#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Zero-filled device of `sectors` logical blocks
    pub fn blank(sectors: usize) -> Self {
        Self::new(vec![0u8; sectors * BLOCK])
    }

    fn range(&self, lba: Lba, len: usize) -> io::Result<std::ops::Range<usize>> {
        let start = lba.0 as usize * BLOCK;
        if start + len > self.data.len() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        Ok(start..start + len)
    }
}

/// Volume holding only the root directory
pub fn empty_volume() -> MemoryBlockDevice {
    IsoBuilder::new().build()
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(BLOCK as u32).expect("2048 is a valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / BLOCK) as u64)
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
