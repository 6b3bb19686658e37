//! Walking the records of one directory extent

use crate::directory::record::DirectoryRecord;
use crate::error::{Iso9660Error, Result};
use crate::extensions::rock_ridge::{self, ContinuationArea};
use crate::types::{FileEntry, SECTOR_SIZE};
use crate::utils::string;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Yields the entries of a directory, skipping `.` and `..`
pub struct DirectoryIterator<'a, B: BlockIo> {
    block_io: &'a mut B,
    first_lba: u32,
    len: usize,
    pos: usize,
    buf: Box<[u8; SECTOR_SIZE]>,
    loaded: Option<u64>,
}

impl<'a, B: BlockIo> DirectoryIterator<'a, B> {
    /// Iterate the directory stored at `extent_lba`, `extent_len` bytes long
    pub fn new(block_io: &'a mut B, extent_lba: u32, extent_len: u32) -> Self {
        Self {
            block_io,
            first_lba: extent_lba,
            len: extent_len as usize,
            pos: 0,
            buf: Box::new([0u8; SECTOR_SIZE]),
            loaded: None,
        }
    }

    fn load(&mut self, lba: u64) -> Result<()> {
        if self.loaded != Some(lba) {
            self.block_io
                .read_blocks(Lba(lba), self.buf.as_mut())
                .map_err(|_| Iso9660Error::IoError)?;
            self.loaded = Some(lba);
        }
        Ok(())
    }

    fn next_record(&mut self) -> Result<Option<FileEntry>> {
        while self.pos < self.len {
            let (sector, offset) = (self.pos / SECTOR_SIZE, self.pos % SECTOR_SIZE);
            self.load(u64::from(self.first_lba) + sector as u64)?;

            // A zero length byte pads out the rest of the sector
            if self.buf[offset] == 0 {
                self.pos = (sector + 1) * SECTOR_SIZE;
                continue;
            }

            let record = DirectoryRecord::parse(&self.buf[offset..])?;
            self.pos += record.length();
            if !record.is_self_or_parent() {
                let continuation = match rock_ridge::continuation_area(record.system_use()) {
                    Some(area) => read_continuation(&mut *self.block_io, area)?,
                    None => Vec::new(),
                };
                return Ok(Some(FileEntry {
                    name: display_name(&record, &continuation),
                    extent_lba: record.get_extent_lba(),
                    size: record.get_data_length(),
                    directory: record.is_directory(),
                }));
            }
        }
        Ok(None)
    }
}

fn read_continuation<B: BlockIo>(block_io: &mut B, area: ContinuationArea) -> Result<Vec<u8>> {
    let start = area.offset as usize;
    let end = start + area.length as usize;
    if end > SECTOR_SIZE {
        return Err(Iso9660Error::InvalidDirectoryRecord);
    }
    let mut sector = vec![0u8; SECTOR_SIZE];
    block_io
        .read_blocks(Lba(u64::from(area.lba)), &mut sector)
        .map_err(|_| Iso9660Error::IoError)?;
    sector.truncate(end);
    sector.drain(..start);
    Ok(sector)
}

/// Rock Ridge `NM` wins over the ISO identifier
fn display_name(record: &DirectoryRecord<'_>, continuation: &[u8]) -> String {
    rock_ridge::alternate_name(record.system_use(), continuation).unwrap_or_else(|| {
        let id = record.file_identifier();
        string::dchars_to_str(id)
            .map(|s| String::from(string::strip_version(s)))
            .unwrap_or_else(|_| String::from_utf8_lossy(id).into_owned())
    })
}

impl<B: BlockIo> Iterator for DirectoryIterator<'_, B> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
