//! Directory Record structure
//!
//! Directory records describe files and subdirectories.
//!
//! Layout (BP = byte position, 1-based as in ECMA-119 9.1):
//! length (1), extended attribute length (2), extent (3-10, both-endian),
//! data length (11-18, both-endian), recording date (19-25), flags (26),
//! unit size (27), gap (28), volume sequence (29-32), identifier length (33),
//! identifier, padding byte when the identifier length is even, System Use.

use crate::error::{Iso9660Error, Result};
use crate::utils::datetime::DateTime7;
use crate::utils::sector::{get_both_u32, put_both_u16, put_both_u32};
use alloc::vec::Vec;

/// Directory flag bit
pub const FLAG_DIRECTORY: u8 = 0x02;

/// Fixed part of a record, before the identifier
const FIXED_LENGTH: usize = 33;

/// Borrowed view of one directory record
#[derive(Clone, Copy)]
pub struct DirectoryRecord<'a> {
    data: &'a [u8],
}

impl<'a> DirectoryRecord<'a> {
    /// Minimum record length
    pub const MIN_LENGTH: usize = 34;
    
    /// Parse directory record from bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < Self::MIN_LENGTH {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        let length = data[0] as usize;
        if length < Self::MIN_LENGTH || length > data.len() {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        let id_len = data[32] as usize;
        if FIXED_LENGTH + id_len > length {
            return Err(Iso9660Error::InvalidDirectoryRecord);
        }

        Ok(Self { data: &data[..length] })
    }

    /// Total record length in bytes
    pub fn length(&self) -> usize {
        self.data.len()
    }
    
    /// Get extent LBA (little-endian part of both-endian field)
    pub fn get_extent_lba(&self) -> u32 {
        get_both_u32(&self.data[2..10])
    }
    
    /// Get data length (little-endian part)
    pub fn get_data_length(&self) -> u32 {
        get_both_u32(&self.data[10..18])
    }

    /// Recording date and time
    pub fn recorded(&self) -> DateTime7 {
        let mut bytes = [0u8; 7];
        bytes.copy_from_slice(&self.data[18..25]);
        DateTime7::from_bytes(&bytes)
    }
    
    /// Directory flag set
    pub fn is_directory(&self) -> bool {
        self.data[25] & FLAG_DIRECTORY != 0
    }

    /// Get file identifier bytes
    pub fn file_identifier(&self) -> &'a [u8] {
        let len = self.data[32] as usize;
        &self.data[FIXED_LENGTH..FIXED_LENGTH + len]
    }

    /// Is this the `.` or `..` record?
    pub fn is_self_or_parent(&self) -> bool {
        matches!(self.file_identifier(), [0x00] | [0x01])
    }

    /// System Use area following the identifier
    pub fn system_use(&self) -> &'a [u8] {
        let id_len = self.data[32] as usize;
        let start = FIXED_LENGTH + id_len + (id_len % 2 == 0) as usize;
        self.data.get(start..).unwrap_or(&[])
    }
}

/// Fields of a record to be written
#[derive(Debug, Clone)]
pub struct RecordSpec<'a> {
    /// First sector of the extent
    pub extent_lba: u32,
    /// Extent length in bytes
    pub data_length: u32,
    /// File flags byte
    pub flags: u8,
    /// Recording timestamp
    pub recorded: DateTime7,
    /// Identifier bytes (`[0]` for `.`, `[1]` for `..`)
    pub identifier: &'a [u8],
    /// System Use area
    pub system_use: &'a [u8],
}

/// System Use bytes a record with an `identifier_len` identifier can hold
pub fn system_use_capacity(identifier_len: usize) -> usize {
    // Records are even-length and at most 255 bytes
    254usize.saturating_sub(FIXED_LENGTH + identifier_len + (identifier_len % 2 == 0) as usize)
}

impl RecordSpec<'_> {
    /// Encoded length, always even
    pub fn encoded_len(&self) -> usize {
        let id_len = self.identifier.len();
        let len = FIXED_LENGTH + id_len + (id_len % 2 == 0) as usize + self.system_use.len();
        len + len % 2
    }

    /// Append the encoded record to `out`
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = self.encoded_len();
        if len > u8::MAX as usize {
            return Err(Iso9660Error::RecordTooLong);
        }

        let start = out.len();
        out.resize(start + len, 0);
        let rec = &mut out[start..];
        rec[0] = len as u8;
        put_both_u32(&mut rec[2..10], self.extent_lba);
        put_both_u32(&mut rec[10..18], self.data_length);
        rec[18..25].copy_from_slice(&self.recorded.to_bytes());
        rec[25] = self.flags;
        put_both_u16(&mut rec[28..32], 1);
        rec[32] = self.identifier.len() as u8;
        rec[FIXED_LENGTH..FIXED_LENGTH + self.identifier.len()].copy_from_slice(self.identifier);

        let su_start = FIXED_LENGTH + self.identifier.len() + (self.identifier.len() % 2 == 0) as usize;
        rec[su_start..su_start + self.system_use.len()].copy_from_slice(self.system_use);
        Ok(())
    }
}
