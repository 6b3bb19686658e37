//! Path table encoding
//!
//! Every directory appears once, ordered by level, then parent number,
//! then identifier. Directory numbers are 1-based positions in the table.

use alloc::vec::Vec;

/// Byte order of a path table copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Type L table
    Little,
    /// Type M table
    Big,
}

/// One path table record
#[derive(Debug, Clone)]
pub struct PathTableEntry {
    /// Directory identifier (`[0]` for the root)
    pub identifier: Vec<u8>,
    /// First sector of the directory extent
    pub extent_lba: u32,
    /// Directory number of the parent (the root is its own parent, 1)
    pub parent: u16,
}

impl PathTableEntry {
    fn encoded_len(&self) -> usize {
        8 + self.identifier.len() + self.identifier.len() % 2
    }
}

/// Size in bytes of the encoded table
pub fn encoded_size(entries: &[PathTableEntry]) -> usize {
    entries.iter().map(PathTableEntry::encoded_len).sum()
}

/// Encode the table in the requested byte order
pub fn encode(entries: &[PathTableEntry], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_size(entries));
    for entry in entries {
        out.push(entry.identifier.len() as u8);
        out.push(0);
        match order {
            ByteOrder::Little => {
                out.extend_from_slice(&entry.extent_lba.to_le_bytes());
                out.extend_from_slice(&entry.parent.to_le_bytes());
            }
            ByteOrder::Big => {
                out.extend_from_slice(&entry.extent_lba.to_be_bytes());
                out.extend_from_slice(&entry.parent.to_be_bytes());
            }
        }
        out.extend_from_slice(&entry.identifier);
        if entry.identifier.len() % 2 == 1 {
            out.push(0);
        }
    }
    out
}
