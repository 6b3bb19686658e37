//! Boot catalog validation entry
//!
//! The validation entry verifies catalog integrity via checksum.

use crate::error::{Iso9660Error, Result};
use crate::types::BootPlatform;
use crate::utils::checksum;

/// Validation Entry (32 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEntry {
    /// Platform ID
    pub platform: BootPlatform,
    
    /// Manufacturer/developer ID string (24 bytes)
    pub id_string: [u8; 24],
}

impl ValidationEntry {
    /// Header ID constant
    pub const HEADER_ID: u8 = 0x01;
    
    /// Key bytes constant
    pub const KEY_BYTES: [u8; 2] = [0x55, 0xAA];

    /// Build an entry with an ASCII developer ID
    pub fn new(platform: BootPlatform, id: &str) -> Self {
        let mut id_string = [0u8; 24];
        let len = id.len().min(24);
        id_string[..len].copy_from_slice(&id.as_bytes()[..len]);
        Self { platform, id_string }
    }

    /// Parse and verify the first 32 bytes of a catalog
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 32 || data[0] != Self::HEADER_ID || data[30..32] != Self::KEY_BYTES {
            return Err(Iso9660Error::InvalidBootCatalog);
        }
        if !checksum::verify_checksum_16(&data[..32]) {
            return Err(Iso9660Error::ChecksumFailed);
        }
        let platform = BootPlatform::from_id(data[1]).ok_or(Iso9660Error::InvalidBootCatalog)?;
        let mut id_string = [0u8; 24];
        id_string.copy_from_slice(&data[4..28]);
        Ok(Self { platform, id_string })
    }

    /// Encode with a checksum word making the 16-bit sum zero
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[0] = Self::HEADER_ID;
        bytes[1] = self.platform.id();
        bytes[4..28].copy_from_slice(&self.id_string);
        bytes[30..32].copy_from_slice(&Self::KEY_BYTES);
        let sum = checksum::calculate_complement_16(&bytes);
        bytes[28..30].copy_from_slice(&sum.to_le_bytes());
        bytes
    }
}
