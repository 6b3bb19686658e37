//! Sector arithmetic and both-endian fields

use crate::types::SECTOR_SIZE;

/// Round a byte count up to whole sectors
pub fn align_to_sector(value: usize) -> usize {
    value.next_multiple_of(SECTOR_SIZE)
}

/// Sectors needed to hold `byte_count` bytes
pub fn sectors_for_bytes(byte_count: u32) -> u32 {
    byte_count.div_ceil(SECTOR_SIZE as u32)
}

/// Write a both-endian 16-bit field (LE then BE)
pub fn put_both_u16(dst: &mut [u8], value: u16) {
    dst[0..2].copy_from_slice(&value.to_le_bytes());
    dst[2..4].copy_from_slice(&value.to_be_bytes());
}

/// Write a both-endian 32-bit field (LE then BE)
pub fn put_both_u32(dst: &mut [u8], value: u32) {
    dst[0..4].copy_from_slice(&value.to_le_bytes());
    dst[4..8].copy_from_slice(&value.to_be_bytes());
}

/// Read the little-endian half of a both-endian 32-bit field
pub fn get_both_u32(src: &[u8]) -> u32 {
    u32::from_le_bytes([src[0], src[1], src[2], src[3]])
}

/// Read the little-endian half of a both-endian 16-bit field
pub fn get_both_u16(src: &[u8]) -> u16 {
    u16::from_le_bytes([src[0], src[1]])
}
