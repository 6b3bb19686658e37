//! Word sums used by the boot catalog and the boot info table

fn words16(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2).map(|w| u16::from_le_bytes([w[0], w[1]]))
}

/// Wrapping sum of little-endian 16-bit words
pub fn checksum_16(data: &[u8]) -> u16 {
    words16(data).fold(0, u16::wrapping_add)
}

/// A validation entry is intact when its words sum to zero
pub fn verify_checksum_16(data: &[u8]) -> bool {
    checksum_16(data) == 0
}

/// Value that brings the word sum of `data` to zero
pub fn calculate_complement_16(data: &[u8]) -> u16 {
    checksum_16(data).wrapping_neg()
}

/// Wrapping sum of little-endian 32-bit words, zero-padding a short tail
pub fn checksum_32(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_le_bytes(word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_sum_wraps() {
        assert_eq!(checksum_16(&[0x01, 0x00, 0x02, 0x00]), 3);
        assert!(verify_checksum_16(&[0x01, 0x00, 0xFF, 0xFF]));
    }

    #[test]
    fn test_complement_zeroes_sum() {
        let mut entry = [0x01, 0xEF, 0x00, 0x00, 0x41, 0x42, 0x00, 0x00];
        let complement = calculate_complement_16(&entry);
        entry[6..8].copy_from_slice(&complement.to_le_bytes());
        assert!(verify_checksum_16(&entry));
    }

    #[test]
    fn test_checksum_32_pads_tail() {
        assert_eq!(checksum_32(&[1, 0, 0, 0, 2, 0, 0, 0]), 3);
        assert_eq!(checksum_32(&[1, 0, 0, 0, 0x05]), 6);
    }
}
