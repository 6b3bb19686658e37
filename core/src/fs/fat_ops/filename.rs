//! FAT name handling
//!
//! Every name is stored with a VFAT long-name chain unless it already is a
//! valid upper-case 8.3 name. The short alias follows the usual `BASE~N.EXT`
//! scheme and falls back to a hash of the long name once the numbered
//! candidates collide.

use crate::fs::fat_format::FatError;

/// UCS-2 characters held by one long-name entry
pub const LFN_CHARS_PER_ENTRY: usize = 13;
/// Byte offsets of those characters inside the 32-byte entry
pub const LFN_CHAR_OFFSETS: [usize; LFN_CHARS_PER_ENTRY] =
    [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];
pub const LFN_LAST_ENTRY: u8 = 0x40;
const MAX_NAME_UNITS: usize = 255;

const NUMBERED_ALIASES: u32 = 4;
const HASHED_ALIASES: u32 = 9;

/// Calculate CRC32 checksum of data.
///
/// Uses standard CRC32 algorithm with polynomial 0xEDB88320.
pub(crate) fn crc32(data: &[u8]) -> u32 {
    const POLYNOMIAL: u32 = 0xEDB88320;

    let mut crc: u32 = 0xFFFFFFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}

fn is_short_char(c: u8) -> bool {
    c.is_ascii_uppercase()
        || c.is_ascii_digit()
        || b"!#$%&'()-@^_`{}~".contains(&c)
}

/// Reject names no FAT directory can hold
pub fn validate_name(name: &str) -> Result<(), FatError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.encode_utf16().count() > MAX_NAME_UNITS
        || name.ends_with(' ')
        || name
            .chars()
            .any(|c| c.is_control() || "\\/:*?\"<>|".contains(c));
    if invalid {
        Err(FatError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// The 8.3 form of `name` when it can be stored without a long name
pub fn exact_short_name(name: &str) -> Option<[u8; 11]> {
    let (base, ext) = match name.split_once('.') {
        Some((base, ext)) => (base, ext),
        None => (name, ""),
    };
    let valid = |part: &str, max: usize| part.len() <= max && part.bytes().all(is_short_char);
    if base.is_empty() || !valid(base, 8) || !valid(ext, 3) || (name.contains('.') && ext.is_empty()) {
        return None;
    }

    let mut short = [b' '; 11];
    short[..base.len()].copy_from_slice(base.as_bytes());
    short[8..8 + ext.len()].copy_from_slice(ext.as_bytes());
    Some(short)
}

fn short_chars(part: &str) -> Vec<u8> {
    part.chars()
        .filter(|c| *c != ' ' && *c != '.')
        .map(|c| {
            let upper = c.to_ascii_uppercase();
            if upper.is_ascii() && is_short_char(upper as u8) {
                upper as u8
            } else {
                b'_'
            }
        })
        .collect()
}

/// Candidate 8.3 aliases for a long name, in preference order
pub fn alias_candidates(name: &str) -> impl Iterator<Item = [u8; 11]> {
    let trimmed = name.trim_start_matches('.');
    let (base, ext) = match trimmed.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (short_chars(base), short_chars(ext)),
        _ => (short_chars(trimmed), Vec::new()),
    };
    let base = if base.is_empty() { b"_".to_vec() } else { base };
    let ext: Vec<u8> = ext.into_iter().take(3).collect();
    let hash = crc32(name.as_bytes()) as u16;

    let numbered = (1..=NUMBERED_ALIASES).map({
        let base = base.clone();
        move |n| {
            let mut stem: Vec<u8> = base.iter().copied().take(6).collect();
            stem.extend_from_slice(format!("~{n}").as_bytes());
            stem
        }
    });
    let hashed = (1..=HASHED_ALIASES).map({
        let base = base.clone();
        move |n| {
            let mut stem: Vec<u8> = base.iter().copied().take(2).collect();
            stem.extend_from_slice(format!("{hash:04X}~{n}").as_bytes());
            stem
        }
    });

    numbered.chain(hashed).map(move |stem| {
        let mut short = [b' '; 11];
        short[..stem.len()].copy_from_slice(&stem);
        short[8..8 + ext.len()].copy_from_slice(&ext);
        short
    })
}

/// Checksum of a short name, stored in each of its long-name entries
pub fn lfn_checksum(short: &[u8; 11]) -> u8 {
    short
        .iter()
        .fold(0u8, |sum, &b| ((sum & 1) << 7).wrapping_add(sum >> 1).wrapping_add(b))
}

/// Long-name entries for `name`, in on-disk order (last part first)
pub fn long_name_entries(name: &str, checksum: u8) -> Vec<[u8; 32]> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let count = units.len().div_ceil(LFN_CHARS_PER_ENTRY);

    (0..count)
        .rev()
        .map(|index| {
            let mut raw = [0u8; 32];
            raw[0] = (index + 1) as u8;
            if index + 1 == count {
                raw[0] |= LFN_LAST_ENTRY;
            }
            raw[11] = super::types::ATTR_LONG_NAME;
            raw[13] = checksum;

            let chunk = &units[index * LFN_CHARS_PER_ENTRY..];
            for (slot, offset) in LFN_CHAR_OFFSETS.iter().enumerate() {
                let unit = match slot.cmp(&chunk.len()) {
                    std::cmp::Ordering::Less => chunk[slot],
                    std::cmp::Ordering::Equal => 0x0000,
                    std::cmp::Ordering::Greater => 0xFFFF,
                };
                raw[*offset..*offset + 2].copy_from_slice(&unit.to_le_bytes());
            }
            raw
        })
        .collect()
}

/// Render a raw 8.3 name as `NAME.EXT`, honouring the lower-case flags
pub fn display_short_name(short: &[u8; 11], nt_flags: u8) -> String {
    let part = |bytes: &[u8], lower: bool| {
        let text: String = bytes
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
            .trim_end()
            .to_string();
        if lower {
            text.to_ascii_lowercase()
        } else {
            text
        }
    };
    let base = part(&short[..8], nt_flags & 0x08 != 0);
    let ext = part(&short[8..], nt_flags & 0x10 != 0);
    if ext.is_empty() {
        base
    } else {
        format!("{base}.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        assert_eq!(crc32(b""), 0x00000000);
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_exact_short_names() {
        assert_eq!(exact_short_name("BOOTX64.EFI"), Some(*b"BOOTX64 EFI"));
        assert_eq!(exact_short_name("EFI"), Some(*b"EFI        "));
        assert_eq!(exact_short_name("hyper.cfg"), None);
        assert_eq!(exact_short_name("A.B.C"), None);
        assert_eq!(exact_short_name("LONGERNAME"), None);
    }

    #[test]
    fn test_alias_candidates() {
        let mut aliases = alias_candidates("kernel_amd64_higher_half");
        assert_eq!(&aliases.next().unwrap(), b"KERNEL~1   ");
        assert_eq!(&aliases.nth(2).unwrap(), b"KERNEL~4   ");
        let hashed = aliases.next().unwrap();
        assert_eq!(&hashed[..2], b"KE");
        assert_eq!(&hashed[6..8], b"~1");

        assert_eq!(&alias_candidates("hyper.cfg").next().unwrap(), b"HYPER~1 CFG");
        assert_eq!(&alias_candidates(".config").next().unwrap(), b"CONFIG~1   ");
        assert_eq!(alias_candidates("x").count(), 13);
    }

    #[test]
    fn test_long_name_entries() {
        let short = *b"KERNEL~1   ";
        let entries = long_name_entries("kernel_amd64_higher_half", lfn_checksum(&short));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0][0], 0x42);
        assert_eq!(entries[1][0], 0x01);
        assert_eq!(entries[1][11], 0x0F);
        // 'k' in the first slot of the first part
        assert_eq!(&entries[1][1..3], &[b'k', 0]);
        // 24 units: part two holds 11 characters, a terminator and padding
        assert_eq!(&entries[0][28..30], &[0, 0]);
        assert_eq!(&entries[0][30..32], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("kernel_i686_lower_half").is_ok());
        assert!(validate_name("a:b").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_display_short_name() {
        assert_eq!(display_short_name(b"HYPER   CFG", 0), "HYPER.CFG");
        assert_eq!(display_short_name(b"HYPER   CFG", 0x18), "hyper.cfg");
        assert_eq!(display_short_name(b"EFI        ", 0), "EFI");
    }
}
