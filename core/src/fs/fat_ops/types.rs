// FAT directory entry types

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

pub const ENTRY_END: u8 = 0x00;
pub const ENTRY_DELETED: u8 = 0xE5;

/// 2000-01-01, used for every timestamp so images are reproducible
pub const FIXED_DOS_DATE: u16 = (20 << 9) | (1 << 5) | 1;

/// Short directory entry (32 bytes on disk)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 11],
    pub attr: u8,
    /// Lower-case flags for base (0x08) and extension (0x10)
    pub nt_flags: u8,
    pub first_cluster: u32,
    pub file_size: u32,
}

impl DirEntry {
    pub fn new(name: [u8; 11], attr: u8, first_cluster: u32, file_size: u32) -> Self {
        Self {
            name,
            attr,
            nt_flags: 0,
            first_cluster,
            file_size,
        }
    }

    pub fn parse(raw: &[u8]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[..11]);
        let high = u16::from_le_bytes([raw[20], raw[21]]);
        let low = u16::from_le_bytes([raw[26], raw[27]]);

        Self {
            name,
            attr: raw[11],
            nt_flags: raw[12],
            first_cluster: (u32::from(high) << 16) | u32::from(low),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    pub fn encode(&self) -> [u8; 32] {
        let mut raw = [0u8; 32];
        raw[..11].copy_from_slice(&self.name);
        raw[11] = self.attr;
        raw[12] = self.nt_flags;
        for offset in [16, 18, 24] {
            raw[offset..offset + 2].copy_from_slice(&FIXED_DOS_DATE.to_le_bytes());
        }
        raw[20..22].copy_from_slice(&((self.first_cluster >> 16) as u16).to_le_bytes());
        raw[26..28].copy_from_slice(&(self.first_cluster as u16).to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        raw
    }

    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    pub fn is_long_name(&self) -> bool {
        self.attr & ATTR_LONG_NAME == ATTR_LONG_NAME
    }

    pub fn is_volume_label(&self) -> bool {
        !self.is_long_name() && self.attr & ATTR_VOLUME_ID != 0
    }

    pub fn is_dot(&self) -> bool {
        self.name[0] == b'.'
    }
}

/// One visible item of a FAT directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_layout() {
        let entry = DirEntry::new(*b"HYPER   CFG", ATTR_ARCHIVE, 0x0001_0203, 77);
        let raw = entry.encode();
        assert_eq!(&raw[20..22], &[0x01, 0x00]);
        assert_eq!(&raw[26..28], &[0x03, 0x02]);
        assert_eq!(&raw[24..26], &FIXED_DOS_DATE.to_le_bytes());
        assert_eq!(DirEntry::parse(&raw), entry);
    }

    #[test]
    fn test_fixed_date() {
        assert_eq!(FIXED_DOS_DATE, 0x2821);
    }
}
