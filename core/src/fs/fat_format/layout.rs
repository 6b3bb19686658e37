// FAT variant selection and volume geometry

use super::FatError;
use std::fmt;
use std::ops::RangeInclusive;

pub const SECTOR_SIZE: usize = 512;
pub const DIR_ENTRY_SIZE: usize = 32;

const NUM_FATS: u8 = 2;
const FAT32_RESERVED_SECTORS: u16 = 32;
const FIXED_ROOT_ENTRIES: u16 = 512;
const FAT32_ROOT_CLUSTER: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FatKind {
    Fat12,
    Fat16,
    Fat32,
}

impl FatKind {
    /// Legal data cluster counts, per the Microsoft FAT specification
    pub fn cluster_range(self) -> RangeInclusive<u32> {
        match self {
            FatKind::Fat12 => 1..=4084,
            FatKind::Fat16 => 4085..=65524,
            FatKind::Fat32 => 65525..=0x0FFF_FFF4,
        }
    }

    /// The variant a driver infers from a cluster count
    pub fn from_cluster_count(clusters: u32) -> Self {
        if clusters < 4085 {
            FatKind::Fat12
        } else if clusters < 65525 {
            FatKind::Fat16
        } else {
            FatKind::Fat32
        }
    }

    /// Bytes taken by `entries` FAT entries
    pub fn fat_bytes(self, entries: u32) -> u64 {
        let entries = u64::from(entries);
        match self {
            FatKind::Fat12 => (entries * 3).div_ceil(2),
            FatKind::Fat16 => entries * 2,
            FatKind::Fat32 => entries * 4,
        }
    }

    pub fn end_of_chain(self) -> u32 {
        match self {
            FatKind::Fat12 => 0x0FFF,
            FatKind::Fat16 => 0xFFFF,
            FatKind::Fat32 => 0x0FFF_FFFF,
        }
    }

    pub fn is_end_of_chain(self, value: u32) -> bool {
        match self {
            FatKind::Fat12 => value >= 0x0FF8,
            FatKind::Fat16 => value >= 0xFFF8,
            FatKind::Fat32 => value >= 0x0FFF_FFF8,
        }
    }

    pub fn fs_type_label(self) -> &'static [u8; 8] {
        match self {
            FatKind::Fat12 => b"FAT12   ",
            FatKind::Fat16 => b"FAT16   ",
            FatKind::Fat32 => b"FAT32   ",
        }
    }

    fn reserved_sectors(self) -> u16 {
        match self {
            FatKind::Fat32 => FAT32_RESERVED_SECTORS,
            _ => 1,
        }
    }

    fn root_entries(self) -> u16 {
        match self {
            FatKind::Fat32 => 0,
            _ => FIXED_ROOT_ENTRIES,
        }
    }
}

impl fmt::Display for FatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FatKind::Fat12 => "FAT12",
            FatKind::Fat16 => "FAT16",
            FatKind::Fat32 => "FAT32",
        })
    }
}

/// BIOS parameter block values of one volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatParams {
    pub kind: FatKind,
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    /// Sectors per FAT copy
    pub fat_size: u32,
    pub hidden_sectors: u32,
    /// Zero unless FAT32
    pub root_cluster: u32,
}

impl FatParams {
    /// Pick the smallest cluster size that keeps the cluster count legal
    pub fn compute(kind: FatKind, total_sectors: u64, hidden_sectors: u64) -> Result<Self, FatError> {
        let total_sectors =
            u32::try_from(total_sectors).map_err(|_| FatError::PartitionTooLarge(kind))?;
        let hidden_sectors =
            u32::try_from(hidden_sectors).map_err(|_| FatError::PartitionTooLarge(kind))?;
        let range = kind.cluster_range();

        for shift in 0..8 {
            let mut params = FatParams {
                kind,
                total_sectors,
                sectors_per_cluster: 1 << shift,
                reserved_sectors: kind.reserved_sectors(),
                num_fats: NUM_FATS,
                root_entries: kind.root_entries(),
                fat_size: 1,
                hidden_sectors,
                root_cluster: if kind == FatKind::Fat32 {
                    FAT32_ROOT_CLUSTER
                } else {
                    0
                },
            };

            // Growing the FAT shrinks the data area, so this converges
            loop {
                if params.first_data_sector() >= total_sectors {
                    return Err(FatError::PartitionTooSmall(kind));
                }
                let needed = kind
                    .fat_bytes(params.cluster_count() + 2)
                    .div_ceil(SECTOR_SIZE as u64) as u32;
                if needed <= params.fat_size {
                    break;
                }
                params.fat_size = needed;
            }

            let clusters = params.cluster_count();
            if clusters > *range.end() {
                continue;
            }
            if clusters < *range.start() {
                return Err(FatError::PartitionTooSmall(kind));
            }
            return Ok(params);
        }

        Err(FatError::PartitionTooLarge(kind))
    }

    /// Read the parameters back from a boot sector
    pub fn parse(sector: &[u8]) -> Result<Self, FatError> {
        if sector.len() < SECTOR_SIZE {
            return Err(FatError::InvalidBootSector("short sector"));
        }
        if sector[510..512] != [0x55, 0xAA] {
            return Err(FatError::InvalidBootSector("missing 0xAA55 signature"));
        }

        let u16_at = |offset: usize| u16::from_le_bytes([sector[offset], sector[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                sector[offset],
                sector[offset + 1],
                sector[offset + 2],
                sector[offset + 3],
            ])
        };

        if usize::from(u16_at(11)) != SECTOR_SIZE {
            return Err(FatError::InvalidBootSector("unsupported sector size"));
        }
        let sectors_per_cluster = sector[13];
        if !sectors_per_cluster.is_power_of_two() {
            return Err(FatError::InvalidBootSector("bad sectors per cluster"));
        }
        let reserved_sectors = u16_at(14);
        let num_fats = sector[16];
        if reserved_sectors == 0 || num_fats == 0 {
            return Err(FatError::InvalidBootSector("bad reserved area"));
        }

        let root_entries = u16_at(17);
        let total_sectors = match u16_at(19) {
            0 => u32_at(32),
            n => u32::from(n),
        };
        let fat_size = match u16_at(22) {
            0 => u32_at(36),
            n => u32::from(n),
        };

        let mut params = FatParams {
            kind: FatKind::Fat12,
            total_sectors,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            root_entries,
            fat_size,
            hidden_sectors: u32_at(28),
            root_cluster: 0,
        };
        if params.first_data_sector() >= total_sectors {
            return Err(FatError::InvalidBootSector("no data area"));
        }

        params.kind = FatKind::from_cluster_count(params.cluster_count());
        if params.kind == FatKind::Fat32 {
            params.root_cluster = u32_at(44);
        }
        Ok(params)
    }

    /// Sectors of the fixed FAT12/16 root directory
    pub fn root_dir_sectors(&self) -> u32 {
        (u32::from(self.root_entries) * DIR_ENTRY_SIZE as u32).div_ceil(SECTOR_SIZE as u32)
    }

    pub fn fat_start(&self, copy: u8) -> u32 {
        u32::from(self.reserved_sectors) + u32::from(copy) * self.fat_size
    }

    pub fn root_dir_start(&self) -> u32 {
        self.fat_start(self.num_fats)
    }

    pub fn first_data_sector(&self) -> u32 {
        self.root_dir_start() + self.root_dir_sectors()
    }

    pub fn cluster_count(&self) -> u32 {
        self.total_sectors.saturating_sub(self.first_data_sector())
            / u32::from(self.sectors_per_cluster)
    }

    pub fn cluster_bytes(&self) -> usize {
        usize::from(self.sectors_per_cluster) * SECTOR_SIZE
    }

    pub fn cluster_to_sector(&self, cluster: u32) -> u32 {
        self.first_data_sector() + (cluster - 2) * u32::from(self.sectors_per_cluster)
    }

    /// Highest valid data cluster number
    pub fn max_cluster(&self) -> u32 {
        self.cluster_count() + 1
    }
}
