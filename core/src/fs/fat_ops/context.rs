// FAT filesystem context and allocation table operations

use crate::fs::fat_format::{FatError, FatKind, FatParams, SECTOR_SIZE};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Open volume: parameters plus an in-memory copy of the first FAT
pub struct FatContext {
    pub params: FatParams,
    partition_start: u64,
    fat: Vec<u8>,
    dirty: bool,
    next_free: u32,
}

impl FatContext {
    pub fn from_boot_sector<B: BlockIo>(
        block_io: &mut B,
        partition_start: u64,
    ) -> Result<Self, FatError> {
        let mut boot_sector = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(Lba(partition_start), &mut boot_sector)
            .map_err(FatError::io)?;
        let params = FatParams::parse(&boot_sector)?;
        let table_bytes = params.fat_size as usize * SECTOR_SIZE;
        if params.kind.fat_bytes(params.max_cluster() + 1) > table_bytes as u64 {
            return Err(FatError::InvalidBootSector("FAT too small for the data area"));
        }

        let mut fat = vec![0u8; table_bytes];
        block_io
            .read_blocks(
                Lba(partition_start + u64::from(params.fat_start(0))),
                &mut fat,
            )
            .map_err(FatError::io)?;

        Ok(Self {
            params,
            partition_start,
            fat,
            dirty: false,
            next_free: 2,
        })
    }

    pub fn kind(&self) -> FatKind {
        self.params.kind
    }

    /// Device LBA of a volume-relative sector
    pub fn lba(&self, sector: u32) -> Lba {
        Lba(self.partition_start + u64::from(sector))
    }

    pub fn cluster_lba(&self, cluster: u32) -> Lba {
        self.lba(self.params.cluster_to_sector(cluster))
    }

    fn check_cluster(&self, cluster: u32) -> Result<(), FatError> {
        if cluster < 2 || cluster > self.params.max_cluster() {
            Err(FatError::CorruptChain(cluster))
        } else {
            Ok(())
        }
    }

    pub fn read_fat_entry(&self, cluster: u32) -> u32 {
        let n = cluster as usize;
        match self.kind() {
            FatKind::Fat12 => {
                let offset = n + n / 2;
                let pair = u16::from_le_bytes([self.fat[offset], self.fat[offset + 1]]);
                if n % 2 == 1 {
                    u32::from(pair >> 4)
                } else {
                    u32::from(pair & 0x0FFF)
                }
            }
            FatKind::Fat16 => u32::from(u16::from_le_bytes([self.fat[n * 2], self.fat[n * 2 + 1]])),
            FatKind::Fat32 => {
                let offset = n * 4;
                u32::from_le_bytes([
                    self.fat[offset],
                    self.fat[offset + 1],
                    self.fat[offset + 2],
                    self.fat[offset + 3],
                ]) & 0x0FFF_FFFF
            }
        }
    }

    pub fn write_fat_entry(&mut self, cluster: u32, value: u32) {
        let n = cluster as usize;
        match self.kind() {
            FatKind::Fat12 => {
                let offset = n + n / 2;
                let value = (value & 0x0FFF) as u16;
                if n % 2 == 1 {
                    self.fat[offset] = (self.fat[offset] & 0x0F) | ((value << 4) as u8);
                    self.fat[offset + 1] = (value >> 4) as u8;
                } else {
                    self.fat[offset] = value as u8;
                    self.fat[offset + 1] = (self.fat[offset + 1] & 0xF0) | ((value >> 8) as u8);
                }
            }
            FatKind::Fat16 => {
                self.fat[n * 2..n * 2 + 2].copy_from_slice(&(value as u16).to_le_bytes());
            }
            FatKind::Fat32 => {
                // Upper four bits are reserved and preserved
                let offset = n * 4;
                let old = self.read_raw32(offset);
                let merged = (old & 0xF000_0000) | (value & 0x0FFF_FFFF);
                self.fat[offset..offset + 4].copy_from_slice(&merged.to_le_bytes());
            }
        }
        self.dirty = true;
    }

    fn read_raw32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.fat[offset],
            self.fat[offset + 1],
            self.fat[offset + 2],
            self.fat[offset + 3],
        ])
    }

    /// Allocate `count` clusters linked into one chain
    pub fn allocate_chain(&mut self, count: u32) -> Result<Vec<u32>, FatError> {
        let mut clusters = Vec::with_capacity(count as usize);
        let mut cluster = self.next_free;
        while (clusters.len() as u32) < count {
            if cluster > self.params.max_cluster() {
                // Undo the partial allocation before failing
                for &allocated in &clusters {
                    self.write_fat_entry(allocated, 0);
                }
                return Err(FatError::VolumeFull);
            }
            if self.read_fat_entry(cluster) == 0 {
                self.write_fat_entry(cluster, self.kind().end_of_chain());
                clusters.push(cluster);
            }
            cluster += 1;
        }

        for pair in clusters.windows(2) {
            self.write_fat_entry(pair[0], pair[1]);
        }
        self.next_free = cluster;
        Ok(clusters)
    }

    /// Append one cluster to the chain ending at `last`
    pub fn extend_chain(&mut self, last: u32) -> Result<u32, FatError> {
        let cluster = self.allocate_chain(1)?[0];
        self.write_fat_entry(last, cluster);
        Ok(cluster)
    }

    /// Release every cluster of a chain
    pub fn free_chain(&mut self, first: u32) -> Result<(), FatError> {
        for cluster in self.chain(first)? {
            self.write_fat_entry(cluster, 0);
            self.next_free = self.next_free.min(cluster);
        }
        Ok(())
    }

    /// Clusters of the chain starting at `first`
    pub fn chain(&self, first: u32) -> Result<Vec<u32>, FatError> {
        let mut clusters = Vec::new();
        let mut cluster = first;
        loop {
            self.check_cluster(cluster)?;
            if clusters.len() as u32 >= self.params.cluster_count() {
                return Err(FatError::CorruptChain(first));
            }
            clusters.push(cluster);

            let next = self.read_fat_entry(cluster);
            if self.kind().is_end_of_chain(next) {
                return Ok(clusters);
            }
            cluster = next;
        }
    }

    pub fn read_cluster<B: BlockIo>(
        &self,
        block_io: &mut B,
        cluster: u32,
        buf: &mut [u8],
    ) -> Result<(), FatError> {
        self.check_cluster(cluster)?;
        block_io
            .read_blocks(self.cluster_lba(cluster), buf)
            .map_err(FatError::io)
    }

    pub fn write_cluster<B: BlockIo>(
        &self,
        block_io: &mut B,
        cluster: u32,
        data: &[u8],
    ) -> Result<(), FatError> {
        self.check_cluster(cluster)?;
        block_io
            .write_blocks(self.cluster_lba(cluster), data)
            .map_err(FatError::io)
    }

    /// Write the FAT back to every copy if it changed
    pub fn flush<B: BlockIo>(&mut self, block_io: &mut B) -> Result<(), FatError> {
        if self.dirty {
            for copy in 0..self.params.num_fats {
                block_io
                    .write_blocks(self.lba(self.params.fat_start(copy)), &self.fat)
                    .map_err(FatError::io)?;
            }
            self.dirty = false;
        }
        block_io.flush().map_err(FatError::io)
    }
}
