// FAT directory operations

use super::context::FatContext;
use super::filename::{
    alias_candidates, display_short_name, exact_short_name, lfn_checksum, long_name_entries,
    validate_name, LFN_CHAR_OFFSETS, LFN_CHARS_PER_ENTRY, LFN_LAST_ENTRY,
};
use super::types::{DirEntry, ATTR_DIRECTORY, ENTRY_DELETED, ENTRY_END};
use crate::fs::fat_format::{FatError, FatKind, DIR_ENTRY_SIZE, SECTOR_SIZE};
use gpt_disk_io::BlockIo;

/// Where a directory's entries live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirLocation {
    /// FAT12/16 root region between the FATs and the data area
    FixedRoot,
    Cluster(u32),
}

impl DirLocation {
    pub fn root(ctx: &FatContext) -> Self {
        match ctx.kind() {
            FatKind::Fat32 => DirLocation::Cluster(ctx.params.root_cluster),
            _ => DirLocation::FixedRoot,
        }
    }

    /// Cluster number a child's `..` entry records (zero for the root)
    fn parent_reference(self, ctx: &FatContext) -> u32 {
        match self {
            DirLocation::Cluster(cluster) if self != DirLocation::root(ctx) => cluster,
            _ => 0,
        }
    }
}

/// A named item found in a directory
#[derive(Debug, Clone)]
pub struct Slot {
    /// Long name when present, else the short name
    pub name: String,
    pub short_name: String,
    pub entry: DirEntry,
    /// First entry index, long-name parts included
    pub first: usize,
    /// Index of the short entry
    pub short: usize,
}

impl Slot {
    pub fn matches(&self, name: &str) -> bool {
        let wanted = name.to_uppercase();
        self.name.to_uppercase() == wanted || self.short_name.to_uppercase() == wanted
    }
}

/// Long-name parts collected while walking entries
struct LongName {
    checksum: u8,
    first: usize,
    expected: u8,
    parts: Vec<[u16; LFN_CHARS_PER_ENTRY]>,
}

impl LongName {
    fn accept(pending: Option<Self>, raw: &[u8], index: usize) -> Option<Self> {
        let seq = raw[0] & 0x1F;
        let checksum = raw[13];
        let mut long = if raw[0] & LFN_LAST_ENTRY != 0 {
            LongName {
                checksum,
                first: index,
                expected: seq,
                parts: Vec::new(),
            }
        } else {
            pending.filter(|long| long.checksum == checksum)?
        };
        if seq == 0 || seq != long.expected {
            return None;
        }

        let mut units = [0u16; LFN_CHARS_PER_ENTRY];
        for (unit, offset) in units.iter_mut().zip(LFN_CHAR_OFFSETS) {
            *unit = u16::from_le_bytes([raw[offset], raw[offset + 1]]);
        }
        long.parts.push(units);
        long.expected = seq - 1;
        Some(long)
    }

    fn finish(mut self, short: &[u8; 11]) -> Option<(String, usize)> {
        if self.expected != 0 || self.checksum != lfn_checksum(short) {
            return None;
        }
        self.parts.reverse();
        let units: Vec<u16> = self
            .parts
            .iter()
            .flatten()
            .copied()
            .take_while(|unit| *unit != 0)
            .collect();
        String::from_utf16(&units).ok().map(|name| (name, self.first))
    }
}

/// Directory contents loaded into memory
pub struct Directory {
    location: DirLocation,
    clusters: Vec<u32>,
    data: Vec<u8>,
}

impl Directory {
    pub fn load<B: BlockIo>(
        block_io: &mut B,
        ctx: &FatContext,
        location: DirLocation,
    ) -> Result<Self, FatError> {
        match location {
            DirLocation::FixedRoot => {
                let mut data = vec![0u8; ctx.params.root_dir_sectors() as usize * SECTOR_SIZE];
                block_io
                    .read_blocks(ctx.lba(ctx.params.root_dir_start()), &mut data)
                    .map_err(FatError::io)?;
                Ok(Self {
                    location,
                    clusters: Vec::new(),
                    data,
                })
            }
            DirLocation::Cluster(first) => {
                let clusters = ctx.chain(first)?;
                let cluster_bytes = ctx.params.cluster_bytes();
                let mut data = vec![0u8; clusters.len() * cluster_bytes];
                for (chunk, &cluster) in data.chunks_exact_mut(cluster_bytes).zip(&clusters) {
                    ctx.read_cluster(block_io, cluster, chunk)?;
                }
                Ok(Self {
                    location,
                    clusters,
                    data,
                })
            }
        }
    }

    pub fn location(&self) -> DirLocation {
        self.location
    }

    pub fn store<B: BlockIo>(&self, block_io: &mut B, ctx: &FatContext) -> Result<(), FatError> {
        match self.location {
            DirLocation::FixedRoot => block_io
                .write_blocks(ctx.lba(ctx.params.root_dir_start()), &self.data)
                .map_err(FatError::io),
            DirLocation::Cluster(_) => {
                let cluster_bytes = ctx.params.cluster_bytes();
                for (chunk, &cluster) in self.data.chunks_exact(cluster_bytes).zip(&self.clusters) {
                    ctx.write_cluster(block_io, cluster, chunk)?;
                }
                Ok(())
            }
        }
    }

    /// Visible entries, skipping `.`, `..` and volume labels
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        let mut long: Option<LongName> = None;

        for (index, raw) in self.data.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
            match raw[0] {
                ENTRY_END => break,
                ENTRY_DELETED => {
                    long = None;
                    continue;
                }
                _ => {}
            }

            let entry = DirEntry::parse(raw);
            if entry.is_long_name() {
                long = LongName::accept(long.take(), raw, index);
                continue;
            }

            let pending = long.take();
            if entry.is_volume_label() || entry.is_dot() {
                continue;
            }

            let short_name = display_short_name(&entry.name, entry.nt_flags);
            let (name, first) = pending
                .and_then(|long| long.finish(&entry.name))
                .unwrap_or_else(|| (short_name.clone(), index));
            slots.push(Slot {
                name,
                short_name,
                entry,
                first,
                short: index,
            });
        }
        slots
    }

    pub fn find(&self, name: &str) -> Option<Slot> {
        self.slots().into_iter().find(|slot| slot.matches(name))
    }

    fn is_free(&self, index: usize) -> bool {
        let first = self.data[index * DIR_ENTRY_SIZE];
        first == ENTRY_END || first == ENTRY_DELETED
    }

    fn free_run(&self, count: usize) -> Option<usize> {
        let total = self.data.len() / DIR_ENTRY_SIZE;
        let mut run = 0;
        for index in 0..total {
            if self.is_free(index) {
                run += 1;
                if run == count {
                    return Some(index + 1 - count);
                }
            } else {
                run = 0;
            }
        }
        None
    }

    fn grow<B: BlockIo>(&mut self, block_io: &mut B, ctx: &mut FatContext) -> Result<(), FatError> {
        let Some(&last) = self.clusters.last() else {
            return Err(FatError::DirectoryFull);
        };
        let cluster = ctx.extend_chain(last)?;
        let zeros = vec![0u8; ctx.params.cluster_bytes()];
        ctx.write_cluster(block_io, cluster, &zeros)?;
        self.clusters.push(cluster);
        self.data.extend_from_slice(&zeros);
        Ok(())
    }

    /// Add a new name, with long-name entries when it is not a plain 8.3 name
    pub fn insert<B: BlockIo>(
        &mut self,
        block_io: &mut B,
        ctx: &mut FatContext,
        name: &str,
        mut entry: DirEntry,
    ) -> Result<(), FatError> {
        validate_name(name)?;
        let slots = self.slots();
        if slots.iter().any(|slot| slot.matches(name)) {
            return Err(FatError::AlreadyExists(name.to_string()));
        }

        let mut raw_entries = Vec::new();
        match exact_short_name(name) {
            Some(short) => entry.name = short,
            None => {
                entry.name = alias_candidates(name)
                    .find(|alias| slots.iter().all(|slot| slot.entry.name != *alias))
                    .ok_or_else(|| FatError::AlreadyExists(name.to_string()))?;
                raw_entries = long_name_entries(name, lfn_checksum(&entry.name));
            }
        }
        raw_entries.push(entry.encode());

        let start = loop {
            if let Some(start) = self.free_run(raw_entries.len()) {
                break start;
            }
            self.grow(block_io, ctx)?;
        };
        for (offset, raw) in raw_entries.iter().enumerate() {
            let at = (start + offset) * DIR_ENTRY_SIZE;
            self.data[at..at + DIR_ENTRY_SIZE].copy_from_slice(raw);
        }
        self.store(block_io, ctx)
    }

    /// Rewrite the short entry of an existing slot
    pub fn update<B: BlockIo>(
        &mut self,
        block_io: &mut B,
        ctx: &FatContext,
        slot: &Slot,
        entry: DirEntry,
    ) -> Result<(), FatError> {
        let at = slot.short * DIR_ENTRY_SIZE;
        self.data[at..at + DIR_ENTRY_SIZE].copy_from_slice(&entry.encode());
        self.store(block_io, ctx)
    }
}

/// Create `name` as an empty sub-directory of `parent`
fn create_child<B: BlockIo>(
    block_io: &mut B,
    ctx: &mut FatContext,
    parent: &mut Directory,
    name: &str,
) -> Result<DirLocation, FatError> {
    validate_name(name)?;
    let cluster = ctx.allocate_chain(1)?[0];

    let mut cluster_data = vec![0u8; ctx.params.cluster_bytes()];
    let dot = DirEntry::new(*b".          ", ATTR_DIRECTORY, cluster, 0);
    let dotdot = DirEntry::new(
        *b"..         ",
        ATTR_DIRECTORY,
        parent.location().parent_reference(ctx),
        0,
    );
    cluster_data[..DIR_ENTRY_SIZE].copy_from_slice(&dot.encode());
    cluster_data[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE].copy_from_slice(&dotdot.encode());
    ctx.write_cluster(block_io, cluster, &cluster_data)?;

    let entry = DirEntry::new([0; 11], ATTR_DIRECTORY, cluster, 0);
    if let Err(err) = parent.insert(block_io, ctx, name, entry) {
        ctx.free_chain(cluster)?;
        return Err(err);
    }
    Ok(DirLocation::Cluster(cluster))
}

fn child_location(slot: &Slot, path: &str) -> Result<DirLocation, FatError> {
    if !slot.entry.is_directory() {
        return Err(FatError::NotADirectory(path.to_string()));
    }
    Ok(DirLocation::Cluster(slot.entry.first_cluster))
}

/// Walk `components` from the root, optionally creating what is missing
pub fn open_directory<B: BlockIo>(
    block_io: &mut B,
    ctx: &mut FatContext,
    components: &[&str],
    create: bool,
) -> Result<Directory, FatError> {
    let mut dir = Directory::load(block_io, ctx, DirLocation::root(ctx))?;
    let mut walked = String::new();

    for component in components {
        walked.push('/');
        walked.push_str(component);

        let location = match dir.find(component) {
            Some(slot) => child_location(&slot, &walked)?,
            None if create => create_child(block_io, ctx, &mut dir, component)?,
            None => return Err(FatError::NotFound(walked)),
        };
        dir = Directory::load(block_io, ctx, location)?;
    }
    Ok(dir)
}
