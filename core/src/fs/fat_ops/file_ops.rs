// FAT file read/write operations

use super::context::FatContext;
use super::directory::{Directory, Slot};
use super::types::{DirEntry, ATTR_ARCHIVE};
use crate::fs::fat_format::FatError;
use gpt_disk_io::BlockIo;

pub fn write_file_in_directory<B: BlockIo>(
    block_io: &mut B,
    ctx: &mut FatContext,
    dir: &mut Directory,
    name: &str,
    data: &[u8],
) -> Result<(), FatError> {
    let size = u32::try_from(data.len()).map_err(|_| FatError::FileTooLarge(data.len() as u64))?;

    let existing = dir.find(name);
    if let Some(slot) = &existing {
        if slot.entry.is_directory() {
            return Err(FatError::IsADirectory(name.to_string()));
        }
        if slot.entry.first_cluster != 0 {
            ctx.free_chain(slot.entry.first_cluster)?;
        }
    }

    // Empty files own no clusters
    let cluster_bytes = ctx.params.cluster_bytes();
    let clusters = if data.is_empty() {
        Vec::new()
    } else {
        ctx.allocate_chain(data.len().div_ceil(cluster_bytes) as u32)?
    };

    let mut padded = vec![0u8; cluster_bytes];
    for (chunk, &cluster) in data.chunks(cluster_bytes).zip(&clusters) {
        if chunk.len() == cluster_bytes {
            ctx.write_cluster(block_io, cluster, chunk)?;
        } else {
            padded.fill(0);
            padded[..chunk.len()].copy_from_slice(chunk);
            ctx.write_cluster(block_io, cluster, &padded)?;
        }
    }

    let first_cluster = clusters.first().copied().unwrap_or(0);
    match existing {
        Some(slot) => {
            let entry = DirEntry {
                first_cluster,
                file_size: size,
                ..slot.entry
            };
            dir.update(block_io, ctx, &slot, entry)
        }
        None => {
            let entry = DirEntry::new([0; 11], ATTR_ARCHIVE, first_cluster, size);
            if let Err(err) = dir.insert(block_io, ctx, name, entry) {
                if first_cluster != 0 {
                    ctx.free_chain(first_cluster)?;
                }
                return Err(err);
            }
            Ok(())
        }
    }
}

pub fn read_file_data<B: BlockIo>(
    block_io: &mut B,
    ctx: &FatContext,
    slot: &Slot,
) -> Result<Vec<u8>, FatError> {
    let file_size = slot.entry.file_size as usize;
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let cluster_bytes = ctx.params.cluster_bytes();
    let chain = ctx.chain(slot.entry.first_cluster)?;
    if chain.len() < file_size.div_ceil(cluster_bytes) {
        return Err(FatError::CorruptChain(slot.entry.first_cluster));
    }

    let mut data = vec![0u8; chain.len() * cluster_bytes];
    for (chunk, &cluster) in data.chunks_exact_mut(cluster_bytes).zip(&chain) {
        ctx.read_cluster(block_io, cluster, chunk)?;
    }
    data.truncate(file_size);
    Ok(data)
}
