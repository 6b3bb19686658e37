// FAT12/16/32 filesystem formatter

use super::layout::{FatKind, FatParams, SECTOR_SIZE};
use super::FatError;
use crate::fs::fat_ops::filename::crc32;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

pub const VOLUME_LABEL: &[u8; 11] = b"NO NAME    ";
const OEM_NAME: &[u8; 8] = b"HYPERLDR";
const MEDIA_FIXED_DISK: u8 = 0xF8;
const SECTORS_PER_TRACK: u16 = 32;
const NUM_HEADS: u16 = 64;
const FSINFO_SECTOR: u16 = 1;
const BACKUP_BOOT_SECTOR: u16 = 6;
/// Zero-fill granularity in sectors
const CLEAR_CHUNK: u32 = 64;

/// INT 18h (boot failed, try next device) then halt forever
const BOOT_STUB: [u8; 5] = [0xCD, 0x18, 0xF4, 0xEB, 0xFD];

fn boot_sector(params: &FatParams, volume_id: u32) -> [u8; SECTOR_SIZE] {
    let mut bs = [0u8; SECTOR_SIZE];
    let code_offset = if params.kind == FatKind::Fat32 { 0x5A } else { 0x3E };

    bs[0] = 0xEB; // JMP short + NOP
    bs[1] = (code_offset - 2) as u8;
    bs[2] = 0x90;
    bs[3..11].copy_from_slice(OEM_NAME);
    bs[11..13].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
    bs[13] = params.sectors_per_cluster;
    bs[14..16].copy_from_slice(&params.reserved_sectors.to_le_bytes());
    bs[16] = params.num_fats;
    bs[17..19].copy_from_slice(&params.root_entries.to_le_bytes());

    // 16-bit total only when it fits and the volume is not FAT32
    let total16 = match u16::try_from(params.total_sectors) {
        Ok(n) if params.kind != FatKind::Fat32 => n,
        _ => 0,
    };
    bs[19..21].copy_from_slice(&total16.to_le_bytes());
    bs[21] = MEDIA_FIXED_DISK;
    if params.kind != FatKind::Fat32 {
        bs[22..24].copy_from_slice(&(params.fat_size as u16).to_le_bytes());
    }
    bs[24..26].copy_from_slice(&SECTORS_PER_TRACK.to_le_bytes());
    bs[26..28].copy_from_slice(&NUM_HEADS.to_le_bytes());
    bs[28..32].copy_from_slice(&params.hidden_sectors.to_le_bytes());
    if total16 == 0 {
        bs[32..36].copy_from_slice(&params.total_sectors.to_le_bytes());
    }

    let ext = if params.kind == FatKind::Fat32 {
        bs[36..40].copy_from_slice(&params.fat_size.to_le_bytes());
        // ext_flags and fs_version stay zero: mirrored FATs, revision 0.0
        bs[44..48].copy_from_slice(&params.root_cluster.to_le_bytes());
        bs[48..50].copy_from_slice(&FSINFO_SECTOR.to_le_bytes());
        bs[50..52].copy_from_slice(&BACKUP_BOOT_SECTOR.to_le_bytes());
        64
    } else {
        36
    };

    bs[ext] = 0x80; // Drive number
    bs[ext + 2] = 0x29; // Extended boot signature
    bs[ext + 3..ext + 7].copy_from_slice(&volume_id.to_le_bytes());
    bs[ext + 7..ext + 18].copy_from_slice(VOLUME_LABEL);
    bs[ext + 18..ext + 26].copy_from_slice(params.kind.fs_type_label());

    bs[code_offset..code_offset + BOOT_STUB.len()].copy_from_slice(&BOOT_STUB);
    bs[510] = 0x55;
    bs[511] = 0xAA;
    bs
}

fn fsinfo_sector() -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    sector[0..4].copy_from_slice(&0x4161_5252u32.to_le_bytes());
    sector[484..488].copy_from_slice(&0x6141_7272u32.to_le_bytes());
    // Free count and next free are left unknown; drivers recompute them
    sector[488..492].copy_from_slice(&u32::MAX.to_le_bytes());
    sector[492..496].copy_from_slice(&u32::MAX.to_le_bytes());
    sector[508..512].copy_from_slice(&0xAA55_0000u32.to_le_bytes());
    sector
}

/// Reserved FAT entries 0 and 1, plus the FAT32 root cluster
fn fat_head(kind: FatKind) -> Vec<u8> {
    match kind {
        FatKind::Fat12 => vec![MEDIA_FIXED_DISK, 0xFF, 0xFF],
        FatKind::Fat16 => vec![MEDIA_FIXED_DISK, 0xFF, 0xFF, 0xFF],
        FatKind::Fat32 => {
            let mut head = Vec::with_capacity(12);
            head.extend_from_slice(&(0x0FFF_FF00 | u32::from(MEDIA_FIXED_DISK)).to_le_bytes());
            head.extend_from_slice(&0x0FFF_FFFFu32.to_le_bytes());
            head.extend_from_slice(&kind.end_of_chain().to_le_bytes());
            head
        }
    }
}

fn clear_sectors<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    first: u32,
    count: u32,
) -> Result<(), FatError> {
    let zeros = vec![0u8; CLEAR_CHUNK as usize * SECTOR_SIZE];
    let mut done = 0;
    while done < count {
        let n = (count - done).min(CLEAR_CHUNK);
        block_io
            .write_blocks(
                Lba(partition_lba_start + u64::from(first + done)),
                &zeros[..n as usize * SECTOR_SIZE],
            )
            .map_err(FatError::io)?;
        done += n;
    }
    Ok(())
}

/// Format a partition as an empty FAT volume
///
/// The hidden sector count recorded in the boot sector is the partition
/// start, so the volume is only valid at that location on the disk.
pub fn format_fat<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
    partition_sectors: u64,
    kind: FatKind,
) -> Result<FatParams, FatError> {
    let params = FatParams::compute(kind, partition_sectors, partition_lba_start)?;

    let mut seed = Vec::with_capacity(16);
    seed.extend_from_slice(&partition_lba_start.to_le_bytes());
    seed.extend_from_slice(&partition_sectors.to_le_bytes());
    let volume_id = crc32(&seed);

    tracing::debug!(
        %kind,
        sectors = params.total_sectors,
        sectors_per_cluster = params.sectors_per_cluster,
        fat_size = params.fat_size,
        clusters = params.cluster_count(),
        "formatting FAT volume"
    );

    // Reserved area, both FATs and the fixed root directory start zeroed
    clear_sectors(block_io, partition_lba_start, 0, params.first_data_sector())?;

    let boot = boot_sector(&params, volume_id);
    block_io
        .write_blocks(Lba(partition_lba_start), &boot)
        .map_err(FatError::io)?;

    if kind == FatKind::Fat32 {
        let fsinfo = fsinfo_sector();
        for base in [0, u64::from(BACKUP_BOOT_SECTOR)] {
            if base != 0 {
                block_io
                    .write_blocks(Lba(partition_lba_start + base), &boot)
                    .map_err(FatError::io)?;
            }
            block_io
                .write_blocks(
                    Lba(partition_lba_start + base + u64::from(FSINFO_SECTOR)),
                    &fsinfo,
                )
                .map_err(FatError::io)?;
        }

        // Root directory cluster
        clear_sectors(
            block_io,
            partition_lba_start,
            params.cluster_to_sector(params.root_cluster),
            u32::from(params.sectors_per_cluster),
        )?;
    }

    let mut first_fat_sector = [0u8; SECTOR_SIZE];
    let head = fat_head(kind);
    first_fat_sector[..head.len()].copy_from_slice(&head);
    for copy in 0..params.num_fats {
        block_io
            .write_blocks(
                Lba(partition_lba_start + u64::from(params.fat_start(copy))),
                &first_fat_sector,
            )
            .map_err(FatError::io)?;
    }

    block_io.flush().map_err(FatError::io)?;
    Ok(params)
}
