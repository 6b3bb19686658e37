// FAT volume sanity checks

use super::layout::{FatKind, FatParams, SECTOR_SIZE};
use super::FatError;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

/// Check that a formatted volume is consistent and return its parameters
pub fn verify_fat<B: BlockIo>(
    block_io: &mut B,
    partition_lba_start: u64,
) -> Result<FatParams, FatError> {
    let mut boot = [0u8; SECTOR_SIZE];
    block_io
        .read_blocks(Lba(partition_lba_start), &mut boot)
        .map_err(FatError::io)?;
    let params = FatParams::parse(&boot)?;

    if u64::from(params.hidden_sectors) != partition_lba_start {
        return Err(FatError::InvalidBootSector("hidden sectors do not match the partition start"));
    }

    // Every FAT copy starts with the media descriptor
    let mut fat = [0u8; SECTOR_SIZE];
    for copy in 0..params.num_fats {
        block_io
            .read_blocks(
                Lba(partition_lba_start + u64::from(params.fat_start(copy))),
                &mut fat,
            )
            .map_err(FatError::io)?;
        if fat[0] != boot[21] {
            return Err(FatError::InvalidBootSector("FAT media byte mismatch"));
        }
    }

    if params.kind == FatKind::Fat32 {
        if params.root_cluster < 2 || params.root_cluster > params.max_cluster() {
            return Err(FatError::InvalidBootSector("root cluster out of range"));
        }

        let fsinfo_sector = u16::from_le_bytes([boot[48], boot[49]]);
        let mut fsinfo = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(
                Lba(partition_lba_start + u64::from(fsinfo_sector)),
                &mut fsinfo,
            )
            .map_err(FatError::io)?;
        if fsinfo[0..4] != 0x4161_5252u32.to_le_bytes()
            || fsinfo[484..488] != 0x6141_7272u32.to_le_bytes()
        {
            return Err(FatError::InvalidBootSector("bad FSInfo signatures"));
        }
    }

    Ok(params)
}
