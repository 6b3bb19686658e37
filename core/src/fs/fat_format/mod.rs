mod error;
mod format;
mod layout;
mod verify;

pub use error::FatError;
pub use format::{format_fat, VOLUME_LABEL};
pub use layout::{FatKind, FatParams, DIR_ENTRY_SIZE, SECTOR_SIZE};
pub use verify::verify_fat;
