// Filesystem operations

pub mod fat_format;
pub mod fat_ops;
pub mod tree;

pub use fat_format::{format_fat, verify_fat, FatError, FatKind, FatParams};
pub use fat_ops::{
    create_directory, file_exists, list_directory, read_file, write_file, FatEntry, FatVolume,
};
pub use tree::copy_tree_in;
