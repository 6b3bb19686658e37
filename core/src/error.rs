//! Error types shared by the image pipeline
//!
//! [`ConfigError`] is raised before any I/O happens. Everything that touches
//! the filesystem, a block device or a child process surfaces as an
//! [`ImageError`]; [`assemble`](crate::image::assemble) wraps those in an
//! [`AssembleError`] naming the step that failed.

use crate::disk::{FilesystemType, PartitionError};
use crate::fs::FatError;
use iso9660::Iso9660Error;
use std::fmt;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Invalid request, detected before touching any file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown boot record type `{0}` (expected CD, MBR, HDD or GPT)")]
    UnknownBootRecord(String),

    #[error("unknown filesystem type `{0}` (expected FAT12, FAT16, FAT32 or ISO9660)")]
    UnknownFilesystem(String),

    #[error("unknown boot entry `{0}`")]
    UnknownEntry(String),

    #[error("a CD image must use ISO9660, not {0}")]
    CdRequiresIso9660(FilesystemType),

    #[error("module `{name}`: {reason}")]
    InvalidModule { name: String, reason: &'static str },

    #[error("malformed module `{0}` (expected kernel, file:NAME:PATH[:SIZE] or memory:NAME:SIZE)")]
    InvalidModuleSpec(String),

    #[error("installing into GPT images is not supported")]
    InstallerOnGpt,

    #[error("no viable boot option: provide a UEFI loader, an installer or an ISO boot record")]
    NoBootOption,

    #[error("{component} boot requested but `{path}` is missing from the tree")]
    MissingBootComponent {
        component: &'static str,
        path: &'static str,
    },
}

/// Failure while producing or mutating image bytes
#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("`{tool}` exited with {status}{}", format_output(.output))]
    Collaborator {
        tool: String,
        status: ExitStatus,
        output: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("FAT: {0}")]
    Fat(#[from] FatError),

    #[error("ISO9660: {0}")]
    Iso(#[from] Iso9660Error),

    #[error("partitioning: {0}")]
    Partition(#[from] PartitionError),
}

fn format_output(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        String::new()
    } else {
        format!("\n{output}")
    }
}

impl ImageError {
    /// `map_err` adapter attaching `context` to an I/O error
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| ImageError::Io { context, source }
    }
}

/// Pipeline step of [`assemble`](crate::image::assemble)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Plan,
    Size,
    Partition,
    Populate,
    Install,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Plan => "plan",
            Step::Size => "size",
            Step::Partition => "partition",
            Step::Populate => "populate",
            Step::Install => "install",
        })
    }
}

/// An assembly that stopped at `step`
#[derive(Debug, Error)]
#[error("image assembly failed at the {step} step")]
pub struct AssembleError {
    pub step: Step,
    #[source]
    pub source: ImageError,
}

impl AssembleError {
    pub fn new(step: Step, source: impl Into<ImageError>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }
}

pub type Result<T, E = ImageError> = std::result::Result<T, E>;
