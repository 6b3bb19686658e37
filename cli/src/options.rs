//! Command-line options
//!
//! Paths left unset are guessed relative to the project root (the current
//! directory unless `HYPER_PROJECT_ROOT` says otherwise), following the
//! layout of a Hyper checkout.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hyper_core::config::{EntryKind, ModuleDescriptor};
use hyper_core::image::InstallPolicy;
use hyper_core::{BootRecordType, FilesystemType};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "make-disk-image")]
#[command(about = "Make a Hyper loader image", version)]
pub struct Options {
    /// File system of the image: ISO9660, FAT12, FAT16 or FAT32
    pub fs_type: FilesystemType,

    /// Path to the output image
    pub out_path: PathBuf,

    /// Boot record of the image: MBR (alias HDD), GPT or CD
    #[arg(long, default_value = "MBR")]
    pub br_type: BootRecordType,

    /// Entry selected by `default-entry`
    #[arg(long, default_value = "amd64_higher_half")]
    pub kernel_type: EntryKind,

    /// Kernel command line shared by every entry
    #[arg(long, default_value = "no-shutdown")]
    pub cmdline: String,

    /// Extra module: kernel, file:NAME:PATH[:SIZE] or memory:NAME:SIZE
    #[arg(long = "module")]
    pub modules: Vec<ModuleDescriptor>,

    /// Host file staged at a loader path, as LOADER_PATH=HOST_PATH
    #[arg(long = "module-file", value_parser = parse_staged_file)]
    pub module_files: Vec<(String, PathBuf)>,

    /// Directory with the kernel binaries
    #[arg(long, env = "HYPER_KERNEL_DIR")]
    pub kernel_dir: Option<PathBuf>,

    /// Directory for intermediate data
    #[arg(long, env = "HYPER_INTERMEDIATE_DIR")]
    pub intermediate_dir: Option<PathBuf>,

    /// Path to the hyper installer
    #[arg(long, env = "HYPER_INSTALL_PATH")]
    pub hyper_install_path: Option<PathBuf>,

    /// Path to a hyper UEFI binary (repeatable)
    #[arg(long)]
    pub hyper_uefi_path: Vec<PathBuf>,

    /// Path to the hyper ISO boot record
    #[arg(long, env = "HYPER_ISO_BR_PATH")]
    pub hyper_iso_br_path: Option<PathBuf>,

    /// Formatting backend
    #[arg(long, value_enum, default_value_t = ToolkitKind::Native)]
    pub toolkit: ToolkitKind,

    /// When to run the installer
    #[arg(long, value_enum, default_value_t = PolicyArg::Strict)]
    pub install_policy: PolicyArg,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ToolkitKind {
    /// Built-in MBR/GPT, FAT and ISO9660 writers
    Native,
    /// parted, mtools and xorriso from PATH
    External,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Skip ISO images without the BIOS CD boot record
    Strict,
    /// Install into every non-GPT image
    Always,
}

impl From<PolicyArg> for InstallPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => InstallPolicy::RequireIsoBootRecord,
            PolicyArg::Always => InstallPolicy::Always,
        }
    }
}

fn parse_staged_file(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((loader, host)) if loader.starts_with('/') && !host.is_empty() => {
            Ok((loader.to_string(), PathBuf::from(host)))
        }
        _ => Err(format!("expected /LOADER/PATH=HOST_PATH, got `{s}`")),
    }
}

/// Every path the build needs, after guessing
#[derive(Debug)]
pub struct ResolvedPaths {
    pub kernel_dir: PathBuf,
    pub intermediate_dir: PathBuf,
    pub installer: Option<PathBuf>,
    pub uefi_loaders: Vec<PathBuf>,
    pub iso_boot_record: Option<PathBuf>,
}

fn project_root() -> Result<PathBuf> {
    match std::env::var_os("HYPER_PROJECT_ROOT") {
        Some(root) => Ok(PathBuf::from(root)),
        None => std::env::current_dir().context("reading the current directory"),
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

#[cfg(unix)]
fn executable(path: PathBuf) -> Option<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(&path).ok()?.permissions().mode();
    (mode & 0o111 != 0).then_some(path)
}

#[cfg(not(unix))]
fn executable(path: PathBuf) -> Option<PathBuf> {
    existing(path)
}

fn guess_kernel_dir(root: &Path) -> Option<PathBuf> {
    let guess = root.join("tests/kernel/build");
    ["kernel_amd64_higher_half", "kernel_amd64_lower_half"]
        .iter()
        .all(|kernel| guess.join(kernel).exists())
        .then_some(guess)
}

impl Options {
    pub fn resolve_paths(&self) -> Result<ResolvedPaths> {
        let root = project_root()?;

        let kernel_dir = match &self.kernel_dir {
            Some(dir) => dir.clone(),
            None => match guess_kernel_dir(&root) {
                Some(dir) => dir,
                None => bail!("failed to guess --kernel-dir, please specify it manually"),
            },
        };
        let intermediate_dir = self
            .intermediate_dir
            .clone()
            .unwrap_or_else(|| root.join("tests/temp-data"));
        let installer = self
            .hyper_install_path
            .clone()
            .or_else(|| executable(root.join("installer/hyper_install")));
        let uefi_loaders = if self.hyper_uefi_path.is_empty() {
            existing(root.join("build_uefi/loader/BOOTX64.EFI"))
                .into_iter()
                .collect()
        } else {
            self.hyper_uefi_path.clone()
        };
        let iso_boot_record = self
            .hyper_iso_br_path
            .clone()
            .or_else(|| existing(root.join("build_bios/loader/hyper_iso_boot")));

        Ok(ResolvedPaths {
            kernel_dir,
            intermediate_dir,
            installer,
            uefi_loaders,
            iso_boot_record,
        })
    }
}
