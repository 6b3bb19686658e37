//! make-disk-image: build a bootable Hyper test image

mod logging;
mod options;

use anyhow::{Context, Result};
use clap::Parser;
use hyper_core::config::BootConfig;
use hyper_core::image::{
    assemble, AssembleOptions, ExternalToolkit, Installer, NativeToolkit, Toolkit,
};
use hyper_core::{BootArtifacts, BootCapabilities, FsRoot};
use options::{Options, ToolkitKind};

fn main() -> Result<()> {
    let options = Options::parse();
    logging::init(options.verbose);

    let paths = options.resolve_paths()?;
    let artifacts = BootArtifacts {
        uefi_loaders: paths.uefi_loaders.clone(),
        installer: paths.installer.clone(),
        iso_boot_record: paths.iso_boot_record.clone(),
    };
    let capabilities = BootCapabilities::detect(&artifacts, options.br_type, options.fs_type)
        .context("checking boot options")?;

    let root = FsRoot::in_dir(&paths.intermediate_dir)?;
    let kernels = root.add_kernels(&paths.kernel_dir)?;
    tracing::debug!(kernels, dir = %paths.kernel_dir.display(), "staged kernels");
    for loader in &artifacts.uefi_loaders {
        root.add_uefi_loader(loader)?;
    }
    if let Some(record) = &artifacts.iso_boot_record {
        root.add_iso_boot_record(record)?;
    }
    for (loader_path, host) in &options.module_files {
        root.add_file(loader_path, host)?;
    }

    let config = BootConfig::new(options.kernel_type, options.cmdline.as_str(), options.modules.clone());
    root.set_config(&config)?;

    let toolkit: Box<dyn Toolkit> = match options.toolkit {
        ToolkitKind::Native => Box::new(NativeToolkit),
        ToolkitKind::External => Box::new(ExternalToolkit::new()),
    };
    let assemble_options = AssembleOptions::new(root.path(), options.br_type, options.fs_type)
        .output(&options.out_path)
        .uefi(capabilities.uefi)
        .bios_cd(capabilities.bios_cd)
        .installer(artifacts.installer.clone().map(Installer::new))
        .install_policy(options.install_policy.into());
    let image = assemble(&assemble_options, toolkit.as_ref())
        .with_context(|| format!("building {}", options.out_path.display()))?;
    root.close()?;

    println!("Created an image at {}", image.path().display());
    println!("The image can be booted with:");
    for path in capabilities.summary(options.br_type, options.fs_type, image.installed()) {
        println!("- {path}");
    }
    Ok(())
}
