//! Boot configuration generator
//!
//! Renders `hyper.cfg`: a `default-entry` line followed by one section per
//! [`EntryKind`], each carrying the shared command line and module list.
//!
//! ```text
//! default-entry = amd64_higher_half
//!
//! [amd64_higher_half]
//! protocol=ultra
//! setup-apm = true
//!
//! cmdline = no-shutdown
//! binary:
//!     path = "/boot/kernel_amd64_higher_half"
//!     allocate-anywhere = true
//!
//! video-mode:
//!     format = xrgb8888
//!
//! higher-half-exclusive = true
//!
//! kernel-as-module = true
//! ```

mod entry;
mod module;

pub use entry::{Arch, Constraint, EntryKind, EntryTemplate, Half, PageTable, Paging, VideoMode};
pub use module::{ModuleDescriptor, ModuleKind, ModuleSize, KERNEL_MODULE_NAME};

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// File name of the configuration at the filesystem root
pub const CONFIG_FILE_NAME: &str = "hyper.cfg";

/// A complete configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    default_entry: EntryKind,
    cmdline: String,
    modules: Vec<ModuleDescriptor>,
}

impl BootConfig {
    pub fn new(default_entry: EntryKind, cmdline: impl Into<String>, modules: Vec<ModuleDescriptor>) -> Self {
        Self {
            default_entry,
            cmdline: cmdline.into(),
            modules,
        }
    }

    pub fn default_entry(&self) -> EntryKind {
        self.default_entry
    }

    pub fn cmdline(&self) -> &str {
        &self.cmdline
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    /// Deterministic document text
    pub fn render(&self) -> String {
        render(self.default_entry, &self.cmdline, &self.modules)
    }

    /// Every kernel binary some entry points at
    pub fn binary_paths(&self) -> BTreeSet<&'static str> {
        EntryKind::ALL.iter().map(|k| k.template().binary).collect()
    }

    /// Referenced binaries absent from the tree rooted at `root`
    pub fn missing_binaries(&self, root: &Path) -> Vec<&'static str> {
        self.binary_paths()
            .into_iter()
            .filter(|binary| !root.join(binary.trim_start_matches('/')).is_file())
            .collect()
    }
}

impl fmt::Display for BootConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote `value` when the parser would otherwise split or drop it
fn config_value(value: &str) -> String {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '#' || c == '\\');
    if plain {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Render the whole configuration document
pub fn render(default_entry: EntryKind, cmdline: &str, modules: &[ModuleDescriptor]) -> String {
    let mut module_text = String::new();
    for module in modules {
        module.render_into(&mut module_text);
        module_text.push('\n');
    }
    let cmdline = config_value(cmdline);

    let mut out = format!("default-entry = {}\n\n", default_entry.name());
    for kind in EntryKind::ALL {
        entry::render_entry(&mut out, kind, &cmdline, &module_text);
    }
    out
}
