//! Boot-time modules handed to the loader

use crate::error::ConfigError;
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Name the loader uses for the kernel alias module
pub const KERNEL_MODULE_NAME: &str = "__KERNEL__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// The kernel binary itself, exposed as a module
    KernelAlias,
    /// A memory region, zero-filled or preloaded from a file
    MemoryBlob,
    /// A file loaded as-is
    FileBlob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSize {
    /// Inferred from the underlying payload
    Auto,
    Bytes(u64),
}

impl fmt::Display for ModuleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSize::Auto => f.write_str("auto"),
            ModuleSize::Bytes(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for ModuleSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ModuleSize::Auto);
        }
        let n = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        n.map(ModuleSize::Bytes).map_err(|_| ())
    }
}

/// One module entry of a boot entry
///
/// Construction validates the shape of each kind, so a descriptor that
/// exists is always renderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    kind: ModuleKind,
    path: Option<String>,
    size: ModuleSize,
}

fn check_text(name: &str, field: &str, reason: &'static str) -> Result<(), ConfigError> {
    if field.is_empty() || field.contains(['"', '\n', '\r']) {
        return Err(ConfigError::InvalidModule {
            name: name.to_string(),
            reason,
        });
    }
    Ok(())
}

impl ModuleDescriptor {
    /// `kernel-as-module = true`
    pub fn kernel_alias() -> Self {
        Self {
            name: KERNEL_MODULE_NAME.to_string(),
            kind: ModuleKind::KernelAlias,
            path: None,
            size: ModuleSize::Auto,
        }
    }

    /// Zero-filled memory region of `size` bytes
    pub fn memory(name: &str, size: u64) -> Result<Self, ConfigError> {
        check_text(name, name, "name must be non-empty and unquoted")?;
        if size == 0 {
            return Err(ConfigError::InvalidModule {
                name: name.to_string(),
                reason: "a memory module without a path needs a non-zero size",
            });
        }
        Ok(Self {
            name: name.to_string(),
            kind: ModuleKind::MemoryBlob,
            path: None,
            size: ModuleSize::Bytes(size),
        })
    }

    /// Memory region preloaded from `path`
    pub fn memory_from(name: &str, path: &str, size: ModuleSize) -> Result<Self, ConfigError> {
        check_text(name, name, "name must be non-empty and unquoted")?;
        check_text(name, path, "path must be non-empty and unquoted")?;
        Ok(Self {
            name: name.to_string(),
            kind: ModuleKind::MemoryBlob,
            path: Some(path.to_string()),
            size,
        })
    }

    /// File module loaded from `path`
    pub fn file(name: &str, path: &str, size: ModuleSize) -> Result<Self, ConfigError> {
        check_text(name, name, "name must be non-empty and unquoted")?;
        check_text(name, path, "a file module needs a path")?;
        Ok(Self {
            name: name.to_string(),
            kind: ModuleKind::FileBlob,
            path: Some(path.to_string()),
            size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Loader path, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn size(&self) -> ModuleSize {
        self.size
    }

    pub(crate) fn render_into(&self, out: &mut String) {
        let kind = match self.kind {
            ModuleKind::KernelAlias => {
                out.push_str("kernel-as-module = true\n");
                return;
            }
            ModuleKind::MemoryBlob => "memory",
            ModuleKind::FileBlob => "file",
        };
        // Infallible: writing into a String
        let _ = write!(
            out,
            "module:\n    name = \"{}\"\n    type = \"{}\"\n    path = \"{}\"\n    size = {}\n",
            self.name,
            kind,
            self.path.as_deref().unwrap_or(""),
            self.size,
        );
    }
}

/// Textual form used on the command line
///
/// `kernel`, `file:NAME:PATH[:SIZE]`, `memory:NAME:SIZE` or
/// `memory:NAME:PATH[:SIZE]`. Sizes are decimal, `0x` hex or `auto`.
impl FromStr for ModuleDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::InvalidModuleSpec(s.to_string());
        if s == "kernel" {
            return Ok(Self::kernel_alias());
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["file", name, path] => Self::file(name, path, ModuleSize::Auto),
            ["file", name, path, size] => {
                Self::file(name, path, size.parse().map_err(|_| malformed())?)
            }
            ["memory", name, size_or_path] => match size_or_path.parse::<ModuleSize>() {
                Ok(ModuleSize::Bytes(size)) => Self::memory(name, size),
                Ok(ModuleSize::Auto) => Err(malformed()),
                Err(()) => Self::memory_from(name, size_or_path, ModuleSize::Auto),
            },
            ["memory", name, path, size] => {
                Self::memory_from(name, path, size.parse().map_err(|_| malformed())?)
            }
            _ => Err(malformed()),
        }
    }
}
