//! The closed set of boot entries

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    I686,
    Amd64,
    Aarch64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    Lower,
    Higher,
}

/// Requested paging depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paging {
    /// Whatever the loader picks for the architecture
    Default,
    /// 3-level PAE tables on i686
    Pae,
    /// 5-level tables
    FiveLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Exactly,
    Maximum,
}

impl Constraint {
    fn as_str(self) -> &'static str {
        match self {
            Constraint::Exactly => "exactly",
            Constraint::Maximum => "maximum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTable {
    pub levels: u8,
    pub constraint: Constraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoMode {
    Xrgb8888,
    /// Firmware graphics output is not reliable on the platform
    Unset,
}

/// Everything a rendered entry carries apart from command line and modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTemplate {
    pub binary: &'static str,
    pub setup_apm: bool,
    pub allocate_anywhere: bool,
    /// `binary:` block form even when only the path is set
    pub binary_block: bool,
    pub page_table: Option<PageTable>,
    pub video_mode: VideoMode,
    pub higher_half_exclusive: bool,
}

/// One (architecture, half, paging) combination the loader is tested with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    I686LowerHalf,
    I686LowerHalfPae,
    I686HigherHalf,
    I686HigherHalfPae,
    Amd64LowerHalf,
    Amd64LowerHalf5Lvl,
    Amd64HigherHalf,
    Amd64HigherHalf5Lvl,
    Aarch64LowerHalf,
    Aarch64HigherHalf,
    Aarch64LowerHalf5Lvl,
    Aarch64HigherHalf5Lvl,
}

const EXACTLY_3: Option<PageTable> = Some(PageTable {
    levels: 3,
    constraint: Constraint::Exactly,
});
const EXACTLY_5: Option<PageTable> = Some(PageTable {
    levels: 5,
    constraint: Constraint::Exactly,
});
// Not every emulator build supports 52-bit input addresses on aarch64
const MAXIMUM_5: Option<PageTable> = Some(PageTable {
    levels: 5,
    constraint: Constraint::Maximum,
});

impl EntryKind {
    /// Every entry, in document order
    pub const ALL: [EntryKind; 12] = [
        EntryKind::I686LowerHalf,
        EntryKind::I686LowerHalfPae,
        EntryKind::I686HigherHalf,
        EntryKind::I686HigherHalfPae,
        EntryKind::Amd64LowerHalf,
        EntryKind::Amd64LowerHalf5Lvl,
        EntryKind::Amd64HigherHalf,
        EntryKind::Amd64HigherHalf5Lvl,
        EntryKind::Aarch64LowerHalf,
        EntryKind::Aarch64HigherHalf,
        EntryKind::Aarch64LowerHalf5Lvl,
        EntryKind::Aarch64HigherHalf5Lvl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntryKind::I686LowerHalf => "i686_lower_half",
            EntryKind::I686LowerHalfPae => "i686_lower_half_pae",
            EntryKind::I686HigherHalf => "i686_higher_half",
            EntryKind::I686HigherHalfPae => "i686_higher_half_pae",
            EntryKind::Amd64LowerHalf => "amd64_lower_half",
            EntryKind::Amd64LowerHalf5Lvl => "amd64_lower_half_5lvl",
            EntryKind::Amd64HigherHalf => "amd64_higher_half",
            EntryKind::Amd64HigherHalf5Lvl => "amd64_higher_half_5lvl",
            EntryKind::Aarch64LowerHalf => "aarch64_lower_half",
            EntryKind::Aarch64HigherHalf => "aarch64_higher_half",
            EntryKind::Aarch64LowerHalf5Lvl => "aarch64_lower_half_5lvl",
            EntryKind::Aarch64HigherHalf5Lvl => "aarch64_higher_half_5lvl",
        }
    }

    pub fn arch(self) -> Arch {
        use EntryKind::*;
        match self {
            I686LowerHalf | I686LowerHalfPae | I686HigherHalf | I686HigherHalfPae => Arch::I686,
            Amd64LowerHalf | Amd64LowerHalf5Lvl | Amd64HigherHalf | Amd64HigherHalf5Lvl => Arch::Amd64,
            Aarch64LowerHalf | Aarch64HigherHalf | Aarch64LowerHalf5Lvl | Aarch64HigherHalf5Lvl => {
                Arch::Aarch64
            }
        }
    }

    pub fn half(self) -> Half {
        use EntryKind::*;
        match self {
            I686HigherHalf | I686HigherHalfPae | Amd64HigherHalf | Amd64HigherHalf5Lvl
            | Aarch64HigherHalf | Aarch64HigherHalf5Lvl => Half::Higher,
            _ => Half::Lower,
        }
    }

    pub fn paging(self) -> Paging {
        use EntryKind::*;
        match self {
            I686LowerHalfPae | I686HigherHalfPae => Paging::Pae,
            Amd64LowerHalf5Lvl | Amd64HigherHalf5Lvl | Aarch64LowerHalf5Lvl
            | Aarch64HigherHalf5Lvl => Paging::FiveLevel,
            _ => Paging::Default,
        }
    }

    /// The table row for this entry
    pub fn template(self) -> EntryTemplate {
        use EntryKind::*;
        let higher_half_exclusive = self.half() == Half::Higher;
        let (binary, setup_apm, allocate_anywhere, page_table) = match self {
            I686LowerHalf => ("/boot/kernel_i686_lower_half", true, false, None),
            I686LowerHalfPae => ("/boot/kernel_i686_lower_half", false, false, EXACTLY_3),
            I686HigherHalf => ("/boot/kernel_i686_higher_half", true, false, None),
            I686HigherHalfPae => ("/boot/kernel_i686_higher_half", false, false, EXACTLY_3),
            Amd64LowerHalf => ("/boot/kernel_amd64_lower_half", true, false, None),
            Amd64LowerHalf5Lvl => ("/boot/kernel_amd64_lower_half", false, false, EXACTLY_5),
            Amd64HigherHalf => ("/boot/kernel_amd64_higher_half", true, true, None),
            Amd64HigherHalf5Lvl => ("/boot/kernel_amd64_higher_half", true, true, EXACTLY_5),
            // One aarch64 kernel serves both halves
            Aarch64LowerHalf | Aarch64HigherHalf => ("/boot/kernel_aarch64_higher_half", false, true, None),
            Aarch64LowerHalf5Lvl | Aarch64HigherHalf5Lvl => {
                ("/boot/kernel_aarch64_higher_half", false, true, MAXIMUM_5)
            }
        };
        let video_mode = match self.arch() {
            Arch::Aarch64 => VideoMode::Unset,
            Arch::I686 | Arch::Amd64 => VideoMode::Xrgb8888,
        };

        EntryTemplate {
            binary,
            setup_apm,
            allocate_anywhere,
            binary_block: allocate_anywhere || self == I686HigherHalf,
            page_table,
            video_mode,
            higher_half_exclusive,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntryKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        EntryKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownEntry(s.to_string()))
    }
}

/// Render one entry section
pub(crate) fn render_entry(out: &mut String, kind: EntryKind, cmdline: &str, modules: &str) {
    let t = kind.template();

    out.push('[');
    out.push_str(kind.name());
    out.push_str("]\nprotocol=ultra\n");
    if t.setup_apm {
        out.push_str("setup-apm = true\n");
    }
    out.push('\n');

    out.push_str("cmdline = ");
    out.push_str(cmdline);
    out.push('\n');
    if t.binary_block {
        out.push_str("binary:\n    path = \"");
        out.push_str(t.binary);
        out.push_str("\"\n");
        if t.allocate_anywhere {
            out.push_str("    allocate-anywhere = true\n");
        }
    } else {
        out.push_str("binary = \"");
        out.push_str(t.binary);
        out.push_str("\"\n");
    }
    out.push('\n');

    if let Some(pt) = t.page_table {
        out.push_str("page-table:\n    levels = ");
        out.push_str(&pt.levels.to_string());
        out.push_str("\n    constraint = ");
        out.push_str(pt.constraint.as_str());
        out.push_str("\n\n");
    }

    // Entries without firmware graphics name the half before the video mode
    match t.video_mode {
        VideoMode::Xrgb8888 => {
            out.push_str("video-mode:\n    format = xrgb8888\n\n");
            if t.higher_half_exclusive {
                out.push_str("higher-half-exclusive = true\n\n");
            }
        }
        VideoMode::Unset => {
            if t.higher_half_exclusive {
                out.push_str("higher-half-exclusive = true\n\n");
            }
            out.push_str("video-mode = unset\n\n");
        }
    }

    out.push_str(modules);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in EntryKind::ALL {
            assert_eq!(kind.name().parse::<EntryKind>().unwrap(), kind);
        }
        assert_eq!(
            "amd64_middle_half".parse::<EntryKind>(),
            Err(ConfigError::UnknownEntry("amd64_middle_half".into()))
        );
    }

    #[test]
    fn test_table_rows() {
        let t = EntryKind::Amd64HigherHalf5Lvl.template();
        assert!(t.setup_apm && t.allocate_anywhere && t.higher_half_exclusive);
        assert_eq!(t.page_table, EXACTLY_5);

        let t = EntryKind::Aarch64LowerHalf5Lvl.template();
        assert_eq!(t.binary, "/boot/kernel_aarch64_higher_half");
        assert_eq!(t.video_mode, VideoMode::Unset);
        assert_eq!(t.page_table.map(|p| p.constraint), Some(Constraint::Maximum));
        assert!(!t.higher_half_exclusive);

        let t = EntryKind::I686LowerHalfPae.template();
        assert!(!t.setup_apm && !t.allocate_anywhere);
        assert_eq!(t.page_table.map(|p| p.levels), Some(3));
    }

    #[test]
    fn test_paging_and_half_partition_the_table() {
        let higher = EntryKind::ALL.iter().filter(|k| k.half() == Half::Higher).count();
        assert_eq!(higher, 6);
        let five = EntryKind::ALL.iter().filter(|k| k.paging() == Paging::FiveLevel).count();
        assert_eq!(five, 4);
        assert!(EntryKind::ALL
            .iter()
            .filter(|k| k.paging() == Paging::Pae)
            .all(|k| k.arch() == Arch::I686));
    }

    #[test]
    fn test_render_plain_binary() {
        let mut out = String::new();
        render_entry(&mut out, EntryKind::I686LowerHalf, "no-shutdown", "");
        assert_eq!(
            out,
            "[i686_lower_half]\nprotocol=ultra\nsetup-apm = true\n\n\
             cmdline = no-shutdown\nbinary = \"/boot/kernel_i686_lower_half\"\n\n\
             video-mode:\n    format = xrgb8888\n\n"
        );
    }

    #[test]
    fn test_render_path_only_block() {
        let mut out = String::new();
        render_entry(&mut out, EntryKind::I686HigherHalf, "no-shutdown", "");
        assert!(out.contains("binary:\n    path = \"/boot/kernel_i686_higher_half\"\n\nvideo-mode:"));
        assert!(!out.contains("allocate-anywhere"));
        assert!(out.ends_with("format = xrgb8888\n\nhigher-half-exclusive = true\n\n"));
    }

    #[test]
    fn test_render_aarch64_higher_half_order() {
        let mut out = String::new();
        render_entry(&mut out, EntryKind::Aarch64HigherHalf, "no-shutdown", "");
        assert_eq!(
            out,
            "[aarch64_higher_half]\nprotocol=ultra\n\n\
             cmdline = no-shutdown\nbinary:\n    path = \"/boot/kernel_aarch64_higher_half\"\n\
             \x20   allocate-anywhere = true\n\n\
             higher-half-exclusive = true\n\nvideo-mode = unset\n\n"
        );
    }
}
