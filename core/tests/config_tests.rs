//! Properties of the rendered hyper.cfg

use hyper_core::config::{render, EntryKind, ModuleDescriptor, ModuleSize};

fn sections(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("\n[") {
        let body = &rest[start + 2..];
        let name_end = body.find("]\n").unwrap();
        let name = &body[..name_end];
        let next = body.find("\n[").unwrap_or(body.len());
        out.push((name, &body[name_end + 2..next]));
        rest = &body[next..];
    }
    out
}

#[test]
fn test_render_is_deterministic() {
    let modules = vec![
        ModuleDescriptor::kernel_alias(),
        ModuleDescriptor::memory("memory0", 12288).unwrap(),
    ];
    let first = render(EntryKind::I686HigherHalfPae, "a b", &modules);
    let second = render(EntryKind::I686HigherHalfPae, "a b", &modules);
    assert_eq!(first, second);
}

#[test]
fn test_every_entry_is_complete() {
    let text = render(EntryKind::Amd64HigherHalf, "no-shutdown", &[]);
    let sections = sections(&text);
    assert_eq!(sections.len(), EntryKind::ALL.len());

    for ((name, body), kind) in sections.iter().zip(EntryKind::ALL) {
        assert_eq!(*name, kind.name());
        assert!(body.starts_with("protocol=ultra\n"), "{name}");
        assert!(body.contains("cmdline = no-shutdown\n"), "{name}");
        assert!(
            body.contains("binary = \"/boot/") || body.contains("binary:\n    path = \"/boot/"),
            "{name}"
        );
    }
}

#[test]
fn test_default_entry_line() {
    let text = render(EntryKind::Aarch64HigherHalf5Lvl, "x", &[]);
    assert!(text.starts_with("default-entry = aarch64_higher_half_5lvl\n"));
}

#[test]
fn test_modules_in_every_entry() {
    let modules = vec![
        ModuleDescriptor::kernel_alias(),
        ModuleDescriptor::memory("memory0", 12288).unwrap(),
        ModuleDescriptor::file("initrd", "/boot/initrd", ModuleSize::Auto).unwrap(),
    ];
    let text = render(EntryKind::Amd64HigherHalf, "no-shutdown", &modules);
    assert_eq!(text.matches("kernel-as-module = true\n").count(), 12);
    assert_eq!(
        text.matches(
            "module:\n    name = \"memory0\"\n    type = \"memory\"\n    path = \"\"\n    size = 12288\n"
        )
        .count(),
        12
    );
    assert_eq!(text.matches("    size = auto\n").count(), 12);
}

#[test]
fn test_aarch64_video_unset() {
    let text = render(EntryKind::Aarch64LowerHalf, "x", &[]);
    for (name, body) in sections(&text) {
        let unset = body.contains("video-mode = unset\n");
        assert_eq!(unset, name.starts_with("aarch64"), "{name}");
    }
}

#[test]
fn test_module_textual_form() {
    let module: ModuleDescriptor = "memory:scratch:0x3000".parse().unwrap();
    assert_eq!(module.size(), ModuleSize::Bytes(0x3000));
    assert!("file:initrd".parse::<ModuleDescriptor>().is_err());
    assert!("memory:zero:0".parse::<ModuleDescriptor>().is_err());
}
