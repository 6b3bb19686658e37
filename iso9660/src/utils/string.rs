//! Identifier and fixed-width text fields

use alloc::string::String;

/// Longest level 2 file identifier, excluding the `;1` version suffix
pub const MAX_FILE_IDENTIFIER: usize = 30;

/// Longest level 2 directory identifier
pub const MAX_DIRECTORY_IDENTIFIER: usize = 31;

/// Drop the space padding of a fixed-width field
pub fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Identifier bytes as text, padding removed
pub fn dchars_to_str(bytes: &[u8]) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(trim_trailing_spaces(bytes))
}

/// Is `c` a d-character (A-Z, 0-9, _)?
pub fn is_d_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_'
}

/// Copy `text` into a fixed-width field, padding with spaces
///
/// Lowercase letters are upper-cased and characters outside the
/// a-character set are replaced by `_`.
pub fn write_padded(dst: &mut [u8], text: &str) {
    dst.fill(b' ');
    for (slot, byte) in dst.iter_mut().zip(text.bytes()) {
        let upper = byte.to_ascii_uppercase();
        *slot = if upper.is_ascii_graphic() || upper == b' ' { upper } else { b'_' };
    }
}

fn to_d_chars(part: &str) -> String {
    part.bytes()
        .map(|b| {
            let upper = b.to_ascii_uppercase();
            if is_d_char(upper) { upper as char } else { '_' }
        })
        .collect()
}

/// Map an arbitrary name to a level 2 identifier
///
/// Files become `BASE.EXT;1` (or `BASE.;1`), directories a bare name.
/// Names are upper-cased, non d-characters become `_`, and the result is
/// truncated to the level 2 limits. The original name is kept by Rock Ridge.
pub fn level2_identifier(name: &str, directory: bool) -> String {
    if directory {
        let mut id = to_d_chars(name);
        id.truncate(MAX_DIRECTORY_IDENTIFIER);
        if id.is_empty() {
            id.push('_');
        }
        return id;
    }

    let (base, ext) = match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (to_d_chars(base), to_d_chars(ext)),
        _ => (to_d_chars(name), String::new()),
    };
    let mut ext = ext;
    ext.truncate(MAX_FILE_IDENTIFIER - 2);
    let mut base = base;
    base.truncate(MAX_FILE_IDENTIFIER - 1 - ext.len());
    if base.is_empty() && ext.is_empty() {
        base.push('_');
    }

    let mut id = base;
    id.push('.');
    id.push_str(&ext);
    id.push_str(";1");
    id
}

/// `FILE.TXT;1` to `FILE.TXT`, and `FILE.;1` to `FILE`
pub fn strip_version(name: &str) -> &str {
    let base = name.split_once(';').map_or(name, |(base, _)| base);
    base.strip_suffix('.').unwrap_or(base)
}
