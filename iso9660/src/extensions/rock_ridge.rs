//! Rock Ridge extension support
//!
//! Rock Ridge stores POSIX names in the System Use area of directory
//! records. Only the pieces a boot medium needs are handled here: the SUSP
//! `SP` indicator and `ER` reference in the root `.` record, and `NM`
//! alternate names on every other record. Names that do not fit in the
//! record spill into a `CE` continuation area.

use crate::utils::sector::{get_both_u32, put_both_u32};
use alloc::string::String;
use alloc::vec::Vec;

/// Signature constants
pub mod signatures {
    /// SUSP indicator signature
    pub const SHARING_PROTOCOL: &[u8; 2] = b"SP";
    /// Extensions reference signature
    pub const EXTENSIONS_REFERENCE: &[u8; 2] = b"ER";
    /// Continuation area signature
    pub const CONTINUATION: &[u8; 2] = b"CE";
    /// SUSP terminator signature
    pub const TERMINATOR: &[u8; 2] = b"ST";
    /// Alternate name signature
    pub const ALTERNATE_NAME: &[u8; 2] = b"NM";
}

/// Rock Ridge extension identifier announced in the `ER` entry
pub const EXTENSION_ID: &[u8] = b"RRIP_1991A";

const EXTENSION_DESCRIPTOR: &[u8] = b"ROCK RIDGE INTERCHANGE PROTOCOL";
const EXTENSION_SOURCE: &[u8] = b"SEE IEEE P1282";

/// `NM` flag: name continues in the next `NM` entry
const NM_CONTINUE: u8 = 0x01;

/// Longest name a single `NM` entry carries
pub const MAX_NM_NAME: usize = 250;

/// Alternate names are cut to this many bytes
pub const MAX_ALTERNATE_NAME: usize = 255;

/// Encoded size of a `CE` entry
pub const CONTINUATION_ENTRY_LEN: usize = 28;

const NM_HEADER_LEN: usize = 5;

/// `SP` entry: check bytes 0xBE 0xEF, no bytes skipped
pub fn sharing_protocol_entry() -> [u8; 7] {
    [b'S', b'P', 7, 1, 0xBE, 0xEF, 0]
}

/// `ER` entry announcing RRIP
pub fn extensions_reference_entry() -> Vec<u8> {
    let len = 8 + EXTENSION_ID.len() + EXTENSION_DESCRIPTOR.len() + EXTENSION_SOURCE.len();
    let mut entry = Vec::with_capacity(len);
    entry.extend_from_slice(signatures::EXTENSIONS_REFERENCE);
    entry.push(len as u8);
    entry.push(1);
    entry.push(EXTENSION_ID.len() as u8);
    entry.push(EXTENSION_DESCRIPTOR.len() as u8);
    entry.push(EXTENSION_SOURCE.len() as u8);
    entry.push(1);
    entry.extend_from_slice(EXTENSION_ID);
    entry.extend_from_slice(EXTENSION_DESCRIPTOR);
    entry.extend_from_slice(EXTENSION_SOURCE);
    entry
}

fn push_nm_entry(out: &mut Vec<u8>, bytes: &[u8], continues: bool) {
    out.extend_from_slice(signatures::ALTERNATE_NAME);
    out.push((NM_HEADER_LEN + bytes.len()) as u8);
    out.push(1);
    out.push(if continues { NM_CONTINUE } else { 0 });
    out.extend_from_slice(bytes);
}

/// `NM` entries for `name` split between a record and a continuation area
///
/// `capacity` is the System Use space left in the record. When the name
/// does not fit, the inline part ends where a `CE` entry still fits and the
/// rest is returned as continuation area contents.
pub fn split_alternate_name(name: &str, capacity: usize) -> (Vec<u8>, Option<Vec<u8>>) {
    let bytes = &name.as_bytes()[..name.len().min(MAX_ALTERNATE_NAME)];
    let mut inline = Vec::new();
    if bytes.len() <= MAX_NM_NAME && NM_HEADER_LEN + bytes.len() <= capacity {
        push_nm_entry(&mut inline, bytes, false);
        return (inline, None);
    }

    let head = capacity
        .saturating_sub(CONTINUATION_ENTRY_LEN + NM_HEADER_LEN)
        .min(MAX_NM_NAME)
        .min(bytes.len());
    if head > 0 {
        push_nm_entry(&mut inline, &bytes[..head], true);
    }
    let mut area = Vec::new();
    let mut rest = &bytes[head..];
    while !rest.is_empty() {
        let (piece, tail) = rest.split_at(rest.len().min(MAX_NM_NAME));
        push_nm_entry(&mut area, piece, !tail.is_empty());
        rest = tail;
    }
    (inline, Some(area))
}

/// Where a `CE` entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationArea {
    /// Sector holding the area
    pub lba: u32,
    /// Byte offset into that sector
    pub offset: u32,
    /// Area length in bytes
    pub length: u32,
}

/// `CE` entry pointing at `area`
pub fn continuation_entry(area: ContinuationArea) -> [u8; CONTINUATION_ENTRY_LEN] {
    let mut entry = [0u8; CONTINUATION_ENTRY_LEN];
    entry[0..2].copy_from_slice(signatures::CONTINUATION);
    entry[2] = CONTINUATION_ENTRY_LEN as u8;
    entry[3] = 1;
    put_both_u32(&mut entry[4..12], area.lba);
    put_both_u32(&mut entry[12..20], area.offset);
    put_both_u32(&mut entry[20..28], area.length);
    entry
}

/// First `CE` entry of a System Use area
pub fn continuation_area(system_use: &[u8]) -> Option<ContinuationArea> {
    SystemUseEntries::new(system_use, 0)
        .find(|(signature, payload)| signature == signatures::CONTINUATION && payload.len() >= 24)
        .map(|(_, payload)| ContinuationArea {
            lba: get_both_u32(&payload[0..8]),
            offset: get_both_u32(&payload[8..16]),
            length: get_both_u32(&payload[16..24]),
        })
}

/// Iterator over the SUSP entries of a System Use area
pub struct SystemUseEntries<'a> {
    data: &'a [u8],
}

impl<'a> SystemUseEntries<'a> {
    /// Walk the entries of `data`, skipping `skip` leading bytes (the `SP` skip length)
    pub fn new(data: &'a [u8], skip: usize) -> Self {
        Self { data: data.get(skip..).unwrap_or(&[]) }
    }
}

impl<'a> Iterator for SystemUseEntries<'a> {
    /// `(signature, payload after the 4-byte header)`
    type Item = ([u8; 2], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 4 {
            return None;
        }
        let len = self.data[2] as usize;
        if len < 4 || len > self.data.len() {
            return None;
        }
        let signature = [self.data[0], self.data[1]];
        if &signature == signatures::TERMINATOR {
            return None;
        }
        let payload = &self.data[4..len];
        self.data = &self.data[len..];
        Some((signature, payload))
    }
}

/// Does a root `.` record carry the SUSP `SP` indicator?
pub fn has_sharing_protocol(system_use: &[u8]) -> bool {
    system_use.len() >= 7
        && &system_use[0..2] == signatures::SHARING_PROTOCOL
        && system_use[4] == 0xBE
        && system_use[5] == 0xEF
}

/// Collect the Rock Ridge alternate name from a System Use area
///
/// `continuation` holds the bytes of the area its `CE` entry points at, or
/// is empty when there is none.
pub fn alternate_name(system_use: &[u8], continuation: &[u8]) -> Option<String> {
    let mut name = Vec::new();
    let mut found = false;
    let entries = SystemUseEntries::new(system_use, 0).chain(SystemUseEntries::new(continuation, 0));
    for (signature, payload) in entries {
        if &signature != signatures::ALTERNATE_NAME || payload.is_empty() {
            continue;
        }
        found = true;
        name.extend_from_slice(&payload[1..]);
        if payload[0] & NM_CONTINUE == 0 {
            break;
        }
    }
    if !found {
        return None;
    }
    Some(String::from_utf8_lossy(&name).into_owned())
}
