//! Single-section text layout: one `key=value` per line, no integrity data.

use alloc::string::String;
use alloc::vec::Vec;
use nv_core::{CorruptKind, EntryMap, NvError, NvResult};

fn malformed() -> NvError {
    NvError::Corrupt(CorruptKind::MalformedLine)
}

/// Parses a legacy section. Leading blanks and empty lines are skipped; a line
/// without `=`, with an empty key or with an empty value rejects the section.
/// Repeated keys keep the last value.
pub fn parse(buf: &[u8]) -> NvResult<EntryMap> {
    let text = core::str::from_utf8(buf).map_err(|_| NvError::Corrupt(CorruptKind::InvalidUtf8))?;
    let mut entries = EntryMap::new();

    for line in text.split('\n') {
        let line = line.trim_start_matches([' ', '\t']);
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(malformed)?;
        if key.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        entries.insert(String::from(key), String::from(value));
    }
    Ok(entries)
}

/// The parser skips leading blanks, so a key starting with one would not
/// read back (and a blank-only key would reject the whole section).
pub fn validate_key(key: &str) -> NvResult<()> {
    if key.starts_with([' ', '\t']) {
        return Err(NvError::InvalidKey);
    }
    Ok(())
}

/// Values must be representable on a single non-empty line.
pub fn validate_value(value: &str) -> NvResult<()> {
    if value.is_empty() || value.contains('\n') {
        return Err(NvError::InvalidValue);
    }
    Ok(())
}

pub fn serialize(entries: &EntryMap) -> Vec<u8> {
    let mut buf = Vec::new();
    for (key, value) in entries {
        buf.extend_from_slice(key.as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(value.as_bytes());
        buf.push(b'\n');
    }
    buf
}
