#![no_std]
#[cfg(feature = "std")]
extern crate std;
extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

/// "NVB1" - leading word of every dual-bank section.
pub const BANK_MAGIC: u32 = 0x4E56_4231;
pub const BANK_VERSION: u8 = 1;

/// SHA-256 trailer.
pub const CHECKSUM_SIZE: usize = 32;

/// magic(4) + version(1) + reserved(3) + generation(8) + count(4)
pub const BANK_HEADER_SIZE: usize = 20;

/// Logical contents of one scope. Ordered so that encoding is deterministic.
pub type EntryMap = BTreeMap<String, String>;

/// Commit counter. The valid bank with the larger value is authoritative.
pub type Generation = u64;

/// An isolated namespace backed by its own pair of sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    User,
    System,
}

impl Scope {
    pub fn name(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::System => "system",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the two redundant sections of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BankId {
    A,
    B,
}

impl BankId {
    pub fn other(self) -> Self {
        match self {
            BankId::A => BankId::B,
            BankId::B => BankId::A,
        }
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankId::A => f.write_str("A"),
            BankId::B => f.write_str("B"),
        }
    }
}

/// On-storage layout of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Two alternating checksummed banks.
    #[default]
    Dual,
    /// Single `key=value` text section, bank B unused.
    Legacy,
}

/// Rejects keys that would make `key=value` listings ambiguous.
pub fn validate_key(key: &str) -> NvResult<()> {
    if key.is_empty() || key.contains(['=', '\n', '\0']) {
        return Err(NvError::InvalidKey);
    }
    Ok(())
}

/// Values stay on one line so every `key=value` listing maps back to exactly
/// the entries that were set.
pub fn validate_value(value: &str) -> NvResult<()> {
    if value.contains(['\n', '\0']) {
        return Err(NvError::InvalidValue);
    }
    Ok(())
}

pub type NvResult<T> = Result<T, NvError>;

/// Why a section failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptKind {
    Truncated,
    BadMagic,
    UnsupportedVersion,
    ChecksumMismatch,
    BadLength,
    InvalidUtf8,
    DuplicateKey,
    TrailingBytes,
    MalformedLine,
}

/// no_std mirror of the I/O failures the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    NotFound,
    PermissionDenied,
    NoSpace,
    Interrupted,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Read,
    Write,
    Sync,
    Rename,
    Lock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NvError {
    /// `get` on a key the scope does not hold.
    NotFound { key: String },
    Corrupt(CorruptKind),
    Storage {
        op: StorageOp,
        section: String,
        kind: StorageKind,
    },
    LockContention { section: String },
    InvalidKey,
    InvalidValue,
    GenerationExhausted,
    /// Two configured sections share a location.
    SharedSection { section: String },
}

impl NvError {
    pub fn storage(op: StorageOp, section: &str, kind: StorageKind) -> Self {
        NvError::Storage { op, section: String::from(section), kind }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NvError::NotFound { .. })
    }
}

impl fmt::Display for CorruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CorruptKind::Truncated => "truncated",
            CorruptKind::BadMagic => "bad magic",
            CorruptKind::UnsupportedVersion => "unsupported version",
            CorruptKind::ChecksumMismatch => "checksum mismatch",
            CorruptKind::BadLength => "length field out of range",
            CorruptKind::InvalidUtf8 => "invalid utf-8",
            CorruptKind::DuplicateKey => "duplicate key",
            CorruptKind::TrailingBytes => "trailing bytes",
            CorruptKind::MalformedLine => "malformed line",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for NvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NvError::NotFound { key } => write!(f, "{}: not found", key),
            NvError::Corrupt(kind) => write!(f, "data corrupted: {}", kind),
            NvError::Storage { op, section, kind } => {
                write!(f, "{}: {:?} failed: {:?}", section, op, kind)
            }
            NvError::LockContention { section } => {
                write!(f, "{}: timed out waiting for write lock", section)
            }
            NvError::InvalidKey => f.write_str("invalid key"),
            NvError::InvalidValue => f.write_str("invalid value"),
            NvError::GenerationExhausted => f.write_str("generation counter exhausted"),
            NvError::SharedSection { section } => {
                write!(f, "{}: configured for more than one section", section)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NvError {}
