use alloc::string::String;
use alloc::vec::Vec;
use nv_core::{
    CorruptKind, EntryMap, Generation, NvError, NvResult, BANK_HEADER_SIZE, BANK_MAGIC,
    BANK_VERSION, CHECKSUM_SIZE,
};
use sha2::{Digest, Sha256};

/// Decoded contents of one bank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BankImage {
    pub generation: Generation,
    pub entries: EntryMap,
}

pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn corrupt(kind: CorruptKind) -> NvError {
    NvError::Corrupt(kind)
}

fn put_len(buf: &mut Vec<u8>, len: usize) -> NvResult<()> {
    let len = u32::try_from(len).map_err(|_| NvError::InvalidValue)?;
    buf.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

/// Serializes a full bank. BTreeMap iteration keeps the output deterministic.
pub fn encode(generation: Generation, entries: &EntryMap) -> NvResult<Vec<u8>> {
    let payload: usize = entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut buf = Vec::with_capacity(BANK_HEADER_SIZE + payload + CHECKSUM_SIZE);

    // 1. Header
    buf.extend_from_slice(&BANK_MAGIC.to_be_bytes());
    buf.push(BANK_VERSION);
    buf.extend_from_slice(&[0u8; 3]);
    buf.extend_from_slice(&generation.to_be_bytes());
    put_len(&mut buf, entries.len())?;

    // 2. Entries
    for (key, value) in entries {
        put_len(&mut buf, key.len())?;
        buf.extend_from_slice(key.as_bytes());
        put_len(&mut buf, value.len())?;
        buf.extend_from_slice(value.as_bytes());
    }

    // 3. Trailer covers everything above
    let sum = checksum(&buf);
    buf.extend_from_slice(&sum);
    Ok(buf)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> NvResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(corrupt(CorruptKind::BadLength))?;
        if end > self.buf.len() {
            return Err(corrupt(CorruptKind::BadLength));
        }
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u32(&mut self) -> NvResult<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn string(&mut self) -> NvResult<String> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        let s = core::str::from_utf8(raw).map_err(|_| corrupt(CorruptKind::InvalidUtf8))?;
        Ok(String::from(s))
    }
}

/// Parses and verifies a bank. Any damage invalidates the whole bank.
pub fn decode(buf: &[u8]) -> NvResult<BankImage> {
    if buf.len() < BANK_HEADER_SIZE + CHECKSUM_SIZE {
        return Err(corrupt(CorruptKind::Truncated));
    }
    let (body, trailer) = buf.split_at(buf.len() - CHECKSUM_SIZE);

    let magic = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
    if magic != BANK_MAGIC {
        return Err(corrupt(CorruptKind::BadMagic));
    }
    if body[4] != BANK_VERSION {
        return Err(corrupt(CorruptKind::UnsupportedVersion));
    }
    if checksum(body) != trailer {
        return Err(corrupt(CorruptKind::ChecksumMismatch));
    }

    let mut gen_bytes = [0u8; 8];
    gen_bytes.copy_from_slice(&body[8..16]);
    let generation = u64::from_be_bytes(gen_bytes);

    let mut reader = Reader { buf: body, pos: 16 };
    let count = reader.u32()?;
    let mut entries = EntryMap::new();
    for _ in 0..count {
        let key = reader.string()?;
        let value = reader.string()?;
        if entries.insert(key, value).is_some() {
            return Err(corrupt(CorruptKind::DuplicateKey));
        }
    }
    if reader.pos != body.len() {
        return Err(corrupt(CorruptKind::TrailingBytes));
    }

    Ok(BankImage { generation, entries })
}
