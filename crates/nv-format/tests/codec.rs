use nv_core::{CorruptKind, EntryMap, NvError, BANK_HEADER_SIZE, CHECKSUM_SIZE};
use nv_format::bank::checksum;
use nv_format::{decode, encode, BankImage};

fn sample() -> EntryMap {
    let mut entries = EntryMap::new();
    entries.insert("SYS_BOOT_PART".into(), "rootfs1".into());
    entries.insert("empty".into(), String::new());
    entries.insert("unicode".into(), "vål=ue".into());
    entries
}

fn corrupt_kind(buf: &[u8]) -> CorruptKind {
    match decode(buf) {
        Err(NvError::Corrupt(kind)) => kind,
        other => panic!("expected corruption, got {:?}", other),
    }
}

#[test]
fn test_roundtrip() {
    let entries = sample();
    let buf = encode(42, &entries).unwrap();
    let image = decode(&buf).unwrap();
    assert_eq!(image, BankImage { generation: 42, entries });
}

#[test]
fn test_empty_bank() {
    let buf = encode(1, &EntryMap::new()).unwrap();
    assert_eq!(buf.len(), BANK_HEADER_SIZE + CHECKSUM_SIZE);
    let image = decode(&buf).unwrap();
    assert_eq!(image.generation, 1);
    assert!(image.entries.is_empty());
}

#[test]
fn test_deterministic() {
    // Same set, different insertion order
    let mut reversed = EntryMap::new();
    for (k, v) in sample().into_iter().rev() {
        reversed.insert(k, v);
    }
    assert_eq!(encode(7, &sample()).unwrap(), encode(7, &reversed).unwrap());
}

#[test]
fn test_every_bit_flip_detected() {
    let buf = encode(3, &sample()).unwrap();
    for i in 0..buf.len() {
        let mut damaged = buf.clone();
        damaged[i] ^= 0x01;
        assert!(decode(&damaged).is_err(), "flip at byte {} went unnoticed", i);
    }
}

#[test]
fn test_truncation_detected() {
    let buf = encode(3, &sample()).unwrap();
    for len in 0..buf.len() {
        assert!(decode(&buf[..len]).is_err(), "truncation to {} accepted", len);
    }
    assert_eq!(corrupt_kind(&buf[..10]), CorruptKind::Truncated);
}

#[test]
fn test_header_checks() {
    let mut buf = encode(3, &sample()).unwrap();
    buf[0] = b'X';
    assert_eq!(corrupt_kind(&buf), CorruptKind::BadMagic);

    let mut buf = encode(3, &sample()).unwrap();
    buf[4] = 9;
    assert_eq!(corrupt_kind(&buf), CorruptKind::UnsupportedVersion);

    let mut buf = encode(3, &sample()).unwrap();
    buf[12] ^= 0xFF; // generation byte
    assert_eq!(corrupt_kind(&buf), CorruptKind::ChecksumMismatch);
}

/// Builds a bank whose checksum is valid but whose framing is not.
fn reseal(mut body: Vec<u8>) -> Vec<u8> {
    let sum = checksum(&body);
    body.extend_from_slice(&sum);
    body
}

fn header(count: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&nv_core::BANK_MAGIC.to_be_bytes());
    body.push(nv_core::BANK_VERSION);
    body.extend_from_slice(&[0; 3]);
    body.extend_from_slice(&1u64.to_be_bytes());
    body.extend_from_slice(&count.to_be_bytes());
    body
}

fn push_str(body: &mut Vec<u8>, s: &[u8]) {
    body.extend_from_slice(&(s.len() as u32).to_be_bytes());
    body.extend_from_slice(s);
}

#[test]
fn test_framing_checks_behind_valid_checksum() {
    // Count claims more entries than present
    assert_eq!(corrupt_kind(&reseal(header(1))), CorruptKind::BadLength);

    // Length runs past the payload
    let mut body = header(1);
    body.extend_from_slice(&u32::MAX.to_be_bytes());
    assert_eq!(corrupt_kind(&reseal(body)), CorruptKind::BadLength);

    let mut body = header(1);
    push_str(&mut body, b"k");
    push_str(&mut body, &[0xFF, 0xFE]);
    assert_eq!(corrupt_kind(&reseal(body)), CorruptKind::InvalidUtf8);

    let mut body = header(2);
    push_str(&mut body, b"k");
    push_str(&mut body, b"1");
    push_str(&mut body, b"k");
    push_str(&mut body, b"2");
    assert_eq!(corrupt_kind(&reseal(body)), CorruptKind::DuplicateKey);

    let mut body = header(0);
    body.push(0);
    assert_eq!(corrupt_kind(&reseal(body)), CorruptKind::TrailingBytes);
}
