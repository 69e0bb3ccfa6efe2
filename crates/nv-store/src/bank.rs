use nv_core::{CorruptKind, EntryMap, Generation, NvError, NvResult};
use nv_format::BankImage;
use nv_hal::SectionDevice;

/// What a single section held when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSlot {
    Absent,
    Corrupt(CorruptKind),
    Valid(BankImage),
}

impl BankSlot {
    pub fn image(self) -> Option<BankImage> {
        match self {
            BankSlot::Valid(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, BankSlot::Absent)
    }
}

/// Reads one bank. Corruption is reported as a slot state, never as an error;
/// only device failures propagate.
pub fn load<D: SectionDevice + ?Sized>(device: &D, section: &str) -> NvResult<BankSlot> {
    let raw = match device.read(section)? {
        Some(raw) => raw,
        None => return Ok(BankSlot::Absent),
    };
    match nv_format::decode(&raw) {
        Ok(image) => Ok(BankSlot::Valid(image)),
        Err(NvError::Corrupt(kind)) => Ok(BankSlot::Corrupt(kind)),
        Err(e) => Err(e),
    }
}

/// Serializes and durably replaces one bank.
pub fn write<D: SectionDevice + ?Sized>(
    device: &mut D,
    section: &str,
    generation: Generation,
    entries: &EntryMap,
) -> NvResult<()> {
    let buf = nv_format::encode(generation, entries)?;
    device.write(section, &buf)
}
