#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
use alloc::vec::Vec;
use nv_core::NvResult;

/// Whole-section storage (Section = one bank file, MTD partition, ...).
/// Sections are addressed by the location string the configuration supplied.
pub trait SectionDevice {
    /// Full contents, or `None` if the section was never written.
    fn read(&self, section: &str) -> NvResult<Option<Vec<u8>>>;

    /// Replace the section contents.
    /// INVARIANT: the previous contents stay readable until the new bytes are
    /// durable; a failure at any step leaves the old section intact.
    fn write(&mut self, section: &str, data: &[u8]) -> NvResult<()>;
}

/// Cross-process exclusive lock serializing writers of one scope.
/// The lock is held for as long as the returned guard lives.
pub trait SectionLock {
    type Guard;

    fn acquire(&self, section: &str) -> NvResult<Self::Guard>;
}

/// For single-process use (tests, read-only tooling).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLock;

impl SectionLock for NoLock {
    type Guard = ();

    fn acquire(&self, _section: &str) -> NvResult<()> {
        Ok(())
    }
}

impl<D: SectionDevice + ?Sized> SectionDevice for &mut D {
    fn read(&self, section: &str) -> NvResult<Option<Vec<u8>>> {
        (**self).read(section)
    }

    fn write(&mut self, section: &str, data: &[u8]) -> NvResult<()> {
        (**self).write(section, data)
    }
}
