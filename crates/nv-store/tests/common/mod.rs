#![allow(dead_code)]

use nv_core::{NvError, NvResult, StorageKind, StorageOp};
use nv_hal::{SectionDevice, SectionLock};
use nv_store::{NvramConfig, NvramStore, ScopePaths};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

// --- MOCKS ---

/// RAM-backed sections with an access log and write fault injection.
#[derive(Default)]
pub struct MemDevice {
    pub sections: BTreeMap<String, Vec<u8>>,
    pub accessed: RefCell<Vec<String>>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl SectionDevice for MemDevice {
    fn read(&self, section: &str) -> NvResult<Option<Vec<u8>>> {
        self.accessed.borrow_mut().push(section.to_string());
        Ok(self.sections.get(section).cloned())
    }

    fn write(&mut self, section: &str, data: &[u8]) -> NvResult<()> {
        self.accessed.borrow_mut().push(section.to_string());
        if self.fail_writes {
            // Simulated power cut: the new bytes never become durable
            return Err(NvError::storage(StorageOp::Write, section, StorageKind::NoSpace));
        }
        self.sections.insert(section.to_string(), data.to_vec());
        self.writes += 1;
        Ok(())
    }
}

impl MemDevice {
    pub fn holds(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

/// Counts acquisitions; can simulate a writer that never lets go.
#[derive(Default)]
pub struct MockLock {
    pub acquired: Cell<usize>,
    pub held_elsewhere: bool,
}

impl SectionLock for MockLock {
    type Guard = ();

    fn acquire(&self, section: &str) -> NvResult<()> {
        if self.held_elsewhere {
            return Err(NvError::LockContention { section: section.to_string() });
        }
        self.acquired.set(self.acquired.get() + 1);
        Ok(())
    }
}

pub const USER_A: &str = "/nv/user_a";
pub const USER_B: &str = "/nv/user_b";
pub const SYSTEM_A: &str = "/nv/system_a";
pub const SYSTEM_B: &str = "/nv/system_b";

pub fn config() -> NvramConfig {
    NvramConfig::new(
        ScopePaths::new(USER_A, USER_B),
        ScopePaths::new(SYSTEM_A, SYSTEM_B),
    )
    .unwrap()
}

pub type TestStore = NvramStore<MemDevice, MockLock>;

pub fn store() -> TestStore {
    NvramStore::new(MemDevice::default(), MockLock::default(), config())
}

pub fn store_on(device: MemDevice) -> TestStore {
    NvramStore::new(device, MockLock::default(), config())
}
