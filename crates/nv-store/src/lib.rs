#![no_std]
#![forbid(unsafe_code)]
extern crate alloc;

use alloc::string::String;
use log::{debug, warn};

use nv_core::{validate_key, validate_value, BankId, EntryMap, Format, NvError, NvResult, Scope};
use nv_format::{legacy, BankImage};
use nv_hal::{SectionDevice, SectionLock};

pub mod bank;
pub mod scope;
pub mod selector;

pub use bank::BankSlot;
pub use scope::{NvramConfig, ScopePaths, ScopeResolver};
pub use selector::{select, Recovery, Selection};

/// The operation surface. Stateless between calls: every operation re-reads
/// storage, since another process may have committed in the meantime.
pub struct NvramStore<D, L, R = NvramConfig> {
    device: D,
    lock: L,
    resolver: R,
    format: Format,
}

impl<D: SectionDevice, L: SectionLock, R: ScopeResolver> NvramStore<D, L, R> {
    pub fn new(device: D, lock: L, resolver: R) -> Self {
        Self { device, lock, resolver, format: Format::Dual }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn lock(&self) -> &L {
        &self.lock
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Current authoritative state of a scope.
    pub fn load(&self, scope: Scope) -> NvResult<Selection> {
        let paths = self.resolver.resolve(scope)?;
        self.load_paths(scope, &paths)
    }

    /// Fails with `NotFound` if the key is absent, including on an empty scope.
    pub fn get(&self, scope: Scope, key: &str) -> NvResult<String> {
        let selection = self.load(scope)?;
        selection
            .entries()
            .and_then(|entries| entries.get(key))
            .cloned()
            .ok_or_else(|| NvError::NotFound { key: String::from(key) })
    }

    pub fn list(&self, scope: Scope) -> NvResult<EntryMap> {
        Ok(self.load(scope)?.into_entries())
    }

    /// Inserts or overwrites one key and commits.
    pub fn set(&mut self, scope: Scope, key: &str, value: &str) -> NvResult<()> {
        self.set_all(scope, [(key, value)])
    }

    /// Applies every pair (last one wins per key) in a single commit.
    /// The previously active bank is never touched.
    pub fn set_all<'a, I>(&mut self, scope: Scope, pairs: I) -> NvResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut updates = EntryMap::new();
        for (key, value) in pairs {
            validate_key(key)?;
            validate_value(value)?;
            if self.format == Format::Legacy {
                legacy::validate_key(key)?;
                legacy::validate_value(value)?;
            }
            updates.insert(String::from(key), String::from(value));
        }
        if updates.is_empty() {
            return Ok(());
        }

        let paths = self.resolver.resolve(scope)?;

        // 1. Serialize writers for the whole load + commit
        let _guard = self.lock.acquire(&paths.a)?;

        // 2. Load under the lock
        let selection = self.load_paths(scope, &paths)?;

        // 3. Commit to the inactive section
        match self.format {
            Format::Dual => {
                let (target, generation) = selection.next_commit()?;
                let mut entries = selection.into_entries();
                entries.extend(updates);
                bank::write(&mut self.device, paths.section(target), generation, &entries)?;
                debug!(
                    "{}: committed {} entries, generation {} -> bank {} ({})",
                    scope,
                    entries.len(),
                    generation,
                    target,
                    paths.section(target)
                );
            }
            Format::Legacy => {
                let mut entries = selection.into_entries();
                entries.extend(updates);
                self.device.write(&paths.a, &legacy::serialize(&entries))?;
                debug!("{}: committed {} entries to {}", scope, entries.len(), paths.a);
            }
        }
        Ok(())
    }

    fn load_paths(&self, scope: Scope, paths: &ScopePaths) -> NvResult<Selection> {
        match self.format {
            Format::Dual => self.load_dual(scope, paths),
            Format::Legacy => self.load_legacy(scope, paths),
        }
    }

    fn load_dual(&self, scope: Scope, paths: &ScopePaths) -> NvResult<Selection> {
        let slot_a = bank::load(&self.device, &paths.a)?;
        let slot_b = bank::load(&self.device, &paths.b)?;

        for (id, slot) in [(BankId::A, &slot_a), (BankId::B, &slot_b)] {
            if let BankSlot::Corrupt(kind) = slot {
                warn!("{}: bank {} ({}) unusable: {}", scope, id, paths.section(id), kind);
            }
        }
        let any_present = slot_a.is_present() || slot_b.is_present();

        let recovery = select(slot_a.image(), slot_b.image());
        if recovery.generation_tie {
            warn!(
                "{}: recovery anomaly, both banks valid at generation {:?}; using bank A",
                scope,
                recovery.selection.generation()
            );
        }

        match &recovery.selection {
            Selection::Empty if any_present => {
                warn!("{}: no valid bank left, data lost; continuing with empty store", scope)
            }
            Selection::Empty => debug!("{}: never written", scope),
            Selection::Active { bank, image } => debug!(
                "{}: bank {} active, generation {}, {} entries",
                scope,
                bank,
                image.generation,
                image.entries.len()
            ),
        }
        Ok(recovery.selection)
    }

    /// A damaged legacy section has no redundant copy, so it is a hard error.
    fn load_legacy(&self, scope: Scope, paths: &ScopePaths) -> NvResult<Selection> {
        debug!("{}: legacy format, single section {}; {} unused", scope, paths.a, paths.b);
        match self.device.read(&paths.a)? {
            None => Ok(Selection::Empty),
            Some(raw) => {
                let entries = legacy::parse(&raw)?;
                Ok(Selection::Active {
                    bank: BankId::A,
                    image: BankImage { generation: 0, entries },
                })
            }
        }
    }
}
