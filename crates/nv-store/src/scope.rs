use alloc::string::String;
use nv_core::{BankId, NvError, NvResult, Scope};

/// Locations of the two sections backing one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePaths {
    pub a: String,
    pub b: String,
}

impl ScopePaths {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { a: a.into(), b: b.into() }
    }

    pub fn section(&self, bank: BankId) -> &str {
        match bank {
            BankId::A => &self.a,
            BankId::B => &self.b,
        }
    }
}

/// Supplies section locations for a scope. The engine never derives a
/// location itself and only asks for the scope an operation targets.
pub trait ScopeResolver {
    fn resolve(&self, scope: Scope) -> NvResult<ScopePaths>;
}

/// Resolved configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvramConfig {
    pub user: ScopePaths,
    pub system: ScopePaths,
}

impl NvramConfig {
    pub fn new(user: ScopePaths, system: ScopePaths) -> NvResult<Self> {
        let config = Self { user, system };
        config.validate()?;
        Ok(config)
    }

    /// Every section must be distinct, otherwise scopes (or banks) would share
    /// storage.
    pub fn validate(&self) -> NvResult<()> {
        let all = [&self.user.a, &self.user.b, &self.system.a, &self.system.b];
        for (i, first) in all.iter().enumerate() {
            if all[i + 1..].contains(first) {
                return Err(NvError::SharedSection { section: (*first).clone() });
            }
        }
        Ok(())
    }
}

impl ScopeResolver for NvramConfig {
    fn resolve(&self, scope: Scope) -> NvResult<ScopePaths> {
        match scope {
            Scope::User => Ok(self.user.clone()),
            Scope::System => Ok(self.system.clone()),
        }
    }
}
