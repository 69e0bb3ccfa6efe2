use nv_core::{BankId, EntryMap, Generation, NvError, NvResult};
use nv_format::BankImage;

/// Which bank is authoritative for a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Neither bank usable: logically an empty store.
    Empty,
    Active { bank: BankId, image: BankImage },
}

/// Outcome of comparing both banks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub selection: Selection,
    /// Both banks valid with the same generation. Commits alternate banks and
    /// always increment, so this only happens after outside tampering.
    pub generation_tie: bool,
}

/// Pure selection over the two loaded banks. Authority is re-derived from
/// storage on every call; nothing else records which bank is active.
pub fn select(a: Option<BankImage>, b: Option<BankImage>) -> Recovery {
    let mut generation_tie = false;
    let selection = match (a, b) {
        (None, None) => Selection::Empty,
        (Some(image), None) => Selection::Active { bank: BankId::A, image },
        (None, Some(image)) => Selection::Active { bank: BankId::B, image },
        (Some(a), Some(b)) => {
            if b.generation > a.generation {
                Selection::Active { bank: BankId::B, image: b }
            } else {
                // Ties fall back to A deterministically
                generation_tie = a.generation == b.generation;
                Selection::Active { bank: BankId::A, image: a }
            }
        }
    };
    Recovery { selection, generation_tie }
}

impl Selection {
    pub fn active(&self) -> Option<BankId> {
        match self {
            Selection::Empty => None,
            Selection::Active { bank, .. } => Some(*bank),
        }
    }

    pub fn generation(&self) -> Option<Generation> {
        match self {
            Selection::Empty => None,
            Selection::Active { image, .. } => Some(image.generation),
        }
    }

    pub fn entries(&self) -> Option<&EntryMap> {
        match self {
            Selection::Empty => None,
            Selection::Active { image, .. } => Some(&image.entries),
        }
    }

    pub fn into_entries(self) -> EntryMap {
        match self {
            Selection::Empty => EntryMap::new(),
            Selection::Active { image, .. } => image.entries,
        }
    }

    /// Target bank and generation for the next commit: always the inactive
    /// bank, A when the store is empty.
    pub fn next_commit(&self) -> NvResult<(BankId, Generation)> {
        match self {
            Selection::Empty => Ok((BankId::A, 1)),
            Selection::Active { bank, image } => {
                let next = image
                    .generation
                    .checked_add(1)
                    .ok_or(NvError::GenerationExhausted)?;
                Ok((bank.other(), next))
            }
        }
    }
}
