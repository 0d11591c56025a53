//! Tournament persistence: the store contract and an in-memory implementation.
//!
//! Every stored document carries a revision. Writes name the revision they were computed
//! from and fail with [`StoreError::Conflict`] if another writer got there first, so two
//! racing result submissions cannot both land.

use crate::models::{Tournament, TournamentError, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Monotonic per-document version, starting at 1 on insert.
pub type Revision = u64;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Tournament already exists: {0}")]
    AlreadyExists(TournamentId),

    /// The stored revision moved on since the document was read.
    #[error("Tournament {id} was modified concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        id: TournamentId,
        expected: Revision,
        actual: Revision,
    },

    /// Document failed the bracket structure check.
    #[error("Rejected tournament document: {0}")]
    Malformed(#[from] TournamentError),

    #[error("Tournament store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A tournament together with the revision it was read at.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Versioned {
    pub revision: Revision,
    pub tournament: Tournament,
}

/// Persists and retrieves tournament documents by id.
pub trait TournamentStore: Send + Sync {
    fn get(&self, id: TournamentId) -> StoreResult<Versioned>;

    /// Store a new document at revision 1.
    fn insert(&self, tournament: Tournament) -> StoreResult<Versioned>;

    /// Replace a document, provided it is still at `expected`.
    fn put(&self, tournament: Tournament, expected: Revision) -> StoreResult<Versioned>;
}

/// Per-tournament entry: document, revision and last access time (for auto-cleanup).
struct StoreEntry {
    tournament: Tournament,
    revision: Revision,
    last_activity: Instant,
}

impl StoreEntry {
    fn versioned(&self) -> Versioned {
        Versioned {
            revision: self.revision,
            tournament: self.tournament.clone(),
        }
    }
}

/// Process-local store. Reads and writes touch the entry so inactive tournaments can be purged.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<TournamentId, StoreEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> StoreResult<usize> {
        let g = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove tournaments not read or written for at least `timeout`. Returns how many went.
    pub fn purge_inactive(&self, timeout: Duration) -> StoreResult<usize> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let before = g.len();
        g.retain(|_, entry| entry.last_activity.elapsed() < timeout);
        let removed = before - g.len();
        if removed > 0 {
            log::info!("Purged {} inactive tournament(s)", removed);
        }
        Ok(removed)
    }
}

impl TournamentStore for InMemoryStore {
    fn get(&self, id: TournamentId) -> StoreResult<Versioned> {
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let entry = g.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.last_activity = Instant::now();
        Ok(entry.versioned())
    }

    fn insert(&self, tournament: Tournament) -> StoreResult<Versioned> {
        tournament.check_structure()?;
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let id = tournament.id;
        if g.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        let entry = StoreEntry {
            tournament,
            revision: 1,
            last_activity: Instant::now(),
        };
        let stored = entry.versioned();
        g.insert(id, entry);
        Ok(stored)
    }

    fn put(&self, tournament: Tournament, expected: Revision) -> StoreResult<Versioned> {
        tournament.check_structure()?;
        let mut g = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let id = tournament.id;
        let entry = g.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if entry.revision != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual: entry.revision,
            });
        }
        entry.tournament = tournament;
        entry.revision += 1;
        entry.last_activity = Instant::now();
        Ok(entry.versioned())
    }
}
