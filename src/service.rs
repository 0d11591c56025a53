//! Bracket service: reads from the store, runs the engine, writes back.

use crate::logic::{apply_result, Actor, Authorizer, CreatorOrAdmin};
use crate::models::{
    Entrant, Match, MatchId, MatchResult, Tournament, TournamentError, TournamentId,
};
use crate::store::{StoreError, TournamentStore, Versioned};
use thiserror::Error;

/// Default number of re-reads after a write conflict before giving up.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Errors surfaced to callers of the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tournament(#[from] TournamentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Failures of the server itself rather than of the request: a poisoned lock, or the
    /// engine producing a document the store refuses.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::Tournament(TournamentError::Malformed(_))
                | ServiceError::Store(StoreError::Malformed(_) | StoreError::Poisoned)
        )
    }

    /// Stable tag for the error kind, so a client can pick a message per kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Tournament(e) => match e {
                TournamentError::MatchNotFound(_) => "match_not_found",
                TournamentError::Forbidden(_) => "forbidden",
                TournamentError::AlreadyDecided(_) => "already_decided",
                TournamentError::IncompleteMatch(_) => "incomplete_match",
                TournamentError::TournamentComplete => "tournament_complete",
                TournamentError::ScoreMismatch { .. } => "score_mismatch",
                TournamentError::InvalidEntrantCount(_) => "invalid_entrant_count",
                TournamentError::EmptyName => "empty_name",
                TournamentError::DuplicateEntrant(_) => "duplicate_entrant",
                TournamentError::Malformed(_) => "internal",
            },
            ServiceError::Store(StoreError::NotFound(_)) => "tournament_not_found",
            ServiceError::Store(StoreError::AlreadyExists(_)) => "already_exists",
            ServiceError::Store(StoreError::Conflict { .. }) => "conflict",
            ServiceError::Store(StoreError::Malformed(_) | StoreError::Poisoned) => "internal",
        }
    }

    /// Message safe to show a client; internal failures are not described.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Ties the bracket engine to a store and an authorization rule.
pub struct BracketService<S> {
    store: S,
    authorizer: Box<dyn Authorizer>,
    max_retries: u32,
}

impl<S: TournamentStore> BracketService<S> {
    /// Service with the creator-or-admin rule and the default retry bound.
    pub fn new(store: S) -> Self {
        Self {
            store,
            authorizer: Box::new(CreatorOrAdmin),
            max_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Box::new(authorizer);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_tournament(&self, id: TournamentId) -> ServiceResult<Versioned> {
        Ok(self.store.get(id)?)
    }

    /// Create a tournament owned by `creator`, entrants paired in the order given.
    pub fn create_tournament(
        &self,
        name: &str,
        sport: &str,
        entrant_names: &[String],
        creator: &Actor,
    ) -> ServiceResult<Versioned> {
        let entrants = entrant_names.iter().map(Entrant::new).collect();
        let tournament = Tournament::new(name, sport, creator.id, entrants)?;
        let stored = self.store.insert(tournament)?;
        log::info!(
            "Created tournament {} ({} entrants) for user {}",
            stored.tournament.id,
            entrant_names.len(),
            creator.id
        );
        Ok(stored)
    }

    /// Matches that can take a result right now.
    pub fn ready_matches(&self, id: TournamentId) -> ServiceResult<Vec<Match>> {
        let stored = self.store.get(id)?;
        Ok(stored
            .tournament
            .ready_matches()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Apply a result and persist it. On a write conflict the document is re-read and the
    /// result re-applied, so a racing writer on the same match ends in `AlreadyDecided`.
    pub fn submit_result(
        &self,
        id: TournamentId,
        match_id: MatchId,
        result: MatchResult,
        actor: &Actor,
    ) -> ServiceResult<Versioned> {
        let mut attempt = 0;
        loop {
            let current = self.store.get(id)?;
            let next = apply_result(
                &current.tournament,
                match_id,
                result.clone(),
                actor,
                self.authorizer.as_ref(),
            )?;
            match self.store.put(next, current.revision) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict {
                    expected, actual, ..
                }) if attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Tournament {} moved from revision {} to {}; retrying match {} (attempt {})",
                        id,
                        expected,
                        actual,
                        match_id,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
