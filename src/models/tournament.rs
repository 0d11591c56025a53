//! Tournament, TournamentState and the bracket error taxonomy.

use crate::models::entrant::{Entrant, EntrantId};
use crate::models::game::{Match, MatchId, MatchState, Round, Slot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Identity of a user acting on a tournament (creator, admin, participant).
pub type UserId = Uuid;

/// Errors that can occur while building or advancing a bracket.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    /// No match with this id in any round.
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// The acting user is not allowed to submit results.
    #[error("User {0} is not allowed to submit results for this tournament")]
    Forbidden(UserId),

    /// The match already has a result; decided matches are immutable.
    #[error("Match {0} already has a result")]
    AlreadyDecided(MatchId),

    /// One or both slots are still waiting on the previous round.
    #[error("Match {0} is still waiting on an entrant")]
    IncompleteMatch(MatchId),

    /// A winner has been crowned; no further results are accepted.
    #[error("Tournament is complete")]
    TournamentComplete,

    /// The reported score does not agree with the reported winner.
    #[error("Score {a}-{b} does not agree with winner {winner:?}")]
    ScoreMismatch { winner: Slot, a: u32, b: u32 },

    /// Bracket needs a power-of-two entrant count of at least 2.
    #[error("Entrant count must be a power of two and at least 2 (got {0})")]
    InvalidEntrantCount(usize),

    /// Tournament or entrant name is blank.
    #[error("Name must not be empty")]
    EmptyName,

    /// The same entrant was listed twice.
    #[error("Entrant listed more than once: {0}")]
    DuplicateEntrant(EntrantId),

    /// Document violates a structural invariant of the bracket.
    #[error("Malformed bracket: {0}")]
    Malformed(String),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament-level lifecycle. `Complete` is terminal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    #[default]
    InProgress,
    Complete,
}

/// Full tournament document: identity, bracket and (eventually) the winner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub sport: String,
    /// Owner; the only non-admin identity allowed to submit results.
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Registration list, in the order it populated round 0.
    pub entrants: Vec<Entrant>,
    /// Index 0 is the first round; the last round holds the final.
    pub rounds: Vec<Round>,
    /// Set if and only if the final has a result.
    pub winner: Option<Entrant>,
}

impl Tournament {
    /// Build a bracket from `entrants`, paired in the order given (0 v 1, 2 v 3, ...).
    /// Later rounds start as empty placeholders.
    pub fn new(
        name: impl Into<String>,
        sport: impl Into<String>,
        creator_id: UserId,
        entrants: Vec<Entrant>,
    ) -> TournamentResult<Self> {
        let n = entrants.len();
        if n < 2 || !n.is_power_of_two() {
            return Err(TournamentError::InvalidEntrantCount(n));
        }
        let name = name.into().trim().to_string();
        if name.is_empty() || entrants.iter().any(|e| e.name.trim().is_empty()) {
            return Err(TournamentError::EmptyName);
        }
        let mut seen = HashSet::with_capacity(n);
        for e in &entrants {
            if !seen.insert(e.id) {
                return Err(TournamentError::DuplicateEntrant(e.id));
            }
        }

        let first = Round::new(
            entrants
                .chunks_exact(2)
                .map(|pair| Match::new(pair[0].clone(), pair[1].clone()))
                .collect(),
        );
        let mut rounds = vec![first];
        let mut size = n / 4;
        while size >= 1 {
            rounds.push(Round::new((0..size).map(|_| Match::placeholder()).collect()));
            size /= 2;
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            sport: sport.into().trim().to_string(),
            creator_id,
            created_at: Utc::now(),
            entrants,
            rounds,
            winner: None,
        })
    }

    pub fn state(&self) -> TournamentState {
        if self.winner.is_some() {
            TournamentState::Complete
        } else {
            TournamentState::InProgress
        }
    }

    /// Index of the final round.
    pub fn final_round(&self) -> usize {
        self.rounds.len().saturating_sub(1)
    }

    /// The single match of the last round.
    pub fn final_match(&self) -> Option<&Match> {
        self.rounds.last().and_then(|r| r.matches.first())
    }

    /// `(round, position)` of a match by id.
    pub fn find_match(&self, match_id: MatchId) -> Option<(usize, usize)> {
        self.rounds.iter().enumerate().find_map(|(r, round)| {
            round
                .matches
                .iter()
                .position(|m| m.id == match_id)
                .map(|i| (r, i))
        })
    }

    pub fn get_match(&self, match_id: MatchId) -> Option<&Match> {
        self.find_match(match_id)
            .map(|(r, i)| &self.rounds[r].matches[i])
    }

    /// Matches with both slots filled and no result, in round then position order.
    pub fn ready_matches(&self) -> Vec<&Match> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| m.state() == MatchState::Ready)
            .collect()
    }

    /// Check the structural invariants a stored document must satisfy.
    pub fn check_structure(&self) -> TournamentResult<()> {
        let malformed = |msg: String| Err(TournamentError::Malformed(msg));

        let Some(first) = self.rounds.first() else {
            return malformed("bracket has no rounds".to_string());
        };
        if first.matches.is_empty() {
            return malformed("first round has no matches".to_string());
        }
        for (r, pair) in self.rounds.windows(2).enumerate() {
            if pair[0].matches.len() != pair[1].matches.len() * 2 {
                return malformed(format!(
                    "round {} has {} matches, expected half of {}",
                    r + 1,
                    pair[1].matches.len(),
                    pair[0].matches.len()
                ));
            }
        }
        if self.rounds[self.final_round()].matches.len() != 1 {
            return malformed("final round must hold exactly one match".to_string());
        }
        if first
            .matches
            .iter()
            .any(|m| m.slot_a.is_none() || m.slot_b.is_none())
        {
            return malformed("first round has an empty slot".to_string());
        }

        let mut match_ids = HashSet::new();
        for (r, round) in self.rounds.iter().enumerate() {
            let mut in_round = HashSet::new();
            for (i, m) in round.matches.iter().enumerate() {
                if !match_ids.insert(m.id) {
                    return malformed(format!("duplicate match id {}", m.id));
                }
                for e in [&m.slot_a, &m.slot_b].into_iter().flatten() {
                    if !in_round.insert(e.id) {
                        return malformed(format!("entrant {} appears twice in round {}", e.id, r));
                    }
                }
                if m.result.is_some() && (m.slot_a.is_none() || m.slot_b.is_none()) {
                    return malformed(format!("match {} decided with an empty slot", m.id));
                }
                if r < self.final_round() {
                    let dest = self.rounds[r + 1].matches[i / 2].slot(Slot::for_position(i));
                    if dest != m.winner() {
                        return malformed(format!(
                            "winner of match {} does not match its destination slot",
                            m.id
                        ));
                    }
                }
            }
        }

        let final_winner = self.final_match().and_then(Match::winner);
        if self.winner.as_ref() != final_winner {
            return malformed("tournament winner disagrees with the final".to_string());
        }
        Ok(())
    }
}
