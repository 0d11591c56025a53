//! Match, Round, Slot and MatchResult for a single-elimination bracket.

use crate::models::entrant::Entrant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match (unique within a tournament).
pub type MatchId = Uuid;

/// One of the two input positions of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    A,
    B,
}

impl Slot {
    /// Slot a winner lands in when moving from `position` to the next round:
    /// even positions feed A, odd positions feed B.
    pub fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Slot::A
        } else {
            Slot::B
        }
    }

    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// Final score, A side and B side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    /// The slot with the strictly higher score, or None on a tie.
    pub fn leader(&self) -> Option<Slot> {
        match self.a.cmp(&self.b) {
            std::cmp::Ordering::Greater => Some(Slot::A),
            std::cmp::Ordering::Less => Some(Slot::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Outcome reported for a match: which slot won plus optional metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MatchResult {
    pub fn new(winner: Slot) -> Self {
        Self {
            winner,
            score: None,
            note: None,
        }
    }

    pub fn with_score(mut self, a: u32, b: u32) -> Self {
        self.score = Some(Score { a, b });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Lifecycle of a single match. No transition leaves `Decided`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// One or both slots still waiting on an upstream winner.
    Empty,
    /// Both slots filled, no result yet.
    Ready,
    /// Result recorded; immutable from here on.
    Decided,
}

/// A single contest between slot A and slot B.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub slot_a: Option<Entrant>,
    pub slot_b: Option<Entrant>,
    /// None if not yet played.
    pub result: Option<MatchResult>,
}

impl Match {
    /// A first-round match with both entrants known.
    pub fn new(slot_a: Entrant, slot_b: Entrant) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_a: Some(slot_a),
            slot_b: Some(slot_b),
            result: None,
        }
    }

    /// A later-round match waiting on winners from the previous round.
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_a: None,
            slot_b: None,
            result: None,
        }
    }

    pub fn state(&self) -> MatchState {
        if self.result.is_some() {
            MatchState::Decided
        } else if self.slot_a.is_some() && self.slot_b.is_some() {
            MatchState::Ready
        } else {
            MatchState::Empty
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&Entrant> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<Entrant> {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    /// Entrant in the winning slot, once decided.
    pub fn winner(&self) -> Option<&Entrant> {
        self.result.as_ref().and_then(|r| self.slot(r.winner))
    }

    /// Entrant in the losing slot, once decided.
    pub fn loser(&self) -> Option<&Entrant> {
        self.result.as_ref().and_then(|r| self.slot(r.winner.other()))
    }
}

/// An ordered stage of the bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub matches: Vec<Match>,
}

impl Round {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }
}
