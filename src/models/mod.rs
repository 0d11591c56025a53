//! Data structures for the bracket: entrants, matches, rounds, tournament.

mod entrant;
mod game;
mod tournament;

pub use entrant::{Entrant, EntrantId};
pub use game::{Match, MatchId, MatchResult, MatchState, Round, Score, Slot};
pub use tournament::{
    Tournament, TournamentError, TournamentId, TournamentResult, TournamentState, UserId,
};
