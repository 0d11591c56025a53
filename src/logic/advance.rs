//! Recording match results and moving winners up the bracket.

use crate::logic::authorize::{Actor, Authorizer};
use crate::models::{
    MatchId, MatchResult, MatchState, Slot, Tournament, TournamentError, TournamentResult,
};

/// Record `result` on `match_id` and return the advanced tournament.
///
/// The input is left untouched; callers persist the returned value. Checks, in order:
/// authorization, tournament already complete, unknown match, match already decided,
/// empty slot, score disagreeing with the winner.
///
/// The winner moves to match `i / 2` of the next round, slot A for even `i`, slot B for odd.
/// A destination whose other slot is already filled becomes ready but is not decided here.
/// Deciding the final crowns the tournament winner.
pub fn apply_result(
    tournament: &Tournament,
    match_id: MatchId,
    result: MatchResult,
    actor: &Actor,
    authorizer: &dyn Authorizer,
) -> TournamentResult<Tournament> {
    if !authorizer.may_submit_result(tournament, actor) {
        return Err(TournamentError::Forbidden(actor.id));
    }
    if tournament.winner.is_some() {
        return Err(TournamentError::TournamentComplete);
    }
    let current = tournament
        .get_match(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    match current.state() {
        MatchState::Decided => return Err(TournamentError::AlreadyDecided(match_id)),
        MatchState::Empty => return Err(TournamentError::IncompleteMatch(match_id)),
        MatchState::Ready => {}
    }
    if let Some(score) = result.score {
        if score.leader() != Some(result.winner) {
            return Err(TournamentError::ScoreMismatch {
                winner: result.winner,
                a: score.a,
                b: score.b,
            });
        }
    }

    let (round, position) = tournament
        .find_match(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let mut next = tournament.clone();
    let winner_slot = result.winner;
    let decided = &mut next.rounds[round].matches[position];
    decided.result = Some(result);
    let winner = decided
        .slot(winner_slot)
        .cloned()
        .ok_or(TournamentError::IncompleteMatch(match_id))?;
    log::debug!(
        "Tournament {}: match {} (round {}, position {}) won by {}",
        next.id,
        match_id,
        round,
        position,
        winner.name
    );

    if round == next.final_round() {
        log::info!("Tournament {} complete, winner {}", next.id, winner.name);
        next.winner = Some(winner);
        return Ok(next);
    }

    let dest_slot = Slot::for_position(position);
    let dest = next.rounds[round + 1]
        .matches
        .get_mut(position / 2)
        .ok_or_else(|| TournamentError::Malformed(format!("no destination for match {match_id}")))?;
    let dest_id = dest.id;
    let target = dest.slot_mut(dest_slot);
    if target.is_some() {
        return Err(TournamentError::Malformed(format!(
            "destination slot {dest_slot:?} of match {dest_id} already filled"
        )));
    }
    *target = Some(winner);
    Ok(next)
}
