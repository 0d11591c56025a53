//! Integration tests for result advancement: the four-entrant walkthrough and the error taxonomy.

use bracket_engine::{
    apply_result, Actor, CreatorOrAdmin, Entrant, MatchResult, MatchState, Slot, Tournament,
    TournamentError, TournamentState,
};
use uuid::Uuid;

fn four_entrant_cup() -> (Tournament, Actor) {
    let creator = Uuid::new_v4();
    let entrants = (1..=4).map(|i| Entrant::new(format!("Entrant {i}"))).collect();
    let t = Tournament::new("Spring cup", "padel", creator, entrants).unwrap();
    (t, Actor::participant(creator))
}

fn submit(
    t: &Tournament,
    round: usize,
    pos: usize,
    winner: Slot,
    actor: &Actor,
) -> Result<Tournament, TournamentError> {
    let id = t.rounds[round].matches[pos].id;
    apply_result(t, id, MatchResult::new(winner), actor, &CreatorOrAdmin)
}

fn name(e: Option<&Entrant>) -> Option<&str> {
    e.map(|e| e.name.as_str())
}

#[test]
fn four_entrant_bracket_walkthrough() {
    let (t, creator) = four_entrant_cup();

    // Match A {1, 2}: slot A wins -> final slot A = Entrant 1
    let t = submit(&t, 0, 0, Slot::A, &creator).unwrap();
    assert_eq!(name(t.rounds[1].matches[0].slot_a.as_ref()), Some("Entrant 1"));
    assert_eq!(t.rounds[1].matches[0].state(), MatchState::Empty);

    // Match B {3, 4}: slot B wins -> final slot B = Entrant 4
    let t = submit(&t, 0, 1, Slot::B, &creator).unwrap();
    assert_eq!(name(t.rounds[1].matches[0].slot_b.as_ref()), Some("Entrant 4"));
    assert_eq!(t.rounds[1].matches[0].state(), MatchState::Ready);
    assert!(t.winner.is_none());

    // Final C: slot B wins -> Entrant 4 takes the tournament
    let t = submit(&t, 1, 0, Slot::B, &creator).unwrap();
    assert_eq!(t.state(), TournamentState::Complete);
    assert_eq!(name(t.winner.as_ref()), Some("Entrant 4"));
    t.check_structure().unwrap();

    // Nothing is accepted after completion, whichever match is named
    for (round, pos) in [(0, 0), (0, 1), (1, 0)] {
        assert_eq!(
            submit(&t, round, pos, Slot::A, &creator),
            Err(TournamentError::TournamentComplete)
        );
    }
}

#[test]
fn decided_match_is_rejected_again() {
    let (t, creator) = four_entrant_cup();
    let t = submit(&t, 0, 0, Slot::A, &creator).unwrap();
    let id = t.rounds[0].matches[0].id;
    for winner in [Slot::A, Slot::B] {
        assert_eq!(
            submit(&t, 0, 0, winner, &creator),
            Err(TournamentError::AlreadyDecided(id))
        );
    }
}

#[test]
fn final_with_one_empty_slot_is_incomplete() {
    let (t, creator) = four_entrant_cup();
    let final_id = t.rounds[1].matches[0].id;
    assert_eq!(
        submit(&t, 1, 0, Slot::A, &creator),
        Err(TournamentError::IncompleteMatch(final_id))
    );

    // Slot A filled, slot B still empty
    let t = submit(&t, 0, 0, Slot::A, &creator).unwrap();
    assert_eq!(
        submit(&t, 1, 0, Slot::A, &creator),
        Err(TournamentError::IncompleteMatch(final_id))
    );

    // Slot B filled, slot A still empty
    let (t, creator) = four_entrant_cup();
    let final_id = t.rounds[1].matches[0].id;
    let t = submit(&t, 0, 1, Slot::A, &creator).unwrap();
    assert_eq!(
        submit(&t, 1, 0, Slot::B, &creator),
        Err(TournamentError::IncompleteMatch(final_id))
    );
}

#[test]
fn unknown_match_is_not_found() {
    let (t, creator) = four_entrant_cup();
    let missing = Uuid::new_v4();
    assert_eq!(
        apply_result(&t, missing, MatchResult::new(Slot::A), &creator, &CreatorOrAdmin),
        Err(TournamentError::MatchNotFound(missing))
    );
}

#[test]
fn stranger_is_forbidden_even_on_a_ready_match() {
    let (t, _) = four_entrant_cup();
    let stranger = Actor::participant(Uuid::new_v4());
    assert_eq!(t.rounds[0].matches[0].state(), MatchState::Ready);
    assert_eq!(
        submit(&t, 0, 0, Slot::A, &stranger),
        Err(TournamentError::Forbidden(stranger.id))
    );
}
