//! Winner declaration, propagation, and the round-completion check that
//! grants a bye when a round produces an odd number of winners.

use crate::models::{BracketMatch, ForwardLink, MatchId, Slot, Tournament, TournamentError};
use rand::seq::SliceRandom;

/// Declare `winner` for the given match.
///
/// Fails with `UnknownMatch`, `AlreadyDecided`, `MatchNotReady`, or
/// `InvalidWinner` without touching any state. A match must hold both
/// players before a result is accepted; completing a half-paired match
/// would leave a state the snapshot validator rejects. On success the
/// winner is written into the slot the match's forward link names, the
/// round-completion check runs, and the tournament's progress fields are
/// refreshed.
pub fn declare_winner(
    tournament: &mut Tournament,
    match_id: MatchId,
    winner: &str,
) -> Result<(), TournamentError> {
    let m = tournament
        .get_match_mut(match_id)
        .ok_or(TournamentError::UnknownMatch(match_id))?;
    if m.is_complete {
        return Err(TournamentError::AlreadyDecided);
    }
    if m.open_slot().is_some() {
        return Err(TournamentError::MatchNotReady);
    }
    if !m.has_player(winner) {
        return Err(TournamentError::InvalidWinner);
    }

    m.winner = Some(winner.to_string());
    m.is_complete = true;
    let round = m.round;
    let link = m.next_match;

    if let Some(link) = link {
        if let Some(next) = tournament.get_match_mut(link.match_id) {
            next.set_slot(link.slot, winner);
        }
    }

    complete_round(tournament, round);
    tournament.refresh_status();
    Ok(())
}

/// Write every completed match's winner into its forward-linked slot.
///
/// Runs at build time (byes decided during construction) and after an edit
/// wipes later rounds. Rewriting a slot that already holds the value is
/// harmless, so this can always run over the whole bracket.
pub(crate) fn propagate_completed(tournament: &mut Tournament) {
    for i in 0..tournament.matches.len() {
        let m = &tournament.matches[i];
        if !m.is_complete {
            continue;
        }
        let Some(winner) = m.winner.clone() else {
            continue;
        };
        let Some(link) = m.next_match else {
            continue;
        };
        if let Some(target) = tournament.get_match_mut(link.match_id) {
            target.set_slot(link.slot, winner);
        }
    }
}

/// Round-completion check, run after every declaration.
///
/// Once every match of `round` is decided, an odd winner count means the
/// next round cannot pair everyone: one winner, chosen at random, is granted
/// a bye. At most one bye is injected per round boundary.
pub(crate) fn complete_round(tournament: &mut Tournament, round: u32) {
    if round >= tournament.total_rounds {
        return;
    }
    let in_round = tournament.matches_in_round(round);
    if in_round.iter().any(|m| !m.is_bye && !m.is_complete) {
        return;
    }
    let decided: Vec<MatchId> = in_round
        .iter()
        .filter(|m| m.winner.is_some())
        .map(|m| m.id)
        .collect();
    if decided.len() % 2 == 0 {
        return;
    }
    if tournament
        .matches_in_round(round + 1)
        .iter()
        .any(|m| m.is_bye)
    {
        return;
    }
    let Some(&donor_id) = decided.choose(&mut rand::thread_rng()) else {
        return;
    };
    grant_bye(tournament, round, donor_id);
}

/// Grant the winner of `donor_id` a bye into `round + 1`.
///
/// The boundary between the two rounds is rewired from scratch: the
/// remaining winners (an even number) pair consecutively into the next
/// round's matches and the donor takes the first match left empty, which
/// becomes a completed single-occupant bye. Rewiring the whole boundary
/// keeps every winner in exactly one slot even when a reopened match
/// re-runs the check against links written by an earlier injection.
fn grant_bye(tournament: &mut Tournament, round: u32, donor_id: MatchId) {
    let next_round = round + 1;

    let Some(winner) = tournament
        .get_match(donor_id)
        .and_then(|m| m.winner.clone())
    else {
        return;
    };

    let feeders: Vec<MatchId> = tournament
        .matches_in_round(round)
        .iter()
        .map(|m| m.id)
        .collect();
    let targets: Vec<MatchId> = tournament
        .matches_in_round(next_round)
        .iter()
        .filter(|m| !m.is_bye)
        .map(|m| m.id)
        .collect();

    for &id in &targets {
        if let Some(m) = tournament.get_match_mut(id) {
            m.clear_slot(Slot::First);
            m.clear_slot(Slot::Second);
        }
    }

    let rest: Vec<MatchId> = feeders.into_iter().filter(|&id| id != donor_id).collect();
    let mut target_iter = targets.into_iter();
    for pair in rest.chunks(2) {
        let Some(target_id) = target_iter.next() else {
            break;
        };
        for (i, &feeder_id) in pair.iter().enumerate() {
            let slot = if i == 0 { Slot::First } else { Slot::Second };
            let feeder_winner = tournament
                .get_match(feeder_id)
                .and_then(|m| m.winner.clone());
            if let Some(feeder) = tournament.get_match_mut(feeder_id) {
                feeder.next_match = Some(ForwardLink {
                    match_id: target_id,
                    slot,
                });
            }
            if let Some(w) = feeder_winner {
                if let Some(target) = tournament.get_match_mut(target_id) {
                    target.set_slot(slot, w);
                }
            }
        }
    }

    if let Some(bye_target) = target_iter.next() {
        convert_to_bye(tournament, donor_id, bye_target, &winner);
    } else {
        // Every next-round match is taken: append a fresh bye. Unreachable
        // through normal play, kept so a hand-edited bracket cannot strand
        // a winner.
        append_bye(tournament, donor_id, next_round, &winner);
    }

    complete_round(tournament, next_round);
}

/// Turn an empty next-round match into the donor's completed bye and push
/// its now-known result one round further on.
fn convert_to_bye(tournament: &mut Tournament, donor_id: MatchId, target_id: MatchId, winner: &str) {
    if let Some(donor) = tournament.get_match_mut(donor_id) {
        donor.next_match = Some(ForwardLink {
            match_id: target_id,
            slot: Slot::First,
        });
    }
    let forward = match tournament.get_match_mut(target_id) {
        Some(target) => {
            target.set_slot(Slot::First, winner);
            target.winner = Some(winner.to_string());
            target.is_bye = true;
            target.is_complete = true;
            target.next_match
        }
        None => None,
    };
    if let Some(link) = forward {
        if let Some(next) = tournament.get_match_mut(link.match_id) {
            next.set_slot(link.slot, winner);
        }
    }
}

/// Append a brand-new bye match to `next_round` for the donor's winner,
/// wiring it into the round after if one exists.
fn append_bye(tournament: &mut Tournament, donor_id: MatchId, next_round: u32, winner: &str) {
    let mut bye = BracketMatch::bye(next_round, winner);
    if next_round < tournament.total_rounds {
        let deeper = tournament
            .matches_in_round(next_round + 1)
            .iter()
            .find_map(|m| m.open_slot().map(|slot| (m.id, slot)));
        if let Some((deeper_id, slot)) = deeper {
            bye.next_match = Some(ForwardLink {
                match_id: deeper_id,
                slot,
            });
            if let Some(target) = tournament.get_match_mut(deeper_id) {
                target.set_slot(slot, winner);
            }
        }
    }
    let bye_id = bye.id;
    if let Some(donor) = tournament.get_match_mut(donor_id) {
        donor.next_match = Some(ForwardLink {
            match_id: bye_id,
            slot: Slot::First,
        });
    }
    tournament.matches.push(bye);
}
