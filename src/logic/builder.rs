//! Bracket construction: seeding round 1 and wiring the later rounds.

use crate::logic::advancement::{complete_round, propagate_completed};
use crate::models::{BracketMatch, ForwardLink, Slot, Tournament, TournamentError};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// Build a full single-elimination tournament for the given entrants.
///
/// 1. Shuffle the entrants into a random pairing order.
/// 2. Odd count: one entrant, chosen at random, gets a completed round-1
///    bye; the rest pair up consecutively.
/// 3. Every later round gets `ceil(previous / 2)` empty matches. Consecutive
///    pairs of the previous round wire into them, first feeder to the first
///    slot, second feeder to the second. An odd round's trailing match stays
///    unlinked; the round-completion check assigns it when the round ends.
/// 4. Bye results are known at build time, so they propagate immediately and
///    the round-1 completion check runs once.
///
/// Duplicate names are allowed and treated as distinct entrants.
pub fn create_tournament(name: &str, entrants: &[String]) -> Result<Tournament, TournamentError> {
    if entrants.len() < 2 {
        return Err(TournamentError::InsufficientEntrants);
    }

    let name = name.trim();
    let name = if name.is_empty() {
        "Untitled Tournament".to_string()
    } else {
        name.to_string()
    };

    let players = entrants.to_vec();
    let total_rounds = Tournament::rounds_needed(players.len());

    let mut rng = rand::thread_rng();
    let mut shuffled = players.clone();
    shuffled.shuffle(&mut rng);

    let mut matches: Vec<BracketMatch> = Vec::new();

    // Odd entrant count: one random entrant advances on a bye.
    if shuffled.len() % 2 != 0 {
        let bye_index = rng.gen_range(0..shuffled.len());
        let bye_player = shuffled.remove(bye_index);
        matches.push(BracketMatch::bye(1, bye_player));
    }

    for chunk in shuffled.chunks(2) {
        if let [a, b] = chunk {
            matches.push(BracketMatch::pairing(1, a.clone(), b.clone()));
        } else if let [a] = chunk {
            // Cannot happen after the bye removal; an unmatched single
            // waits in a half-filled match rather than being dropped.
            let mut m = BracketMatch::new(1);
            m.set_slot(Slot::First, a.clone());
            matches.push(m);
        }
    }

    // Later rounds: empty matches, fed by consecutive pairs of the previous.
    let mut prev_range = 0..matches.len();
    for round in 2..=total_rounds {
        let prev_count = prev_range.len();
        let first_target = matches.len();
        for _ in 0..prev_count.div_ceil(2) {
            matches.push(BracketMatch::new(round));
        }
        let target_ids: Vec<Uuid> = matches[first_target..].iter().map(|m| m.id).collect();
        for offset in 0..prev_count {
            // Odd previous round: the trailing match stays unlinked.
            if prev_count % 2 != 0 && offset == prev_count - 1 {
                break;
            }
            let slot = if offset % 2 == 0 {
                Slot::First
            } else {
                Slot::Second
            };
            matches[prev_range.start + offset].next_match = Some(ForwardLink {
                match_id: target_ids[offset / 2],
                slot,
            });
        }
        prev_range = first_target..matches.len();
    }

    let mut tournament = Tournament {
        id: Uuid::new_v4(),
        name,
        players,
        matches,
        current_round: 1,
        total_rounds,
        is_complete: false,
        created_at: Utc::now(),
    };

    propagate_completed(&mut tournament);
    complete_round(&mut tournament, 1);
    tournament.refresh_status();

    Ok(tournament)
}
