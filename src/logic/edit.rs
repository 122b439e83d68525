//! Retroactive edits: reopening a decided match and resetting everything
//! downstream of it.

use crate::logic::advancement::propagate_completed;
use crate::models::{MatchId, Tournament, TournamentError};

/// Reopen a decided match so its result can be corrected.
///
/// Clears the match's own result, then wipes every match in later rounds:
/// winner, completion flag, both slots, and any injected bye marking. The
/// next round's slots are refilled from the forward links of the matches
/// that survive, so siblings of the reopened match keep their propagated
/// winners. All results in later rounds are discarded unconditionally, even
/// in subtrees the reopened match does not feed.
///
/// Reopening an already-open match is a no-op beyond the downstream reset.
pub fn reopen_match(tournament: &mut Tournament, match_id: MatchId) -> Result<(), TournamentError> {
    let m = tournament
        .get_match_mut(match_id)
        .ok_or(TournamentError::UnknownMatch(match_id))?;
    if m.is_bye {
        return Err(TournamentError::CannotReopenBye);
    }
    m.winner = None;
    m.is_complete = false;
    let round = m.round;

    for later in tournament.matches.iter_mut().filter(|m| m.round > round) {
        later.winner = None;
        later.is_complete = false;
        later.player1 = None;
        later.player2 = None;
        later.is_bye = false;
    }

    propagate_completed(tournament);
    tournament.refresh_status();
    Ok(())
}
