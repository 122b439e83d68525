//! Tournament state and the error type shared by all bracket operations.

use crate::models::bracket::{BracketMatch, MatchId, Slot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Errors reported by bracket operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Fewer than two entrants were supplied at creation.
    InsufficientEntrants,
    /// An operation referenced a match id that does not exist.
    UnknownMatch(MatchId),
    /// The declared winner is not one of the match's occupants.
    InvalidWinner,
    /// The match already has a result; reopen it before re-declaring.
    AlreadyDecided,
    /// The match is still missing a player; no winner can be declared yet.
    MatchNotReady,
    /// A bye has no declared result to revise.
    CannotReopenBye,
    /// The operation needs a tournament and none is loaded.
    NoTournament,
    /// An imported snapshot failed shape or invariant checks.
    MalformedSnapshot(String),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InsufficientEntrants => {
                write!(f, "At least 2 entrants are required")
            }
            TournamentError::UnknownMatch(id) => write!(f, "No match with id {id}"),
            TournamentError::InvalidWinner => {
                write!(f, "Winner must be one of the match's players")
            }
            TournamentError::AlreadyDecided => write!(f, "Match already has a result"),
            TournamentError::MatchNotReady => {
                write!(f, "Match does not have both players yet")
            }
            TournamentError::CannotReopenBye => write!(f, "A bye has no result to reopen"),
            TournamentError::NoTournament => write!(f, "No tournament is currently loaded"),
            TournamentError::MalformedSnapshot(reason) => {
                write!(f, "Invalid tournament snapshot: {reason}")
            }
        }
    }
}

/// Full tournament state: the entrants, the flat match list that forms the
/// bracket tree, and progress bookkeeping.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Entrants in sign-up order; never reordered after creation.
    pub players: Vec<String>,
    /// Every match across all rounds, in creation order, linked by id.
    pub matches: Vec<BracketMatch>,
    /// First round that still has an undecided match.
    pub current_round: u32,
    /// ceil(log2(entrant count)), fixed at creation.
    pub total_rounds: u32,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
}

fn invalid(reason: impl Into<String>) -> TournamentError {
    TournamentError::MalformedSnapshot(reason.into())
}

impl Tournament {
    /// Rounds needed for `entrant_count` entrants: ceil(log2(n)), 0 below 2.
    pub fn rounds_needed(entrant_count: usize) -> u32 {
        if entrant_count < 2 {
            0
        } else {
            usize::BITS - (entrant_count - 1).leading_zeros()
        }
    }

    /// Look up a match by id.
    pub fn get_match(&self, id: MatchId) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Look up a match by id, mutably.
    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut BracketMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// All matches of `round` in creation order.
    pub fn matches_in_round(&self, round: u32) -> Vec<&BracketMatch> {
        self.matches.iter().filter(|m| m.round == round).collect()
    }

    /// The single match of the last round.
    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.round == self.total_rounds)
    }

    /// The tournament winner: the final match's winner, once decided.
    pub fn champion(&self) -> Option<&str> {
        self.final_match().and_then(|m| m.winner.as_deref())
    }

    /// Matches whose forward link feeds `id`, in creation order.
    pub fn upstream_matches(&self, id: MatchId) -> Vec<&BracketMatch> {
        self.matches
            .iter()
            .filter(|m| m.next_match.map_or(false, |link| link.match_id == id))
            .collect()
    }

    /// Recompute `current_round` and `is_complete` from the match list.
    pub fn refresh_status(&mut self) {
        self.is_complete = self.final_match().map_or(false, |m| m.is_complete);
        self.current_round = (1..=self.total_rounds)
            .find(|&round| {
                self.matches_in_round(round)
                    .iter()
                    .any(|m| !m.is_complete)
            })
            .unwrap_or(self.total_rounds);
    }

    /// Check the structural invariants of the bracket. Runs on snapshot
    /// import; a freshly built or normally mutated tournament always passes.
    pub fn validate(&self) -> Result<(), TournamentError> {
        use std::collections::HashSet;

        let n = self.players.len();
        if n < 2 {
            return Err(invalid("fewer than 2 entrants"));
        }
        if self.players.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("blank entrant name"));
        }
        if self.total_rounds != Self::rounds_needed(n) {
            return Err(invalid(format!(
                "total_rounds is {} but {} entrants need {}",
                self.total_rounds,
                n,
                Self::rounds_needed(n)
            )));
        }
        if self.current_round == 0 || self.current_round > self.total_rounds {
            return Err(invalid(format!(
                "current_round {} out of range",
                self.current_round
            )));
        }

        let mut ids = HashSet::new();
        for m in &self.matches {
            if !ids.insert(m.id) {
                return Err(invalid(format!("duplicate match id {}", m.id)));
            }
            if m.round == 0 || m.round > self.total_rounds {
                return Err(invalid(format!(
                    "match {} has round {} out of range",
                    m.id, m.round
                )));
            }
        }

        let mut prev_count = 0usize;
        for round in 1..=self.total_rounds {
            let count = self.matches_in_round(round).len();
            if round == 1 {
                if count != n.div_ceil(2) {
                    return Err(invalid(format!(
                        "round 1 has {count} matches, expected {}",
                        n.div_ceil(2)
                    )));
                }
                prev_count = count;
            } else {
                let expected = prev_count.div_ceil(2);
                // One extra match per round is legal: an appended bye. It
                // feeds an existing slot one round on, so the round after
                // it is still sized from the built count.
                if count < expected || count > expected + 1 {
                    return Err(invalid(format!(
                        "round {round} has {count} matches, expected {expected}"
                    )));
                }
                prev_count = expected;
            }
        }
        if self.matches_in_round(self.total_rounds).len() != 1 {
            return Err(invalid("final round must have exactly one match"));
        }

        let entrants: HashSet<&str> = self.players.iter().map(String::as_str).collect();
        let mut fed_slots: HashSet<(MatchId, Slot)> = HashSet::new();
        for m in &self.matches {
            for occupant in [m.player1.as_deref(), m.player2.as_deref()]
                .into_iter()
                .flatten()
            {
                if !entrants.contains(occupant) {
                    return Err(invalid(format!(
                        "match {} holds unknown name {occupant:?}",
                        m.id
                    )));
                }
            }
            let occupied = m.player1.iter().chain(m.player2.iter()).count();
            if m.is_bye {
                if !m.is_complete {
                    return Err(invalid(format!("bye match {} is not complete", m.id)));
                }
                if occupied != 1 {
                    return Err(invalid(format!(
                        "bye match {} must have exactly one occupant",
                        m.id
                    )));
                }
                let occupant = m.player1.as_deref().or(m.player2.as_deref());
                if m.winner.as_deref() != occupant {
                    return Err(invalid(format!(
                        "bye match {} winner must be its occupant",
                        m.id
                    )));
                }
            } else if m.is_complete {
                if occupied != 2 {
                    return Err(invalid(format!(
                        "complete match {} must have both slots occupied",
                        m.id
                    )));
                }
                match &m.winner {
                    Some(winner) if m.has_player(winner) => {}
                    _ => {
                        return Err(invalid(format!(
                            "complete match {} winner must occupy a slot",
                            m.id
                        )))
                    }
                }
            } else if m.winner.is_some() {
                return Err(invalid(format!("incomplete match {} has a winner", m.id)));
            }

            if let Some(link) = &m.next_match {
                let Some(target) = self.get_match(link.match_id) else {
                    return Err(invalid(format!(
                        "match {} links to unknown match {}",
                        m.id, link.match_id
                    )));
                };
                if target.round != m.round + 1 {
                    return Err(invalid(format!(
                        "match {} links across rounds {} -> {}",
                        m.id, m.round, target.round
                    )));
                }
                if !fed_slots.insert((link.match_id, link.slot)) {
                    return Err(invalid(format!(
                        "two matches feed the same slot of {}",
                        link.match_id
                    )));
                }
            }
        }
        for m in self.matches_in_round(self.total_rounds) {
            if m.next_match.is_some() {
                return Err(invalid("final match must not have a forward link"));
            }
        }

        let final_complete = self.final_match().map_or(false, |m| m.is_complete);
        if self.is_complete != final_complete {
            return Err(invalid("completion flag disagrees with the final match"));
        }
        Ok(())
    }
}
