//! Match (bracket node), Slot, and ForwardLink for the single-elimination tree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which of a match's two player slots a forward link feeds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    First,
    Second,
}

/// Directed edge from a match to the next-round match its winner advances into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ForwardLink {
    pub match_id: MatchId,
    pub slot: Slot,
}

/// A single bracket node: two player slots (either may still be undetermined),
/// an optional winner, and the stored link to the match the winner feeds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    /// Round number, 1-based.
    pub round: u32,
    pub player1: Option<String>,
    pub player2: Option<String>,
    /// None until decided.
    pub winner: Option<String>,
    pub is_bye: bool,
    pub is_complete: bool,
    /// Forward link; None for the final (and for an odd round's trailing
    /// match until the round-completion check assigns it).
    pub next_match: Option<ForwardLink>,
}

impl BracketMatch {
    /// Empty skeleton for a later round; slots are filled by propagation.
    pub fn new(round: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            player1: None,
            player2: None,
            winner: None,
            is_bye: false,
            is_complete: false,
            next_match: None,
        }
    }

    /// A pairing of two entrants, waiting for a result.
    pub fn pairing(round: u32, player1: impl Into<String>, player2: impl Into<String>) -> Self {
        Self {
            player1: Some(player1.into()),
            player2: Some(player2.into()),
            ..Self::new(round)
        }
    }

    /// A completed bye: a single occupant who advances without playing.
    pub fn bye(round: u32, player: impl Into<String>) -> Self {
        let player = player.into();
        Self {
            player1: Some(player.clone()),
            winner: Some(player),
            is_bye: true,
            is_complete: true,
            ..Self::new(round)
        }
    }

    /// Occupant of the given slot, if any.
    pub fn slot(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::First => self.player1.as_deref(),
            Slot::Second => self.player2.as_deref(),
        }
    }

    /// Write an occupant into the given slot.
    pub fn set_slot(&mut self, slot: Slot, player: impl Into<String>) {
        match slot {
            Slot::First => self.player1 = Some(player.into()),
            Slot::Second => self.player2 = Some(player.into()),
        }
    }

    /// Empty the given slot.
    pub fn clear_slot(&mut self, slot: Slot) {
        match slot {
            Slot::First => self.player1 = None,
            Slot::Second => self.player2 = None,
        }
    }

    /// First open slot (First before Second), if the match still has room.
    pub fn open_slot(&self) -> Option<Slot> {
        if self.player1.is_none() {
            Some(Slot::First)
        } else if self.player2.is_none() {
            Some(Slot::Second)
        } else {
            None
        }
    }

    /// Whether `name` occupies one of the two slots.
    pub fn has_player(&self, name: &str) -> bool {
        self.player1.as_deref() == Some(name) || self.player2.as_deref() == Some(name)
    }
}
