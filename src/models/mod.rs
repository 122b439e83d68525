//! Data structures for the knockout bracket: matches, links, tournament state.

mod bracket;
mod tournament;

pub use bracket::{BracketMatch, ForwardLink, MatchId, Slot};
pub use tournament::{Tournament, TournamentError, TournamentId};
