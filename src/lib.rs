//! Knockout tournament web app: library with the bracket engine, snapshot
//! storage, and the current-tournament store.

pub mod logic;
pub mod models;
pub mod storage;
pub mod store;

pub use logic::{create_tournament, declare_winner, reopen_match};
pub use models::{
    BracketMatch, ForwardLink, MatchId, Slot, Tournament, TournamentError, TournamentId,
};
pub use storage::{export_tournament, import_tournament, FileStorage, MemoryStorage, StorageBackend};
pub use store::{Subscriber, TournamentStore};
