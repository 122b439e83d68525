//! The current-tournament holder: one tournament at a time, persisted after
//! every mutation, with change subscriptions.

use crate::logic;
use crate::models::{MatchId, Tournament, TournamentError};
use crate::storage::{self, StorageBackend};

/// Callback fired after each state change with the new state (None once the
/// tournament has been cleared).
pub type Subscriber = Box<dyn Fn(Option<&Tournament>) + Send + Sync>;

/// Holds the single current tournament, persists it through a
/// [`StorageBackend`] after every successful mutation, and notifies
/// subscribers of each change.
///
/// All mutating methods take `&mut self`; callers that share a store across
/// threads wrap it in one lock, which also keeps the mutate-persist-notify
/// sequence atomic.
pub struct TournamentStore {
    current: Option<Tournament>,
    backend: Box<dyn StorageBackend + Send + Sync>,
    subscribers: Vec<Subscriber>,
}

impl TournamentStore {
    /// Create a store over `backend`, loading any persisted tournament.
    /// A failed load is logged and the store starts empty.
    pub fn new(backend: Box<dyn StorageBackend + Send + Sync>) -> Self {
        let current = match backend.load() {
            Ok(tournament) => tournament,
            Err(e) => {
                log::warn!("Failed to load persisted tournament: {e}");
                None
            }
        };
        Self {
            current,
            backend,
            subscribers: Vec::new(),
        }
    }

    /// The current tournament, if one is loaded.
    pub fn current(&self) -> Option<&Tournament> {
        self.current.as_ref()
    }

    /// Register a callback fired after every state change.
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    /// Create a new tournament, replacing any current one.
    pub fn create(&mut self, name: &str, entrants: &[String]) -> Result<(), TournamentError> {
        let tournament = logic::create_tournament(name, entrants)?;
        self.current = Some(tournament);
        self.persist_and_notify();
        Ok(())
    }

    /// Declare a winner on the current tournament.
    pub fn declare_winner(&mut self, match_id: MatchId, winner: &str) -> Result<(), TournamentError> {
        let tournament = self.current.as_mut().ok_or(TournamentError::NoTournament)?;
        logic::declare_winner(tournament, match_id, winner)?;
        self.persist_and_notify();
        Ok(())
    }

    /// Reopen a decided match on the current tournament.
    pub fn reopen_match(&mut self, match_id: MatchId) -> Result<(), TournamentError> {
        let tournament = self.current.as_mut().ok_or(TournamentError::NoTournament)?;
        logic::reopen_match(tournament, match_id)?;
        self.persist_and_notify();
        Ok(())
    }

    /// Replace the current state wholesale from an exported snapshot.
    /// The snapshot is validated before anything is replaced.
    pub fn import(&mut self, json: &str) -> Result<(), TournamentError> {
        let tournament = storage::import_tournament(json)?;
        self.current = Some(tournament);
        self.persist_and_notify();
        Ok(())
    }

    /// Snapshot of the current tournament.
    pub fn export(&self) -> Result<String, TournamentError> {
        let tournament = self.current.as_ref().ok_or(TournamentError::NoTournament)?;
        storage::export_tournament(tournament)
    }

    /// Drop the current tournament and its persisted snapshot.
    pub fn clear(&mut self) {
        self.current = None;
        if let Err(e) = self.backend.clear() {
            log::warn!("Failed to clear persisted tournament: {e}");
        }
        self.notify();
    }

    /// Persist the current state, then notify subscribers. A save failure is
    /// logged and never rolls back the in-memory change.
    fn persist_and_notify(&mut self) {
        if let Some(tournament) = &self.current {
            if let Err(e) = self.backend.save(tournament) {
                log::warn!("Failed to persist tournament {}: {e}", tournament.id);
            }
        }
        self.notify();
    }

    fn notify(&self) {
        for subscriber in &self.subscribers {
            subscriber(self.current.as_ref());
        }
    }
}
