//! Snapshot export/import and the persistence hook.
//!
//! The engine itself never touches disk: a tournament serializes to a JSON
//! snapshot and `StorageBackend` supplies the transport. Backend failures
//! are reported as strings and never roll back in-memory state.

use crate::models::{Tournament, TournamentError};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Serialize a tournament to its snapshot form (pretty-printed JSON).
pub fn export_tournament(tournament: &Tournament) -> Result<String, TournamentError> {
    serde_json::to_string_pretty(tournament)
        .map_err(|e| TournamentError::MalformedSnapshot(e.to_string()))
}

/// Parse and validate a snapshot produced by [`export_tournament`].
///
/// Both parse failures and bracket-invariant violations come back as
/// `MalformedSnapshot`; the current state is never replaced by a bad one.
pub fn import_tournament(json: &str) -> Result<Tournament, TournamentError> {
    let tournament: Tournament =
        serde_json::from_str(json).map_err(|e| TournamentError::MalformedSnapshot(e.to_string()))?;
    tournament.validate()?;
    Ok(tournament)
}

/// Where tournaments persist between runs.
///
/// The store calls `load` once at startup and `save` after every successful
/// mutation; `clear` removes the persisted snapshot when the tournament is
/// deleted.
pub trait StorageBackend {
    fn load(&self) -> Result<Option<Tournament>, String>;
    fn save(&self, tournament: &Tournament) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
}

/// JSON file transport. A missing file means no tournament.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> Result<Option<Tournament>, String> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .map_err(|e| format!("read {}: {e}", self.path.display()))?;
        let tournament = import_tournament(&data).map_err(|e| e.to_string())?;
        Ok(Some(tournament))
    }

    fn save(&self, tournament: &Tournament) -> Result<(), String> {
        let payload = export_tournament(tournament).map_err(|e| e.to_string())?;
        fs::write(&self.path, payload).map_err(|e| format!("write {}: {e}", self.path.display()))
    }

    fn clear(&self) -> Result<(), String> {
        if self.path.is_file() {
            fs::remove_file(&self.path)
                .map_err(|e| format!("remove {}: {e}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory transport: keeps the last saved snapshot. Useful in tests and
/// as a null backend when persistence is unwanted.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<Option<Tournament>, String> {
        let guard = self.snapshot.lock().map_err(|_| "lock error".to_string())?;
        match guard.as_deref() {
            Some(json) => import_tournament(json).map(Some).map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    fn save(&self, tournament: &Tournament) -> Result<(), String> {
        let payload = export_tournament(tournament).map_err(|e| e.to_string())?;
        *self.snapshot.lock().map_err(|_| "lock error".to_string())? = Some(payload);
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        *self.snapshot.lock().map_err(|_| "lock error".to_string())? = None;
        Ok(())
    }
}
