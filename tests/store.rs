//! Store behavior: the persistence hook and change notifications.

use knockout_tournament_web::{
    MemoryStorage, StorageBackend, Tournament, TournamentError, TournamentStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn entrants(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

/// A backend whose snapshot outlives the store, so a second store can load
/// what the first one saved.
#[derive(Clone, Default)]
struct SharedStorage {
    snapshot: Arc<Mutex<Option<String>>>,
}

impl StorageBackend for SharedStorage {
    fn load(&self) -> Result<Option<Tournament>, String> {
        let guard = self.snapshot.lock().map_err(|_| "lock error".to_string())?;
        match guard.as_deref() {
            Some(json) => knockout_tournament_web::import_tournament(json)
                .map(Some)
                .map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    fn save(&self, tournament: &Tournament) -> Result<(), String> {
        let payload =
            knockout_tournament_web::export_tournament(tournament).map_err(|e| e.to_string())?;
        *self.snapshot.lock().map_err(|_| "lock error".to_string())? = Some(payload);
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        *self.snapshot.lock().map_err(|_| "lock error".to_string())? = None;
        Ok(())
    }
}

/// A backend that always fails to save.
struct BrokenStorage;

impl StorageBackend for BrokenStorage {
    fn load(&self) -> Result<Option<Tournament>, String> {
        Ok(None)
    }

    fn save(&self, _tournament: &Tournament) -> Result<(), String> {
        Err("disk full".to_string())
    }

    fn clear(&self) -> Result<(), String> {
        Err("disk full".to_string())
    }
}

#[test]
fn starts_empty_with_a_fresh_backend() {
    let store = TournamentStore::new(Box::new(MemoryStorage::new()));
    assert!(store.current().is_none());
    assert!(matches!(
        store.export(),
        Err(TournamentError::NoTournament)
    ));
}

#[test]
fn mutations_on_an_empty_store_are_rejected() {
    let mut store = TournamentStore::new(Box::new(MemoryStorage::new()));
    assert!(matches!(
        store.declare_winner(uuid::Uuid::new_v4(), "P0"),
        Err(TournamentError::NoTournament)
    ));
    assert!(matches!(
        store.reopen_match(uuid::Uuid::new_v4()),
        Err(TournamentError::NoTournament)
    ));
}

#[test]
fn create_persists_and_a_new_store_reloads_it() {
    let backend = SharedStorage::default();
    let mut store = TournamentStore::new(Box::new(backend.clone()));
    store.create("Cup", &entrants(4)).unwrap();
    let created = store.current().unwrap().clone();
    drop(store);

    let store = TournamentStore::new(Box::new(backend));
    assert_eq!(store.current(), Some(&created));
}

#[test]
fn every_successful_mutation_persists() {
    let backend = SharedStorage::default();
    let mut store = TournamentStore::new(Box::new(backend.clone()));
    store.create("Cup", &entrants(4)).unwrap();
    let (id, winner) = {
        let t = store.current().unwrap();
        let m = t.matches_in_round(1)[0];
        (m.id, m.player1.clone().unwrap())
    };
    store.declare_winner(id, &winner).unwrap();

    let reloaded = TournamentStore::new(Box::new(backend.clone()));
    let m = reloaded.current().unwrap().get_match(id).unwrap();
    assert!(m.is_complete);

    store.reopen_match(id).unwrap();
    let reloaded = TournamentStore::new(Box::new(backend));
    let m = reloaded.current().unwrap().get_match(id).unwrap();
    assert!(!m.is_complete);
}

#[test]
fn subscribers_fire_after_each_change_only() {
    let mut store = TournamentStore::new(Box::new(MemoryStorage::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    store.subscribe(Box::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    store.create("Cup", &entrants(4)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Failed mutations notify nobody.
    let _ = store.declare_winner(uuid::Uuid::new_v4(), "P0");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let (id, winner) = {
        let t = store.current().unwrap();
        let m = t.matches_in_round(1)[0];
        (m.id, m.player1.clone().unwrap())
    };
    store.declare_winner(id, &winner).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    store.reopen_match(id).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    store.clear();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn subscriber_sees_the_new_state() {
    let mut store = TournamentStore::new(Box::new(MemoryStorage::new()));
    let last_round: Arc<Mutex<Option<u32>>> = Arc::new(Mutex::new(None));
    let sink = last_round.clone();
    store.subscribe(Box::new(move |t| {
        *sink.lock().unwrap() = t.map(|t| t.current_round);
    }));

    store.create("Cup", &entrants(2)).unwrap();
    assert_eq!(*last_round.lock().unwrap(), Some(1));
    store.clear();
    assert_eq!(*last_round.lock().unwrap(), None);
}

#[test]
fn a_failing_save_does_not_roll_back() {
    let mut store = TournamentStore::new(Box::new(BrokenStorage));
    store.create("Cup", &entrants(4)).unwrap();
    assert!(store.current().is_some());
    store.clear();
    assert!(store.current().is_none());
}

#[test]
fn clear_drops_current_and_persisted_state() {
    let backend = SharedStorage::default();
    let mut store = TournamentStore::new(Box::new(backend.clone()));
    store.create("Cup", &entrants(4)).unwrap();
    store.clear();
    assert!(store.current().is_none());
    assert!(backend.snapshot.lock().unwrap().is_none());

    let store = TournamentStore::new(Box::new(backend));
    assert!(store.current().is_none());
}

#[test]
fn import_replaces_the_current_tournament_and_persists() {
    let backend = SharedStorage::default();
    let mut store = TournamentStore::new(Box::new(backend.clone()));
    store.create("First Cup", &entrants(4)).unwrap();
    let snapshot = store.export().unwrap();
    let original = store.current().unwrap().clone();

    store.create("Second Cup", &entrants(8)).unwrap();
    assert_eq!(store.current().unwrap().name, "Second Cup");

    store.import(&snapshot).unwrap();
    assert_eq!(store.current(), Some(&original));

    // The imported state reached the backend, not just memory.
    let reloaded = TournamentStore::new(Box::new(backend));
    assert_eq!(reloaded.current(), Some(&original));
}

#[test]
fn import_of_a_bad_snapshot_keeps_the_current_state() {
    let mut store = TournamentStore::new(Box::new(MemoryStorage::new()));
    store.create("Cup", &entrants(4)).unwrap();
    let before = store.current().unwrap().clone();
    assert!(matches!(
        store.import("{\"bogus\": true}"),
        Err(TournamentError::MalformedSnapshot(_))
    ));
    assert_eq!(store.current(), Some(&before));
}

#[test]
fn a_corrupt_persisted_file_yields_an_empty_store() {
    let backend = SharedStorage::default();
    *backend.snapshot.lock().unwrap() = Some("garbage".to_string());
    let store = TournamentStore::new(Box::new(backend));
    assert!(store.current().is_none());
}
