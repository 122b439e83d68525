//! Snapshot round-trips and import validation.

use knockout_tournament_web::{
    create_tournament, declare_winner, export_tournament, import_tournament, Tournament,
    TournamentError,
};
use serde_json::Value;

fn entrants(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

fn sample_tournament() -> Tournament {
    create_tournament("Cup", &entrants(5)).unwrap()
}

/// Export to JSON, apply `mutate` to the parsed document, and re-import.
fn import_doctored(
    t: &Tournament,
    mutate: impl FnOnce(&mut Value),
) -> Result<Tournament, TournamentError> {
    let mut doc: Value = serde_json::from_str(&export_tournament(t).unwrap()).unwrap();
    mutate(&mut doc);
    import_tournament(&doc.to_string())
}

#[test]
fn round_trip_preserves_everything() {
    let t = sample_tournament();
    let snapshot = export_tournament(&t).unwrap();
    let restored = import_tournament(&snapshot).unwrap();
    assert_eq!(restored, t);
    assert_eq!(restored.created_at, t.created_at);
}

#[test]
fn round_trip_preserves_mid_tournament_state() {
    let mut t = sample_tournament();
    let open: Vec<_> = t
        .matches_in_round(1)
        .iter()
        .filter(|m| !m.is_complete)
        .map(|m| (m.id, m.player1.clone().unwrap()))
        .collect();
    for (id, winner) in open {
        declare_winner(&mut t, id, &winner).unwrap();
    }
    // Round 1 is done, a bye was injected into round 2: a state with every
    // kind of match present.
    let restored = import_tournament(&export_tournament(&t).unwrap()).unwrap();
    assert_eq!(restored, t);
}

#[test]
fn import_rejects_non_json() {
    assert!(matches!(
        import_tournament("not a snapshot"),
        Err(TournamentError::MalformedSnapshot(_))
    ));
    assert!(matches!(
        import_tournament("{}"),
        Err(TournamentError::MalformedSnapshot(_))
    ));
}

#[test]
fn import_rejects_too_few_entrants() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        doc["players"] = serde_json::json!(["P0"]);
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_wrong_total_rounds() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        doc["total_rounds"] = serde_json::json!(9);
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_current_round_out_of_range() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        doc["current_round"] = serde_json::json!(0);
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_winner_outside_the_match() {
    let t = sample_tournament();
    // Claim the first real pairing was won by someone who never played in it.
    let result = import_doctored(&t, |doc| {
        let m = doc["matches"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|m| m["is_bye"] == Value::Bool(false))
            .unwrap();
        m["winner"] = serde_json::json!("Intruder");
        m["is_complete"] = serde_json::json!(true);
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_incomplete_bye() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        let m = doc["matches"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|m| m["is_bye"] == Value::Bool(true))
            .unwrap();
        m["is_complete"] = serde_json::json!(false);
        m["winner"] = Value::Null;
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_dangling_forward_link() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        let m = doc["matches"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|m| !m["next_match"].is_null())
            .unwrap();
        m["next_match"]["match_id"] =
            serde_json::json!("00000000-0000-0000-0000-000000000000");
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_unknown_occupant() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        let m = doc["matches"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|m| m["is_bye"] == Value::Bool(false))
            .unwrap();
        m["player1"] = serde_json::json!("Gatecrasher");
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_rejects_missing_matches() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        doc["matches"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn import_admits_an_appended_bye_round() {
    // A round may hold one extra bye match (appended when no open slot was
    // left for a granted bye); the round after it keeps its built size.
    let t = create_tournament("Cup", &entrants(8)).unwrap();
    let occupant = t.players[0].clone();
    let result = import_doctored(&t, |doc| {
        doc["matches"].as_array_mut().unwrap().push(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "round": 2,
            "player1": occupant.clone(),
            "player2": null,
            "winner": occupant,
            "is_bye": true,
            "is_complete": true,
            "next_match": null,
        }));
    });
    assert!(result.is_ok());
}

#[test]
fn import_rejects_completion_flag_mismatch() {
    let t = sample_tournament();
    let result = import_doctored(&t, |doc| {
        doc["is_complete"] = serde_json::json!(true);
    });
    assert!(matches!(result, Err(TournamentError::MalformedSnapshot(_))));
}

#[test]
fn snapshot_uses_snake_case_fields() {
    let t = sample_tournament();
    let doc: Value = serde_json::from_str(&export_tournament(&t).unwrap()).unwrap();
    assert!(doc.get("total_rounds").is_some());
    assert!(doc.get("current_round").is_some());
    assert!(doc.get("created_at").is_some());
    let m = &doc["matches"][0];
    assert!(m.get("is_bye").is_some());
    assert!(m.get("is_complete").is_some());
    assert!(m.get("next_match").is_some());
}
