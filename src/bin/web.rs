//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), TOURNAMENT_FILE (snapshot path).

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{self, Bytes, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use knockout_tournament_web::{FileStorage, MatchId, TournamentError, TournamentStore};
use serde::Deserialize;
use std::sync::RwLock;

/// In-memory state: the single current tournament behind one lock. The store
/// persists a snapshot to TOURNAMENT_FILE after every successful mutation.
type AppState = Data<RwLock<TournamentStore>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default)]
    name: String,
    players: Vec<String>,
}

#[derive(Deserialize)]
struct DeclareWinnerBody {
    match_id: MatchId,
    winner: String,
}

/// Path segment: match id (e.g. /api/tournament/matches/{match_id}/reopen)
#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

/// Path segment: round number (e.g. /api/tournament/rounds/{round})
#[derive(Deserialize)]
struct RoundPath {
    round: u32,
}

#[derive(Deserialize)]
struct ImportCsvQuery {
    #[serde(default)]
    name: String,
}

/// Missing tournament is a 404; everything else the engine rejects is a 400.
fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::NoTournament => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "knockout-tournament-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new tournament from a name and entrant list, replacing any
/// current one. Blank entries are dropped before the bracket is built.
#[post("/api/tournament")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let players: Vec<String> = body
        .players
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.create(&body.name, &players) {
        Ok(()) => HttpResponse::Ok().json(g.current()),
        Err(e) => error_response(&e),
    }
}

/// Get the current tournament (404 if none).
#[get("/api/tournament")]
async fn api_get_tournament(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.current() {
        Some(t) => HttpResponse::Ok().json(t),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Delete the current tournament and its persisted snapshot.
#[delete("/api/tournament")]
async fn api_delete_tournament(state: AppState) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.clear();
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Record a match result; the winner advances into the linked next-round slot.
#[put("/api/tournament/matches/winner")]
async fn api_declare_winner(state: AppState, body: Json<DeclareWinnerBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.declare_winner(body.match_id, body.winner.trim()) {
        Ok(()) => HttpResponse::Ok().json(g.current()),
        Err(e) => error_response(&e),
    }
}

/// Reopen a decided match; results in all later rounds are discarded.
#[post("/api/tournament/matches/{match_id}/reopen")]
async fn api_reopen_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.reopen_match(path.match_id) {
        Ok(()) => HttpResponse::Ok().json(g.current()),
        Err(e) => error_response(&e),
    }
}

/// Matches of one round, in creation order.
#[get("/api/tournament/rounds/{round}")]
async fn api_get_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.current() {
        Some(t) => HttpResponse::Ok().json(t.matches_in_round(path.round)),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// The tournament winner; null until the final is decided.
#[get("/api/tournament/champion")]
async fn api_get_champion(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.current() {
        Some(t) => HttpResponse::Ok().json(serde_json::json!({ "champion": t.champion() })),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Download the current tournament as a JSON snapshot.
#[get("/api/tournament/export")]
async fn api_export_tournament(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.export() {
        Ok(snapshot) => HttpResponse::Ok()
            .content_type("application/json")
            .body(snapshot),
        Err(e) => error_response(&e),
    }
}

/// Restore a tournament from a snapshot produced by the export endpoint.
/// The snapshot is validated; the current state survives a bad one.
#[post("/api/tournament/import")]
async fn api_import_tournament(state: AppState, body: Bytes) -> HttpResponse {
    let json = match std::str::from_utf8(&body) {
        Ok(s) => s,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Snapshot must be UTF-8" }))
        }
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.import(json) {
        Ok(()) => HttpResponse::Ok().json(g.current()),
        Err(e) => error_response(&e),
    }
}

/// Create a tournament from a CSV of entrant names: one name per row, first
/// column, no header row.
#[post("/api/tournament/import-csv")]
async fn api_import_csv(
    state: AppState,
    query: Query<ImportCsvQuery>,
    body: Bytes,
) -> HttpResponse {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_ref());
    let mut players = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": format!("Invalid CSV: {e}") }))
            }
        };
        if let Some(name) = record.get(0) {
            let name = name.trim();
            if !name.is_empty() {
                players.push(name.to_string());
            }
        }
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.create(&query.name, &players) {
        Ok(()) => HttpResponse::Ok().json(g.current()),
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_file() -> String {
    "tournament.json".to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_file = std::env::var("TOURNAMENT_FILE").unwrap_or_else(|_| default_data_file());
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let mut store = TournamentStore::new(Box::new(FileStorage::new(&data_file)));
    if let Some(t) = store.current() {
        log::info!("Loaded tournament '{}' from {}", t.name, data_file);
    }
    store.subscribe(Box::new(|t| match t {
        Some(t) => log::info!(
            "Tournament '{}' updated (round {}/{})",
            t.name,
            t.current_round,
            t.total_rounds
        ),
        None => log::info!("Tournament cleared"),
    }));
    let state = Data::new(RwLock::new(store));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_declare_winner)
            .service(api_reopen_match)
            .service(api_get_round)
            .service(api_get_champion)
            .service(api_export_tournament)
            .service(api_import_tournament)
            .service(api_import_csv)
            .service(Files::new("/static", "static").show_files_listing())
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
