//! Axum HTTP server: one in-memory game driven through JSON endpoints.
//!
//! The game lives in process memory behind a mutex; nothing is persisted.
//! Rule violations come back as 400 with an `error` message naming the
//! offending pairing, roll or player. Search-heavy endpoints run on the
//! blocking pool over a copy of the state.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/new_game` | Start a game for `num_players` (default 2) |
//! | GET | `/api/state` | Current game snapshot |
//! | GET | `/api/bust_status` | Whether the current player has busted |
//! | GET | `/api/debug` | Invariant check plus a flat state dump |
//! | POST | `/api/roll` | Roll for the current player |
//! | POST | `/api/apply_pairing` | Play `pairing` against the pending roll |
//! | POST | `/api/stop` | Bank the turn |
//! | POST | `/api/odds` | Exact bust and per-column advance odds |
//! | POST | `/api/coach/recommend` | Press-or-park advice, plus a pairing if a roll is pending |

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::constants::{COLUMNS, DEFAULT_ITERATIONS};
use crate::error::CantStopError;
use crate::game_mechanics::{has_busted, play_pairing, roll_turn, stop_turn};
use crate::mcts::{recommend_pairing_after_roll, recommend_press_or_park, RiskProfile};
use crate::odds::odds_report;
use crate::storage::GameSnapshot;
use crate::types::{new_game, validate_game_state, GameState};

/// Iteration bounds accepted from clients.
const MIN_COACH_ITERS: i64 = 100;
const MAX_COACH_ITERS: i64 = 10_000;

pub struct Session {
    game: Mutex<GameState>,
    rng: Mutex<SmallRng>,
}

pub type AppState = Arc<Session>;

impl Session {
    /// A fresh two-player game. `seed` fixes the dice for reproducible runs.
    pub fn new(seed: Option<u64>) -> Result<Self, CantStopError> {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::seed_from_u64(rand::random()),
        };
        Ok(Session {
            game: Mutex::new(new_game(2)?),
            rng: Mutex::new(rng),
        })
    }

    fn game(&self) -> MutexGuard<'_, GameState> {
        self.game.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn rng(&self) -> MutexGuard<'_, SmallRng> {
        self.rng.lock().unwrap_or_else(|p| p.into_inner())
    }
}

pub fn create_router(session: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/api/new_game", post(handle_new_game))
        .route("/api/state", get(handle_state))
        .route("/api/bust_status", get(handle_bust_status))
        .route("/api/debug", get(handle_debug))
        .route("/api/roll", post(handle_roll))
        .route("/api/apply_pairing", post(handle_apply_pairing))
        .route("/api/stop", post(handle_stop))
        .route("/api/odds", post(handle_odds))
        .route("/api/coach/recommend", post(handle_coach_recommend))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(session)
}

// ── Request/Response helpers ────────────────────────────────────────

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Deserialize, Default)]
struct NewGameRequest {
    num_players: Option<i64>,
}

#[derive(Deserialize, Default)]
struct ApplyPairingRequest {
    pairing: Option<Vec<i64>>,
}

#[derive(Deserialize, Default)]
struct CoachRequest {
    iters: Option<i64>,
    risk: Option<String>,
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "ok": false, "error": msg })))
}

fn rejected(err: CantStopError) -> (StatusCode, Json<Value>) {
    warn!(error = %err, "request rejected");
    let status = match err {
        CantStopError::InconsistentState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, &err.to_string())
}

/// Parse an optional JSON body; an empty body yields the default request.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, (StatusCode, Json<Value>)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {}", e))
    })
}

fn snapshot(state: &GameState) -> Value {
    json!(GameSnapshot::from(state))
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn handle_state(State(session): State<AppState>) -> Json<Value> {
    Json(json!({ "state": snapshot(&session.game()) }))
}

async fn handle_bust_status(State(session): State<AppState>) -> Json<Value> {
    let busted = has_busted(&session.game());
    let message = if busted {
        "Bust! Turn will end automatically."
    } else {
        "Turn is active."
    };
    Json(json!({
        "busted": busted,
        "can_stop": !busted,
        "message": message,
    }))
}

async fn handle_debug(State(session): State<AppState>) -> Json<Value> {
    let game = session.game();
    let issues = validate_game_state(&game);
    let claimed_columns: Vec<u8> = COLUMNS
        .iter()
        .copied()
        .filter(|&c| game.claimed_by[c as usize].is_some())
        .collect();
    let player_positions: serde_json::Map<String, Value> = game
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let pos: serde_json::Map<String, Value> = COLUMNS
                .iter()
                .map(|&c| (c.to_string(), json!(p.permanent_pos[c as usize])))
                .collect();
            (
                format!("player_{}", i),
                json!({ "permanent_pos": pos, "claimed": p.claimed_columns() }),
            )
        })
        .collect();

    Json(json!({
        "ok": true,
        "debug": {
            "state_valid": issues.is_empty(),
            "validation_errors": issues,
            "current_player": game.current,
            "num_players": game.num_players(),
            "winner": game.winner,
            "active_runners_count": game.turn.active_runners.len(),
            "free_runners": game.turn.free_runners(),
            "has_last_roll": game.turn.last_roll.is_some(),
            "claimed_columns": claimed_columns,
            "player_positions": player_positions,
        }
    }))
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_new_game(State(session): State<AppState>, body: Bytes) -> ApiResult {
    let req: NewGameRequest = parse_body(&body)?;
    let num_players = req.num_players.unwrap_or(2);
    let state = usize::try_from(num_players)
        .map_err(|_| CantStopError::InvalidConfiguration { num_players: 0 })
        .and_then(new_game)
        .map_err(|_| {
            warn!(num_players, "new game rejected");
            error_response(
                StatusCode::BAD_REQUEST,
                "Number of players must be between 2 and 4",
            )
        })?;

    info!(num_players, "new game");
    let mut game = session.game();
    *game = state;
    Ok(Json(json!({ "ok": true, "state": snapshot(&game) })))
}

async fn handle_roll(State(session): State<AppState>) -> ApiResult {
    let mut game = session.game();
    let player = game.current;
    let report = roll_turn(&mut game, &mut *session.rng()).map_err(rejected)?;

    let mut body = json!({
        "roll": report.roll,
        "pairings": report.pairings,
        "busted": report.busted,
        "state": snapshot(&game),
    });
    if report.busted {
        info!(player, roll = ?report.roll, "bust");
        body["message"] = json!("Bust! Turn ended automatically.");
    }
    Ok(Json(body))
}

async fn handle_apply_pairing(State(session): State<AppState>, body: Bytes) -> ApiResult {
    let req: ApplyPairingRequest = parse_body(&body)?;
    let pairing = match req.pairing.as_deref() {
        Some(&[a, b]) => match (u8::try_from(a), u8::try_from(b)) {
            (Ok(a), Ok(b)) => (a, b),
            _ => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "pairing values must be column numbers",
                ))
            }
        },
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "pairing must be a list of 2 integers",
            ))
        }
    };

    let mut game = session.game();
    let player = game.current;
    let report = play_pairing(&mut game, pairing).map_err(rejected)?;

    let mut body = json!({
        "ok": true,
        "info": report.outcome,
        "state": snapshot(&game),
        "busted": report.busted,
    });
    if report.busted {
        info!(player, ?pairing, "bust after pairing");
        body["message"] = json!("Bust after applying pairing! Turn ended automatically.");
    }
    Ok(Json(body))
}

async fn handle_stop(State(session): State<AppState>) -> ApiResult {
    let mut game = session.game();
    let player = game.current;
    stop_turn(&mut game).map_err(rejected)?;
    info!(player, winner = ?game.winner, "turn banked");
    Ok(Json(json!({ "ok": true, "state": snapshot(&game) })))
}

async fn handle_odds(State(session): State<AppState>) -> ApiResult {
    let state = session.game().clone();
    let report = tokio::task::spawn_blocking(move || odds_report(&state))
        .await
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Odds calculation failed: {}", e),
            )
        })?;
    Ok(Json(json!(report)))
}

async fn handle_coach_recommend(State(session): State<AppState>, body: Bytes) -> ApiResult {
    let req: CoachRequest = parse_body(&body)?;
    let iters = req
        .iters
        .unwrap_or(DEFAULT_ITERATIONS as i64)
        .clamp(MIN_COACH_ITERS, MAX_COACH_ITERS) as usize;
    let risk = req
        .risk
        .as_deref()
        .and_then(|r| r.parse::<RiskProfile>().ok())
        .unwrap_or_default();

    let state = session.game().clone();
    let result = tokio::task::spawn_blocking(move || -> Result<_, CantStopError> {
        let recommendation = recommend_press_or_park(&state, iters, 0, risk);
        let pairing = match state.turn.last_roll {
            Some(roll) => Some(recommend_pairing_after_roll(
                &state,
                roll,
                (iters / 2).max(500),
                1,
                risk,
            )?),
            None => None,
        };
        Ok((recommendation, pairing))
    })
    .await
    .map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Coach recommendation failed: {}", e),
        )
    })?;
    let (recommendation, pairing) = result.map_err(rejected)?;

    Ok(Json(json!({
        "recommendation": recommendation,
        "pairing": pairing,
        "iters": iters,
        "risk": risk,
    })))
}
