//! HTTP API handlers.
//!
//! A room's lock can be held across calls to a player service, so every
//! handler that touches a room does so on a blocking thread.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use seabattle_core::protocol::{MatchStarted, SeatRequest};
use seabattle_core::{Arbiter, GameState, MatchId, Player};
use serde::Deserialize;
use serde_json::Value;
use tokio::runtime::Handle;

use crate::remote::RemoteDefender;
use crate::state::{lock, AppState, MatchRoom, SharedMatch};

type ApiResponse = (StatusCode, Json<Value>);

// ============ Request/Response types ============

#[derive(Deserialize)]
pub struct AttackRequest {
    pub player: String,
    pub x: i32,
    pub y: i32,
}

// ============ Helpers ============

fn error(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

fn find_match(state: &AppState, match_id: &str) -> Result<SharedMatch, ApiResponse> {
    let id: MatchId = match_id
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Invalid match id"))?;
    state
        .get(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Match not found"))
}

/// Run `f` under the room's lock on a blocking thread
async fn with_room<T, F>(room: SharedMatch, f: F) -> Result<T, ApiResponse>
where
    T: Send + 'static,
    F: FnOnce(&mut MatchRoom<RemoteDefender>) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = lock(&room);
        f(&mut *guard)
    })
    .await
    .map_err(|e| {
        error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Match task failed: {}", e),
        )
    })
}

fn is_http_url(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

// ============ Match handlers ============

pub async fn create_match(State(state): State<AppState>) -> impl IntoResponse {
    let Some(match_id) = state.insert(Arbiter::new()) else {
        return error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Relay is full, try again later",
        );
    };
    tracing::info!(
        "Created match {} ({} active)",
        match_id,
        state.match_count()
    );

    let response = MatchStarted::new(match_id, GameState::FIRST_TURN);
    (StatusCode::OK, Json(serde_json::json!(response)))
}

/// Seat a player from public material: the sealed snapshot, the commitment
/// and the URL of the service that answers for the board.
pub async fn join(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(req): Json<SeatRequest>,
) -> impl IntoResponse {
    let room = match find_match(&state, &match_id) {
        Ok(room) => room,
        Err(resp) => return resp,
    };

    let bits = req.snapshot.public_key().bits();
    if bits < state.min_key_bits() {
        return error(
            StatusCode::BAD_REQUEST,
            format!(
                "A {}-bit modulus is too small, this relay needs {} bits",
                bits,
                state.min_key_bits()
            ),
        );
    }
    if !is_http_url(&req.endpoint) {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Endpoint {:?} is not an http(s) URL", req.endpoint),
        );
    }

    let player = req.player;
    let defender = RemoteDefender::new(
        req.endpoint.clone(),
        req.snapshot,
        req.commitment,
        state.http().clone(),
        Handle::current(),
    );
    let endpoint = defender.endpoint().to_string();
    let seated = with_room(room, move |room| room.seat(player, endpoint, defender)).await;

    match seated {
        Ok(Ok(started)) => {
            tracing::info!("Match {}: {} joined from {}", match_id, player, req.endpoint);
            (
                StatusCode::OK,
                Json(serde_json::json!({ "player": player, "started": started })),
            )
        }
        Ok(Err(e)) => error(StatusCode::CONFLICT, e.to_string()),
        Err(resp) => resp,
    }
}

pub async fn attack(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(req): Json<AttackRequest>,
) -> impl IntoResponse {
    let room = match find_match(&state, &match_id) {
        Ok(room) => room,
        Err(resp) => return resp,
    };
    let player: Player = match req.player.parse() {
        Ok(player) => player,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let outcome = with_room(room, move |room| {
        room.arbiter_mut().submit_attack(player, req.x, req.y)
    })
    .await;

    match outcome {
        Ok(Ok(envelope)) if envelope.is_success() => {
            (StatusCode::OK, Json(serde_json::json!(envelope)))
        }
        Ok(Ok(envelope)) => (StatusCode::BAD_REQUEST, Json(serde_json::json!(envelope))),
        Ok(Err(e)) => error(StatusCode::CONFLICT, e.to_string()),
        Err(resp) => resp,
    }
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    let room = match find_match(&state, &match_id) {
        Ok(room) => room,
        Err(resp) => return resp,
    };
    match with_room(room, |room| room.arbiter().query_status()).await {
        Ok(Ok(status)) => (StatusCode::OK, Json(serde_json::json!(status))),
        Ok(Err(e)) => error(StatusCode::CONFLICT, e.to_string()),
        Err(resp) => resp,
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    let room = match find_match(&state, &match_id) {
        Ok(room) => room,
        Err(resp) => return resp,
    };
    match with_room(room, |room| room.arbiter().history().to_vec()).await {
        Ok(history) => (StatusCode::OK, Json(serde_json::json!({ "history": history }))),
        Err(resp) => resp,
    }
}

/// Commitments, history and player endpoints. Players audit each other
/// against this; the relay never sees a reveal.
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    let room = match find_match(&state, &match_id) {
        Ok(room) => room,
        Err(resp) => return resp,
    };
    match with_room(room, |room| room.transcript()).await {
        Ok(transcript) => (StatusCode::OK, Json(serde_json::json!(transcript))),
        Err(resp) => resp,
    }
}

pub async fn health() -> &'static str {
    "ok"
}
