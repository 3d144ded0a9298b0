//! HTTP API handlers.
//!
//! `/api/defender/*` is what the relay calls while resolving attacks on this
//! player. The rest is the player's own surface: firing through the relay
//! and auditing the opponent after the match.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use seabattle_core::crypto::BlindedQuery;
use seabattle_core::protocol::{HitAnswer, StrikeRequest};
use seabattle_core::{audit_reveal, Defender, GameError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::state::PlayerState;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct FireRequest {
    pub x: i32,
    pub y: i32,
}

fn error(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// ============ Defender API (called by the relay) ============

pub async fn answer(
    State(state): State<PlayerState>,
    Json(query): Json<BlindedQuery>,
) -> impl IntoResponse {
    let coordinate = query.coordinate();
    let answered = tokio::task::spawn_blocking(move || state.answer(&query)).await;

    match answered {
        Ok(Ok(hit)) => (StatusCode::OK, Json(serde_json::json!(HitAnswer { hit }))),
        Ok(Err(e)) => {
            warn!("Refused query at {}: {}", coordinate, e);
            error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Decryption task failed: {}", e),
        ),
    }
}

pub async fn strike(
    State(state): State<PlayerState>,
    Json(req): Json<StrikeRequest>,
) -> impl IntoResponse {
    let result = state.defender().record_strike(req.coordinate, req.hit);
    match result {
        Ok(effect) => {
            if let Some(ship) = effect.sunk {
                info!("{}'s {} was sunk", state.player(), ship);
            }
            (StatusCode::OK, Json(serde_json::json!(effect)))
        }
        Err(e) => {
            warn!("Refused strike at {}: {}", req.coordinate, e);
            error(StatusCode::CONFLICT, e.to_string())
        }
    }
}

pub async fn fleet(State(state): State<PlayerState>) -> impl IntoResponse {
    let summary = state.defender().fleet_summary(state.player());
    match summary {
        Ok(summary) => (StatusCode::OK, Json(serde_json::json!(summary))),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Open the board, but only once the relay reports the match as concluded.
pub async fn reveal(State(state): State<PlayerState>) -> impl IntoResponse {
    let published = match state.relay().transcript(state.match_id()).await {
        Ok(published) => published,
        Err(e) => return error(StatusCode::BAD_GATEWAY, format!("Relay unreachable: {}", e)),
    };
    if !published.transcript.concluded {
        return error(StatusCode::CONFLICT, GameError::MatchInProgress.to_string());
    }

    let reveal = state.defender().reveal();
    info!("Match {}: board opened for audit", state.match_id());
    (StatusCode::OK, Json(serde_json::json!(reveal)))
}

// ============ Player API ============

pub async fn fire(
    State(state): State<PlayerState>,
    Json(req): Json<FireRequest>,
) -> impl IntoResponse {
    let result = state
        .relay()
        .attack(state.match_id(), state.player(), req.x, req.y)
        .await;
    match result {
        Ok(envelope) if envelope.is_success() => {
            (StatusCode::OK, Json(serde_json::json!(envelope)))
        }
        Ok(envelope) => (StatusCode::BAD_REQUEST, Json(serde_json::json!(envelope))),
        Err(e) => error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

/// Fetch the opponent's reveal and check it against the relay's transcript
pub async fn audit(State(state): State<PlayerState>) -> impl IntoResponse {
    let published = match state.relay().transcript(state.match_id()).await {
        Ok(published) => published,
        Err(e) => return error(StatusCode::BAD_GATEWAY, format!("Relay unreachable: {}", e)),
    };
    if !published.transcript.concluded {
        return error(StatusCode::CONFLICT, GameError::MatchInProgress.to_string());
    }

    let opponent = state.player().opponent();
    let Some(endpoint) = published.endpoints.get(&opponent) else {
        return error(StatusCode::CONFLICT, format!("{} never joined", opponent));
    };
    let reveal = match state.relay().fetch_reveal(endpoint).await {
        Ok(reveal) => reveal,
        Err(e) => {
            return error(
                StatusCode::BAD_GATEWAY,
                format!("{} did not open their board: {}", opponent, e),
            )
        }
    };

    match audit_reveal(&published.transcript, opponent, &reveal) {
        Ok(report) => {
            info!(
                "Match {}: audit of {} {}",
                state.match_id(),
                opponent,
                if report.verified { "passed" } else { "FAILED" }
            );
            (StatusCode::OK, Json(serde_json::json!(report)))
        }
        Err(e) => error(StatusCode::CONFLICT, e.to_string()),
    }
}

pub async fn health() -> &'static str {
    "ok"
}
