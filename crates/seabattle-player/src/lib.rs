//! Seabattle Player
//!
//! One player's side of a relayed match. The service generates its own
//! Paillier keypair and fleet, sends the relay only the sealed snapshot and
//! the board commitment, and answers each blinded query with a single hit
//! bit. After the match it opens its board to the opponent, never to the
//! relay, and audits the opponent's board in turn.

pub mod client;
pub mod config;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub use client::{ClientError, RelayClient};
pub use state::PlayerState;

use handlers::*;

pub fn app(state: PlayerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/defender/answer", post(answer))
        .route("/api/defender/strike", post(strike))
        .route("/api/defender/fleet", get(fleet))
        .route("/api/reveal", get(reveal))
        .route("/api/fire", post(fire))
        .route("/api/audit", get(audit))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seabattle_core::crypto::{blind_query, BlindingScalar};
    use seabattle_core::protocol::StrikeRequest;
    use seabattle_core::{Board, Coordinate, Defender, KeyPair, LocalDefender, MatchId, Player, ShipClass};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Nothing listens here, so relay calls fail fast
    const DEAD_RELAY: &str = "http://127.0.0.1:9";

    fn test_state(rng: &mut StdRng) -> PlayerState {
        let cells = vec![Coordinate::new(7, 9).unwrap(), Coordinate::new(8, 9).unwrap()];
        let board = Board::from_layout([(ShipClass::PatrolBoat, cells)]).unwrap();
        let keys = KeyPair::generate(256, rng);
        PlayerState::new(
            Player::Bob,
            MatchId::new(),
            LocalDefender::new(board, keys, rng),
            RelayClient::new(DEAD_RELAY),
        )
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn test_answers_blinded_queries() {
        let mut rng = StdRng::seed_from_u64(61);
        let state = test_state(&mut rng);
        let snapshot = state.defender().snapshot().clone();
        let app = app(state);

        for (x, y, hit) in [(7, 9, true), (3, 3, false)] {
            let c = Coordinate::new(x, y).unwrap();
            let scalar = BlindingScalar::sample(snapshot.public_key(), &mut rng);
            let query = blind_query(&snapshot, c, scalar);

            let (status, body) =
                send(&app, "POST", "/api/defender/answer", Some(json!(query))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["hit"], hit);
        }
    }

    #[tokio::test]
    async fn test_refuses_query_for_another_key() {
        let mut rng = StdRng::seed_from_u64(62);
        let app = app(test_state(&mut rng));
        let other = test_state(&mut rng);
        let foreign = other.defender().snapshot().clone();

        let scalar = BlindingScalar::sample(foreign.public_key(), &mut rng);
        let query = blind_query(&foreign, Coordinate::new(7, 9).unwrap(), scalar);
        let (status, body) = send(&app, "POST", "/api/defender/answer", Some(json!(query))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("different public key"));
    }

    #[tokio::test]
    async fn test_strikes_and_fleet() {
        let mut rng = StdRng::seed_from_u64(63);
        let app = app(test_state(&mut rng));
        let strike = |x, y, hit| {
            json!(StrikeRequest {
                coordinate: Coordinate::new(x, y).unwrap(),
                hit,
            })
        };

        let (status, _) = send(&app, "POST", "/api/defender/strike", Some(strike(7, 9, false))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "POST", "/api/defender/strike", Some(strike(7, 9, true))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hit"], true);
        assert!(body["sunk"].is_null());

        let (_, body) = send(&app, "POST", "/api/defender/strike", Some(strike(8, 9, true))).await;
        assert_eq!(body["sunk"], "PatrolBoat");
        assert_eq!(body["fleet_destroyed"], true);

        let (status, body) = send(&app, "GET", "/api/defender/fleet", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["player"], "Bob");
        assert_eq!(body["all_sunk"], true);
        assert!(body.to_string().find("cells").is_none());
    }

    #[tokio::test]
    async fn test_no_reveal_without_relay_confirmation() {
        let mut rng = StdRng::seed_from_u64(64);
        let app = app(test_state(&mut rng));

        let (status, body) = send(&app, "GET", "/api/reveal", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("ships").is_none());
    }
}
