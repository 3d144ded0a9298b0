//! Seabattle Relay
//!
//! Hosts private Battleship matches over HTTP. Players join with a sealed
//! snapshot, a board commitment and the URL of their own defender service;
//! keys and boards never leave the players. Every attack on a match runs
//! under that match's lock.

mod config;
mod handlers;
mod remote;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use handlers::*;
use state::AppState;

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/match", post(create_match))
        .route("/api/match/:match_id/join", post(join))
        .route("/api/match/:match_id/attack", post(attack))
        .route("/api/match/:match_id/status", get(get_status))
        .route("/api/match/:match_id/history", get(get_history))
        .route("/api/match/:match_id/transcript", get(get_transcript))
        .route("/api/health", get(health))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Accepting moduli of {}+ bits, up to {} matches, {}s each",
        config.min_key_bits,
        config.max_matches,
        config.match_ttl.as_secs()
    );

    let state: AppState = AppState::new(&config);
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Seabattle relay starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seabattle_core::{
        Board, Coordinate, Defender, KeyPair, LocalDefender, MatchId, Player, ShipClass,
    };
    use seabattle_player::{PlayerState, RelayClient};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    /// Nothing listens here, so calls to it fail fast
    const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

    fn test_config() -> Config {
        Config {
            min_key_bits: config::MIN_KEY_BITS,
            ..Config::default()
        }
    }

    fn test_app() -> Router {
        app(AppState::new(&test_config()))
    }

    fn patrol_boat(rng: &mut StdRng, cells: [(i32, i32); 2]) -> LocalDefender {
        let cells = cells
            .iter()
            .map(|&(x, y)| Coordinate::new(x, y).unwrap())
            .collect();
        let board = Board::from_layout([(ShipClass::PatrolBoat, cells)]).unwrap();
        LocalDefender::new(board, KeyPair::generate(config::MIN_KEY_BITS, rng), rng)
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

    async fn create(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/match", None).await;
        assert_eq!(status, StatusCode::OK);
        body["match_id"].as_str().unwrap().to_string()
    }

    fn seat(player: Player, endpoint: &str, defender: &LocalDefender) -> Value {
        json!({
            "player": player,
            "endpoint": endpoint,
            "snapshot": defender.snapshot(),
            "commitment": defender.commitment(),
        })
    }

    async fn fire(app: &Router, id: &str, player: &str, x: i32, y: i32) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            &format!("/api/match/{}/attack", id),
            Some(json!({ "player": player, "x": x, "y": y })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_string()));
    }

    #[tokio::test]
    async fn test_create_match() {
        let app = test_app();
        let (status, body) = send(&app, "POST", "/api/match", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_turn"], "Alice");
        assert_eq!(body["board_size"], 10);
        assert_eq!(body["ships_per_player"], 5);

        let id = body["match_id"].as_str().unwrap();
        let (status, body) = fire(&app, id, "Alice", 0, 0).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("not started"));
    }

    #[tokio::test]
    async fn test_full_relay_refuses_new_matches() {
        let app = app(AppState::new(&Config {
            max_matches: 1,
            ..test_config()
        }));
        create(&app).await;

        let (status, body) = send(&app, "POST", "/api/match", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("full"));
    }

    #[tokio::test]
    async fn test_join_takes_public_material_only() {
        let mut rng = StdRng::seed_from_u64(81);
        let app = test_app();
        let id = create(&app).await;
        let alice = patrol_boat(&mut rng, [(0, 0), (0, 1)]);
        let join_uri = format!("/api/match/{}/join", id);

        let weak = LocalDefender::new(
            alice.board().clone(),
            KeyPair::generate(128, &mut rng),
            &mut rng,
        );
        let (status, body) = send(&app, "POST", &join_uri, Some(seat(Player::Alice, DEAD_ENDPOINT, &weak))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("too small"));

        let (status, _) = send(&app, "POST", &join_uri, Some(seat(Player::Alice, "file:///etc", &alice))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut truncated = seat(Player::Alice, DEAD_ENDPOINT, &alice);
        truncated["snapshot"]["cells"] = json!([]);
        let (status, _) = send(&app, "POST", &join_uri, Some(truncated)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(&app, "POST", &join_uri, Some(seat(Player::Alice, DEAD_ENDPOINT, &alice))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["player"], "Alice");
        assert!(body["started"].is_null());

        let (status, body) = send(&app, "POST", &join_uri, Some(seat(Player::Alice, DEAD_ENDPOINT, &alice))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Alice"));

        let (status, body) = send(&app, "GET", &format!("/api/match/{}/transcript", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcript"]["concluded"], false);
        assert_eq!(body["endpoints"]["Alice"], DEAD_ENDPOINT);
        assert_eq!(
            body["transcript"]["commitments"]["Alice"],
            json!(alice.commitment())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_attack_needs_player_service() {
        let mut rng = StdRng::seed_from_u64(82);
        let app = test_app();
        let id = create(&app).await;
        let join_uri = format!("/api/match/{}/join", id);

        let alice = patrol_boat(&mut rng, [(0, 0), (0, 1)]);
        let bob = patrol_boat(&mut rng, [(7, 9), (8, 9)]);
        send(&app, "POST", &join_uri, Some(seat(Player::Alice, DEAD_ENDPOINT, &alice))).await;
        let (status, body) = send(&app, "POST", &join_uri, Some(seat(Player::Bob, DEAD_ENDPOINT, &bob))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["started"]["first_turn"], "Alice");

        // The relay cannot decide a hit on its own
        let (status, body) = fire(&app, &id, "Alice", 7, 9).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("unavailable"));

        let (_, body) = send(&app, "GET", &format!("/api/match/{}/history", id), None).await;
        assert!(body["history"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "GET", &format!("/api/match/{}/status", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Out-of-turn attacks are rejected before any defender is asked
        let (status, body) = fire(&app, &id, "Bob", 0, 0).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let app = test_app();
        let id = create(&app).await;

        let (status, body) = fire(&app, &id, "Carol", 0, 0).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Carol"));

        let unknown = MatchId::new().to_string();
        let (status, _) = fire(&app, &unknown, "Alice", 0, 0).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/match/not-a-uuid/status", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{}", addr)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_match_between_player_services() {
        let mut rng = StdRng::seed_from_u64(83);
        let relay_url = serve(test_app()).await;
        let relay = RelayClient::new(relay_url.clone());
        let match_id = relay.create_match().await.unwrap();

        let mut players = Vec::new();
        for (player, cells) in [
            (Player::Alice, [(0, 0), (0, 1)]),
            (Player::Bob, [(7, 9), (8, 9)]),
        ] {
            let state = PlayerState::new(
                player,
                match_id,
                patrol_boat(&mut rng, cells),
                RelayClient::new(relay_url.clone()),
            );
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let request = state.seat_request(url.clone());
            let router = seabattle_player::app(state);
            tokio::spawn(async move { axum::serve(listener, router).await });
            players.push((request, url));
        }

        assert!(relay.join(match_id, &players[0].0).await.unwrap().is_none());
        let started = relay.join(match_id, &players[1].0).await.unwrap().unwrap();
        assert_eq!(started.first_turn, Player::Alice);

        let http = reqwest::Client::new();
        let (alice, bob) = (players[0].1.as_str(), players[1].1.as_str());
        let shoot = |url: &str, x: i32, y: i32| {
            http.post(format!("{}/api/fire", url))
                .json(&json!({ "x": x, "y": y }))
                .send()
        };

        let hit: Value = shoot(alice, 7, 9).await.unwrap().json().await.unwrap();
        assert_eq!(hit["is_hit"], true);

        // Boards stay closed while the match runs
        let early = http.get(format!("{}/api/reveal", bob)).send().await.unwrap();
        assert_eq!(early.status(), reqwest::StatusCode::CONFLICT);

        let miss: Value = shoot(bob, 3, 3).await.unwrap().json().await.unwrap();
        assert_eq!(miss["is_hit"], false);

        let last: Value = shoot(alice, 8, 9).await.unwrap().json().await.unwrap();
        assert_eq!(last["ship_sunk"], "Patrol Boat");
        assert_eq!(last["game_over"], true);
        assert_eq!(last["winner"], "Alice");

        let status: Value = http
            .get(format!("{}/api/match/{}/status", relay_url, match_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["game_over"], true);

        for (url, opponent) in [(alice, "Bob"), (bob, "Alice")] {
            let report: Value = http
                .get(format!("{}/api/audit", url))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(report["player"], opponent);
            assert_eq!(report["verified"], true);
        }
    }
}
