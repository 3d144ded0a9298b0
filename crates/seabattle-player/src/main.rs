//! Seabattle Player Service
//!
//! Generates this player's keys and fleet, takes a seat at the relay and
//! serves the defender API the relay calls during the match.

use rand::rngs::StdRng;
use rand::SeedableRng;
use seabattle_core::{Board, KeyPair, LocalDefender};
use seabattle_player::config::Config;
use seabattle_player::{app, PlayerState, RelayClient};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let relay = RelayClient::new(config.relay_url.clone());

    let match_id = match config.match_id {
        Some(id) => id,
        None => {
            let id = relay.create_match().await.expect("Failed to create match");
            info!("Created match {}, share it with your opponent", id);
            id
        }
    };

    info!(
        "Generating {}-bit keypair and fleet for {}",
        config.key_bits, config.player
    );
    let key_bits = config.key_bits;
    let defender = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        let board = Board::random(&mut rng)?;
        let keys = KeyPair::generate(key_bits, &mut rng);
        Ok::<_, seabattle_core::BoardError>(LocalDefender::new(board, keys, &mut rng))
    })
    .await
    .expect("Setup task panicked")
    .expect("Failed to place fleet");
    info!("Your fleet:\n{}", defender.board().render_plain());

    let state = PlayerState::new(config.player, match_id, defender, relay.clone());
    let seat = state.seat_request(config.public_url.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.unwrap();
    info!("{}'s defender listening on http://{}", config.player, addr);
    let server = tokio::spawn(async move { axum::serve(listener, app(state)).await });

    match relay.join(match_id, &seat).await {
        Ok(Some(started)) => info!(
            "Match {} started, {} moves first",
            started.match_id, started.first_turn
        ),
        Ok(None) => info!("Seated in match {}, waiting for the opponent", match_id),
        Err(e) => {
            error!("Could not join match {}: {}", match_id, e);
            std::process::exit(1);
        }
    }

    server.await.unwrap().unwrap();
}
