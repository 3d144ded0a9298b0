//! Seabattle hot-seat client
//!
//! Two players share one terminal. Each board is sealed under its owner's
//! key before play starts; the arbiter resolves every shot blind.

mod config;
mod input;
mod session;

use config::Config;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{Session, SessionError};
use std::io;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::from_env();
    let mut rng = StdRng::from_entropy();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), stdout.lock(), &config);

    match session.play(&mut rng) {
        Ok(summary) => {
            tracing::info!(
                "Session finished: winner {:?}, {} attacks, hits {:?}",
                summary.winner,
                summary.attacks,
                summary.hits
            );
        }
        Err(SessionError::InputClosed) => {
            println!("\n\nGame interrupted by user.");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
