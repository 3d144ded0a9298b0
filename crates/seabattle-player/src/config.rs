//! Player service configuration from environment variables.

use seabattle_core::{GameError, MatchId, Player};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_KEY_BITS: u64 = 1024;
pub const MIN_KEY_BITS: u64 = 256;
/// Past this, prime search takes minutes per key
pub const MAX_KEY_BITS: u64 = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SEABATTLE_PLAYER: {0}")]
    Player(#[from] GameError),

    #[error("SEABATTLE_MATCH_ID {0:?} is not a match id")]
    MatchId(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub player: Player,
    pub port: u16,
    pub relay_url: String,
    /// Join this match, or create one when unset
    pub match_id: Option<MatchId>,
    /// Where the relay reaches this service
    pub public_url: String,
    pub key_bits: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let player = match lookup("SEABATTLE_PLAYER") {
            Some(raw) => raw.parse()?,
            None => Player::Alice,
        };
        let match_id = match lookup("SEABATTLE_MATCH_ID") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::MatchId(raw))?),
            None => None,
        };
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);

        let requested = parse_or(&lookup, "SEABATTLE_KEY_BITS", DEFAULT_KEY_BITS);
        let key_bits = requested.clamp(MIN_KEY_BITS, MAX_KEY_BITS);
        if key_bits != requested {
            tracing::warn!(
                "SEABATTLE_KEY_BITS={} is outside {}-{}, using {}",
                requested,
                MIN_KEY_BITS,
                MAX_KEY_BITS,
                key_bits
            );
        }

        Ok(Self {
            player,
            port,
            relay_url: lookup("SEABATTLE_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.into()),
            match_id,
            public_url: lookup("SEABATTLE_PUBLIC_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            key_bits,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
