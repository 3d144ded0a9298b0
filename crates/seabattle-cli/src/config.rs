//! CLI configuration from environment variables.

use std::str::FromStr;

pub const DEFAULT_KEY_BITS: u64 = 1024;
/// Smallest modulus the CLI will generate keys for
pub const MIN_KEY_BITS: u64 = 256;
/// Past this, prime search takes minutes per key
pub const MAX_KEY_BITS: u64 = 4096;
/// Safety limit on the number of resolved attacks in one session
pub const DEFAULT_MAX_TURNS: u32 = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub key_bits: u64,
    pub max_turns: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
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
        Self {
            key_bits,
            max_turns: parse_or(&lookup, "SEABATTLE_MAX_TURNS", DEFAULT_MAX_TURNS),
        }
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
